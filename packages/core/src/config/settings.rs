//! Settings Store Implementations
//!
//! `MemorySettings` backs tests and ephemeral sessions; `FileSettings`
//! persists a flat JSON object to disk. Writes are best-effort: a failed
//! persist logs a warning and the in-memory value still wins for the rest
//! of the session.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// Named client-local settings.
pub trait SettingsStore: Send + Sync {
    /// Read a setting, if present.
    fn get(&self, name: &str) -> Option<String>;

    /// Write a setting. Best-effort: implementations never fail the caller.
    fn set(&self, name: &str, value: &str);
}

/// In-memory settings, discarded at end of session.
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, name: &str) -> Option<String> {
        self.values.lock().expect("settings lock").get(name).cloned()
    }

    fn set(&self, name: &str, value: &str) {
        self.values
            .lock()
            .expect("settings lock")
            .insert(name.to_string(), value.to_string());
    }
}

/// Settings persisted as a flat JSON object on disk.
#[derive(Debug)]
pub struct FileSettings {
    path: PathBuf,
    values: Mutex<HashMap<String, String>>,
}

impl FileSettings {
    /// Load settings from `path`, starting empty if the file is missing or
    /// unreadable.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = std::fs::read_to_string(&path)
            .ok()
            .and_then(|raw| serde_json::from_str::<HashMap<String, String>>(&raw).ok())
            .unwrap_or_default();
        Self {
            path,
            values: Mutex::new(values),
        }
    }

    fn persist(&self, values: &HashMap<String, String>) {
        let serialized = match serde_json::to_string_pretty(values) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("Failed to serialize settings: {}", e);
                return;
            }
        };
        if let Err(e) = std::fs::write(&self.path, serialized) {
            tracing::warn!("Failed to persist settings to {:?}: {}", self.path, e);
        }
    }
}

impl SettingsStore for FileSettings {
    fn get(&self, name: &str) -> Option<String> {
        self.values.lock().expect("settings lock").get(name).cloned()
    }

    fn set(&self, name: &str, value: &str) {
        let mut values = self.values.lock().expect("settings lock");
        values.insert(name.to_string(), value.to_string());
        self.persist(&values);
    }
}
