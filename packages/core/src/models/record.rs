//! Record References and Summaries
//!
//! Records (notes, tasks, people, ...) are opaque to the link engine. A
//! [`RecordRef`] identifies one; a [`Summary`] is its display projection,
//! resolved on demand through the summary cache.

use serde::{Deserialize, Serialize};

/// Reference to a record of any kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordRef {
    #[serde(rename = "type")]
    pub record_type: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
}

impl RecordRef {
    pub fn new(record_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            record_type: record_type.into(),
            id: id.into(),
            title: None,
            subtitle: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Composite cache key for this reference.
    pub fn cache_key(&self) -> String {
        format!("{}:{}", self.record_type, self.id)
    }

    /// Last-resort display text when no summary could be resolved.
    pub fn fallback_title(&self) -> String {
        format!("{} {}", self.record_type, self.id)
    }
}

/// Display projection of a record reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub open_url: Option<String>,
}

impl Summary {
    /// Best display text: title, then subtitle, then the given fallback.
    pub fn display_title(&self, fallback: &str) -> String {
        self.title
            .clone()
            .or_else(|| self.subtitle.clone())
            .unwrap_or_else(|| fallback.to_string())
    }

    /// Icon text, falling back to the capitalized first letter of the type.
    pub fn display_icon(&self, record_type: &str) -> String {
        if let Some(icon) = &self.icon {
            if !icon.is_empty() {
                return icon.clone();
            }
        }
        record_type
            .chars()
            .next()
            .map(|c| c.to_uppercase().to_string())
            .unwrap_or_default()
    }
}
