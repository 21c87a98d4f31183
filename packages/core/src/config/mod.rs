//! Client-Local Settings
//!
//! Small named settings persisted across sessions (drawer width, default
//! drawer direction). The [`SettingsStore`] trait plays the role browser
//! local storage plays for a web client: string keys, string values,
//! best-effort writes that never fail the caller.

mod settings;

pub use settings::{FileSettings, MemorySettings, SettingsStore};
