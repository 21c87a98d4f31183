//! Service Layer Error Types
//!
//! High-level errors for the link engine's services. Backend failures are
//! wrapped, not retried; the remaining variants cover invalid session state
//! (confirming a closed picker, acting with no selection). None of these are
//! fatal — callers degrade to a notification and a safe re-render.

use crate::backend::BackendError;
use thiserror::Error;

/// Link engine service errors
#[derive(Error, Debug)]
pub enum LinkServiceError {
    /// Backend call failed (transport or domain)
    #[error("Backend call failed: {0}")]
    Backend(#[from] BackendError),

    /// Drawer operation while the drawer is closed
    #[error("Drawer is closed")]
    DrawerClosed,

    /// Picker operation without an open session
    #[error("No picker session is open")]
    PickerClosed,

    /// Confirm without a selected row
    #[error("No row is selected")]
    NoSelection,

    /// Single-mode confirm without a source record
    #[error("No source record selected")]
    MissingSource,

    /// Reorder drop outside the source group
    #[error("Reorder rejected: {context}")]
    ReorderRejected { context: String },
}

impl LinkServiceError {
    /// Create a reorder rejection error
    pub fn reorder_rejected(context: impl Into<String>) -> Self {
        Self::ReorderRejected {
            context: context.into(),
        }
    }
}
