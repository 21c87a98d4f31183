//! Backend Error Types
//!
//! Transport failures (request rejected, malformed response) and domain
//! failures (an explicit `error` in a well-formed non-2xx body) share one
//! failure path: callers surface a short human-readable notification and
//! otherwise leave local state alone. There is no retry policy anywhere.

use thiserror::Error;

/// Errors from the links REST surface.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Request never produced a usable response
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Backend answered with a non-2xx status and (possibly) an error body
    #[error("Backend error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl BackendError {
    /// Create an API error from a status and message
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create an invalid response error
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}
