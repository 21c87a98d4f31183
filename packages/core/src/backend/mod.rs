//! Backend Layer
//!
//! This module abstracts the links REST surface behind the [`LinkBackend`]
//! trait so business logic never touches HTTP directly:
//!
//! - `LinkBackend` - async trait covering the full `/links/api/*` surface
//! - `HttpBackend` - reqwest implementation against a base URL
//! - `BackendError` - transport and domain failures collapsed into one path
//!
//! The trait is the seam used by tests: a scripted mock implementation stands
//! in for the network.

mod api;
mod error;
mod http;

pub use api::{BulkResult, CreateResult, LinkBackend, ResolvedTypes};
pub use error::BackendError;
pub use http::HttpBackend;
