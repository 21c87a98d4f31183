//! LinkBackend Trait - REST Surface Abstraction
//!
//! This module defines the `LinkBackend` trait that abstracts the links REST
//! surface consumed by the engine. The trait enables the HTTP implementation
//! and scripted test doubles to be swapped without changing business logic.
//!
//! # Design Decisions
//!
//! 1. **Async-First**: every method awaits a network round trip
//! 2. **Typed errors**: all methods return `BackendError`, which collapses
//!    transport and domain failures into the single failure path the engine
//!    promises its callers
//! 3. **No retries**: a failed call is terminal for that attempt

use crate::backend::error::BackendError;
use crate::models::{CreateLinkPayload, Link, LinkPatch, RecordRef, Summary};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Outcome of a create call.
///
/// `duplicate` is a distinguished *success*: the tuple already existed, no
/// second edge was created, and the existing id (when known) is returned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateResult {
    #[serde(default)]
    pub created: bool,
    #[serde(default)]
    pub duplicate: bool,
    #[serde(default)]
    pub link_id: Option<i64>,
    /// Per-item rejection reason in bulk responses (e.g. invalid type)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Per-item outcomes of a bulk-create call, in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkResult {
    #[serde(default)]
    pub results: Vec<CreateResult>,
}

impl BulkResult {
    /// Number of items reported as duplicates.
    pub fn duplicates(&self) -> usize {
        self.results.iter().filter(|r| r.duplicate).count()
    }

    /// Number of items actually created.
    pub fn created(&self) -> usize {
        self.results.iter().filter(|r| r.created).count()
    }
}

/// Valid link types for one ordered `(src_type, dst_type)` pair in a context,
/// plus the backend's suggested default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTypes {
    #[serde(default)]
    pub allowed_types: Vec<String>,
    #[serde(default)]
    pub default_type: Option<String>,
}

/// Abstraction over the links REST surface.
///
/// Implementations must be `Send + Sync`; the engine shares one instance
/// behind an `Arc` across the drawer, picker, caches and mention engine.
#[async_trait]
pub trait LinkBackend: Send + Sync {
    /// Links whose source is the given record.
    async fn list_outgoing(&self, src: &RecordRef) -> Result<Vec<Link>, BackendError>;

    /// Links whose destination is the given record.
    async fn list_incoming(&self, dst: &RecordRef) -> Result<Vec<Link>, BackendError>;

    /// Display projection for a record reference.
    async fn get_summary(&self, record: &RecordRef) -> Result<Summary, BackendError>;

    /// Allowed link types and defaults for each destination type, from one
    /// source type in one context.
    async fn resolve_types(
        &self,
        context_type: &str,
        src_type: &str,
        dst_types: &[String],
    ) -> Result<HashMap<String, ResolvedTypes>, BackendError>;

    /// Create one link. A pre-existing equivalent edge reports
    /// `duplicate: true` without creating a second edge.
    async fn create_link(&self, payload: &CreateLinkPayload) -> Result<CreateResult, BackendError>;

    /// Create many links in one call; per-item results in input order.
    async fn bulk_create(&self, items: &[CreateLinkPayload]) -> Result<BulkResult, BackendError>;

    /// Patch a link's type, label, or sort order.
    async fn update_link(&self, link_id: i64, patch: &LinkPatch) -> Result<(), BackendError>;

    /// Delete a link by id.
    async fn delete_link(&self, link_id: i64) -> Result<(), BackendError>;

    /// Full-text record search.
    async fn search_records(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<RecordRef>, BackendError>;
}
