//! LinkDeck Core Link Engine
//!
//! This crate provides the client-side link engine for the LinkDeck personal
//! information manager: the links drawer, its caches, and every link
//! mutation flow.
//!
//! # Architecture
//!
//! - **Backend seam**: all network access goes through the [`backend::LinkBackend`]
//!   trait; `HttpBackend` is the reqwest implementation
//! - **Session caches**: summary and type-resolution lookups are memoized with
//!   in-flight request de-duplication, so each key costs one call per session
//! - **Last-issued wins**: list loads, picker searches and mention lookups are
//!   generation-guarded; stale completions are discarded
//! - **Optimistic mutations**: deletes remove rows before the call and undo by
//!   re-creating an equivalent edge; type changes revert by re-rendering
//!
//! # Modules
//!
//! - [`models`] - Data structures (Link, LinkType, RecordRef, wire payloads)
//! - [`backend`] - REST surface behind the `LinkBackend` trait
//! - [`services`] - Drawer, picker, mentions, reorder, caches, notifications
//! - [`config`] - Client-local settings (drawer width, default direction)

pub mod backend;
pub mod config;
pub mod models;
pub mod services;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use backend::*;
pub use models::*;
pub use services::*;
