//! Data Models
//!
//! This module contains the core data structures used throughout LinkDeck:
//!
//! - `Link` - Directed, typed edge between two records
//! - `LinkType` - Fixed ordered vocabulary of edge types
//! - `RecordRef` / `Summary` - Record references and their display projections
//! - `CreateLinkPayload` / `LinkPatch` - Wire shapes for link mutations
//!
//! Wire structs keep snake_case field names because the links REST surface
//! is snake_case end to end.

mod link;
mod record;

pub use link::{
    Link, LinkPatch, LinkType, LinkTypeKey, CreateLinkPayload, DEFAULT_SORT_ORDER,
};
pub use record::{RecordRef, Summary};

/// Provenance context tags describing how a link mutation originated.
///
/// These travel on `CreateLinkPayload::context_type` so the backend can
/// record where an edge came from.
pub mod contexts {
    /// Link created through the drawer's "add" picker
    pub const DRAWER_ADD: &str = "links_drawer_add";
    /// Link created by dropping records onto a drawer type-group header
    pub const DRAWER_DROP: &str = "links_drawer_drop";
    /// Link created through a bulk toolbar picker session
    pub const LIST_BULK: &str = "list_bulk_link";
    /// Link created through a plain picker session
    pub const PICKER: &str = "link_picker";
    /// Link created as a side effect of inserting an @mention
    pub const EDITOR_MENTION: &str = "editor_mention";
}
