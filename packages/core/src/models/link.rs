//! Link Data Structures
//!
//! This module defines the `Link` edge, the fixed `LinkType` vocabulary, and
//! the wire payloads used to create and patch links.
//!
//! # Link type vocabulary
//!
//! The vocabulary is a fixed, ordered enumeration. The enum's declaration
//! order is the canonical display order for type groups in the drawer.
//! Types the backend returns that are *not* in the vocabulary are still
//! carried through as [`LinkTypeKey::Unknown`] so they group and render
//! rather than being dropped.

use crate::models::record::Summary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sort order assigned to newly created links before any reorder.
pub const DEFAULT_SORT_ORDER: i64 = 100;

/// Fixed, ordered vocabulary of link types.
///
/// Declaration order defines the display order of type groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    Related,
    Mentions,
    Attachment,
    About,
    AssignedTo,
    DependsOn,
    Emails,
    Calls,
    LocatedAt,
}

impl LinkType {
    /// All link types in canonical display order.
    pub const ALL: [LinkType; 9] = [
        LinkType::Related,
        LinkType::Mentions,
        LinkType::Attachment,
        LinkType::About,
        LinkType::AssignedTo,
        LinkType::DependsOn,
        LinkType::Emails,
        LinkType::Calls,
        LinkType::LocatedAt,
    ];

    /// Wire identifier (snake_case) for this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkType::Related => "related",
            LinkType::Mentions => "mentions",
            LinkType::Attachment => "attachment",
            LinkType::About => "about",
            LinkType::AssignedTo => "assigned_to",
            LinkType::DependsOn => "depends_on",
            LinkType::Emails => "emails",
            LinkType::Calls => "calls",
            LinkType::LocatedAt => "located_at",
        }
    }

    /// Human-readable label for UI surfaces.
    pub fn label(&self) -> &'static str {
        match self {
            LinkType::Related => "Related",
            LinkType::Mentions => "Mentions",
            LinkType::Attachment => "Attachments",
            LinkType::About => "About",
            LinkType::AssignedTo => "Assigned to",
            LinkType::DependsOn => "Depends on",
            LinkType::Emails => "Emails",
            LinkType::Calls => "Calls",
            LinkType::LocatedAt => "Located at",
        }
    }

    /// Parse a wire identifier. Returns `None` for unknown types.
    pub fn parse(value: &str) -> Option<LinkType> {
        LinkType::ALL.iter().copied().find(|t| t.as_str() == value)
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grouping key for a link type: a known vocabulary entry or a raw string
/// the vocabulary does not cover.
///
/// Unknown types are never hidden; they form extra groups appended after the
/// known vocabulary in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LinkTypeKey {
    Known(LinkType),
    Unknown(String),
}

impl LinkTypeKey {
    /// Interpret a raw wire type string. Empty strings fall back to `related`,
    /// matching how the drawer has always treated absent types.
    pub fn from_wire(value: &str) -> LinkTypeKey {
        if value.is_empty() {
            return LinkTypeKey::Known(LinkType::Related);
        }
        match LinkType::parse(value) {
            Some(t) => LinkTypeKey::Known(t),
            None => LinkTypeKey::Unknown(value.to_string()),
        }
    }

    /// Wire identifier for this key.
    pub fn as_str(&self) -> &str {
        match self {
            LinkTypeKey::Known(t) => t.as_str(),
            LinkTypeKey::Unknown(s) => s.as_str(),
        }
    }

    /// Display label: vocabulary label for known types, the raw identifier
    /// for unknown ones.
    pub fn label(&self) -> &str {
        match self {
            LinkTypeKey::Known(t) => t.label(),
            LinkTypeKey::Unknown(s) => s.as_str(),
        }
    }
}

/// Directed, typed edge between two records.
///
/// `sort_order` defines the position within the link's type group for one
/// record+direction; after any reorder the values within a group are distinct
/// multiples of 10 in display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    /// Opaque identifier, stable once created
    pub link_id: i64,

    pub src_type: String,
    pub src_id: String,
    pub dst_type: String,
    pub dst_id: String,

    /// Raw wire type; interpret through [`Link::type_key`]
    pub link_type: String,

    /// Optional free-text label
    #[serde(default)]
    pub label: Option<String>,

    /// Position within the type group (ascending = display order)
    #[serde(default = "default_sort_order")]
    pub sort_order: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_utc: Option<DateTime<Utc>>,

    #[serde(default)]
    pub created_by: Option<String>,

    /// Provenance of how the link was made
    #[serde(default)]
    pub context_type: Option<String>,
    #[serde(default)]
    pub context_id: Option<String>,

    /// Far-end summary the list endpoints may attach inline, saving one
    /// summary lookup per row
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_summary: Option<Summary>,
}

fn default_sort_order() -> i64 {
    DEFAULT_SORT_ORDER
}

impl Link {
    /// Grouping key for this link's type.
    pub fn type_key(&self) -> LinkTypeKey {
        LinkTypeKey::from_wire(&self.link_type)
    }
}

/// Full tuple plus provenance sent to the create and bulk-create endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateLinkPayload {
    pub src_type: String,
    pub src_id: String,
    pub dst_type: String,
    pub dst_id: String,
    pub link_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub created_by: String,
    pub context_type: String,
    pub context_id: String,
}

impl CreateLinkPayload {
    /// Payload equivalent to an existing link, used by delete-undo to
    /// re-create the edge (the id is never resurrected).
    pub fn equivalent_to(link: &Link) -> Self {
        Self {
            src_type: link.src_type.clone(),
            src_id: link.src_id.clone(),
            dst_type: link.dst_type.clone(),
            dst_id: link.dst_id.clone(),
            link_type: link.link_type.clone(),
            label: link.label.clone(),
            created_by: link.created_by.clone().unwrap_or_else(|| "ui".to_string()),
            context_type: link.context_type.clone().unwrap_or_default(),
            context_id: link.context_id.clone().unwrap_or_default(),
        }
    }
}

/// Partial update for a link. Only the populated field is serialized, so a
/// PATCH body carries exactly the changed property.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
}

impl LinkPatch {
    pub fn link_type(value: impl Into<String>) -> Self {
        Self {
            link_type: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn label(value: impl Into<String>) -> Self {
        Self {
            label: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn sort_order(value: i64) -> Self {
        Self {
            sort_order: Some(value),
            ..Default::default()
        }
    }
}
