//! Link Collection Store
//!
//! Holds the loaded link set for one record+direction and partitions it into
//! type groups for rendering. Grouping uses the fixed vocabulary order;
//! unknown types are appended as extra groups in first-seen order rather
//! than dropped. Every vocabulary group is always present, empty or not.

use crate::models::{Link, LinkType, LinkTypeKey, RecordRef};
use serde::{Deserialize, Serialize};

/// Which direction of links the drawer shows: whether the fixed record is
/// the edge's source (outgoing) or destination (incoming).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Outgoing,
    Incoming,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Outgoing => "outgoing",
            Direction::Incoming => "incoming",
        }
    }

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Outgoing => Direction::Incoming,
            Direction::Incoming => Direction::Outgoing,
        }
    }

    pub fn parse(value: &str) -> Option<Direction> {
        match value {
            "outgoing" => Some(Direction::Outgoing),
            "incoming" => Some(Direction::Incoming),
            _ => None,
        }
    }
}

/// One type group of links, in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkGroup {
    pub key: LinkTypeKey,
    pub links: Vec<Link>,
}

impl LinkGroup {
    pub fn count(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

/// The currently loaded link set for one record+direction.
#[derive(Debug, Clone)]
pub struct LinkCollection {
    record: RecordRef,
    direction: Direction,
    links: Vec<Link>,
}

impl LinkCollection {
    pub fn new(record: RecordRef, direction: Direction) -> Self {
        Self {
            record,
            direction,
            links: Vec::new(),
        }
    }

    pub fn record(&self) -> &RecordRef {
        &self.record
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Replace the loaded set (a fresh list read arrived).
    pub fn set_links(&mut self, links: Vec<Link>) {
        self.links = links;
    }

    pub fn find(&self, link_id: i64) -> Option<&Link> {
        self.links.iter().find(|l| l.link_id == link_id)
    }

    /// Remove a link locally (optimistic delete).
    pub fn remove(&mut self, link_id: i64) -> Option<Link> {
        let idx = self.links.iter().position(|l| l.link_id == link_id)?;
        Some(self.links.remove(idx))
    }

    /// Apply a committed sort order to a local link.
    pub fn set_sort_order(&mut self, link_id: i64, sort_order: i64) {
        if let Some(link) = self.links.iter_mut().find(|l| l.link_id == link_id) {
            link.sort_order = sort_order;
        }
    }

    /// Apply a committed type change to a local link.
    pub fn set_link_type(&mut self, link_id: i64, link_type: &str) {
        if let Some(link) = self.links.iter_mut().find(|l| l.link_id == link_id) {
            link.link_type = link_type.to_string();
        }
    }

    /// Apply a committed label change to a local link.
    pub fn set_label(&mut self, link_id: i64, label: &str) {
        if let Some(link) = self.links.iter_mut().find(|l| l.link_id == link_id) {
            link.label = Some(label.to_string());
        }
    }

    /// The far endpoint of a link relative to the fixed record.
    pub fn far_end(&self, link: &Link) -> RecordRef {
        far_end(link, self.direction)
    }

    /// Partition the loaded set into type groups.
    ///
    /// Vocabulary groups come first in canonical order (present even when
    /// empty); unknown types follow in first-seen order. Input order within
    /// each group is preserved, so the backend's sort_order ordering carries
    /// through.
    pub fn group_by_type(&self) -> Vec<LinkGroup> {
        let mut groups: Vec<LinkGroup> = LinkType::ALL
            .iter()
            .map(|t| LinkGroup {
                key: LinkTypeKey::Known(*t),
                links: Vec::new(),
            })
            .collect();

        for link in &self.links {
            let key = link.type_key();
            match groups.iter_mut().find(|g| g.key == key) {
                Some(group) => group.links.push(link.clone()),
                None => groups.push(LinkGroup {
                    key,
                    links: vec![link.clone()],
                }),
            }
        }
        groups
    }
}

/// The far endpoint of a link for a given drawer direction.
pub fn far_end(link: &Link, direction: Direction) -> RecordRef {
    match direction {
        Direction::Incoming => RecordRef::new(link.src_type.clone(), link.src_id.clone()),
        Direction::Outgoing => RecordRef::new(link.dst_type.clone(), link.dst_id.clone()),
    }
}
