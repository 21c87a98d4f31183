//! Link Row Renderer
//!
//! Turns the grouped link set into a view model of interactive rows. Rows
//! are built once with a placeholder and then independently hydrated: the
//! far-end summary and the allowed-type selector each arrive whenever their
//! lookup resolves, in no guaranteed order.
//!
//! Rows carry their full link entity and a generated row id; the view's
//! row index is the typed row-to-entity association (no domain data is
//! round-tripped through display attributes).

use crate::models::{Link, LinkTypeKey, RecordRef};
use crate::services::collection::{far_end, Direction, LinkCollection};
use crate::services::summary_cache::SummaryCache;
use crate::services::type_resolution::TypeResolutionCache;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Hydration state of a row's far-end title.
#[derive(Debug, Clone, PartialEq)]
pub enum TitleState {
    /// Row just built; summary lookup not resolved yet
    Placeholder,
    /// Summary resolved
    Ready {
        title: String,
        icon: String,
        open_url: Option<String>,
    },
    /// Summary lookup failed; showing "{type} {id}"
    Fallback { title: String, icon: String },
}

impl TitleState {
    /// Display text for the row regardless of state.
    pub fn text(&self) -> &str {
        match self {
            TitleState::Placeholder => "Loading...",
            TitleState::Ready { title, .. } => title,
            TitleState::Fallback { title, .. } => title,
        }
    }
}

/// Hydration state of a row's allowed-type selector.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeOptionsState {
    /// Selector disabled until the allowed set resolves
    Pending,
    /// Selector populated. `anomaly` marks a current type that is not in
    /// the allowed set: it is appended rather than hidden.
    Ready { options: Vec<String>, anomaly: bool },
}

/// One interactive, draggable link row.
#[derive(Debug, Clone)]
pub struct RowView {
    pub row_id: Uuid,
    pub link: Link,
    pub far_end: RecordRef,
    pub title: TitleState,
    pub type_options: TypeOptionsState,
    /// Editable label text (committed on blur, not per keystroke)
    pub label: String,
}

impl RowView {
    fn build(link: &Link, direction: Direction) -> Self {
        let far = far_end(link, direction);
        // List endpoints may attach the far-end summary inline; use it and
        // skip the lookup.
        let title = match &link.other_summary {
            Some(summary) => TitleState::Ready {
                title: summary.display_title(&far.fallback_title()),
                icon: summary.display_icon(&far.record_type),
                open_url: summary.open_url.clone(),
            },
            None => TitleState::Placeholder,
        };
        Self {
            row_id: Uuid::new_v4(),
            far_end: far,
            title,
            type_options: TypeOptionsState::Pending,
            label: link.label.clone().unwrap_or_default(),
            link: link.clone(),
        }
    }
}

/// One rendered type group: count, empty marker, ordered row ids.
#[derive(Debug, Clone)]
pub struct GroupView {
    pub key: LinkTypeKey,
    pub row_ids: Vec<Uuid>,
}

impl GroupView {
    pub fn count(&self) -> usize {
        self.row_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_ids.is_empty()
    }
}

/// The drawer's rendered link set.
#[derive(Debug, Clone, Default)]
pub struct DrawerView {
    pub groups: Vec<GroupView>,
    rows: HashMap<Uuid, RowView>,
}

impl DrawerView {
    pub fn row(&self, row_id: Uuid) -> Option<&RowView> {
        self.rows.get(&row_id)
    }

    pub fn row_mut(&mut self, row_id: Uuid) -> Option<&mut RowView> {
        self.rows.get_mut(&row_id)
    }

    pub fn row_for_link(&self, link_id: i64) -> Option<&RowView> {
        self.rows.values().find(|r| r.link.link_id == link_id)
    }

    /// Row ids in display order (group order, then in-group order).
    pub fn ordered_row_ids(&self) -> Vec<Uuid> {
        self.groups.iter().flat_map(|g| g.row_ids.clone()).collect()
    }

    /// Drop a row from the view (optimistic delete).
    pub fn remove_row(&mut self, row_id: Uuid) -> Option<RowView> {
        for group in &mut self.groups {
            group.row_ids.retain(|id| *id != row_id);
        }
        self.rows.remove(&row_id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Builds and hydrates row views through the two caches.
pub struct RowRenderer {
    summaries: Arc<SummaryCache>,
    resolution: Arc<TypeResolutionCache>,
    context_type: String,
}

impl RowRenderer {
    pub fn new(
        summaries: Arc<SummaryCache>,
        resolution: Arc<TypeResolutionCache>,
        context_type: impl Into<String>,
    ) -> Self {
        Self {
            summaries,
            resolution,
            context_type: context_type.into(),
        }
    }

    /// Build the full view for a loaded collection. Rows start as
    /// placeholders (or inline-hydrated when the list carried summaries).
    pub fn build_view(&self, collection: &LinkCollection) -> DrawerView {
        let mut rows = HashMap::new();
        let mut groups = Vec::new();
        for group in collection.group_by_type() {
            let mut row_ids = Vec::with_capacity(group.links.len());
            for link in &group.links {
                let row = RowView::build(link, collection.direction());
                row_ids.push(row.row_id);
                rows.insert(row.row_id, row);
            }
            groups.push(GroupView {
                key: group.key,
                row_ids,
            });
        }
        DrawerView { groups, rows }
    }

    /// Hydrate one row in place: far-end summary, then allowed-type options.
    /// The two lookups are independent; neither failure disturbs the other.
    pub async fn hydrate_row(&self, row: &mut RowView) {
        if row.title == TitleState::Placeholder {
            match self.summaries.get(&row.far_end).await {
                Ok(summary) => {
                    row.title = TitleState::Ready {
                        title: summary.display_title(&row.far_end.fallback_title()),
                        icon: summary.display_icon(&row.far_end.record_type),
                        open_url: summary.open_url.clone(),
                    };
                }
                Err(e) => {
                    tracing::debug!("summary hydration failed for {}: {}", row.far_end.cache_key(), e);
                    row.title = TitleState::Fallback {
                        title: row.far_end.fallback_title(),
                        icon: row
                            .far_end
                            .record_type
                            .chars()
                            .next()
                            .map(|c| c.to_uppercase().to_string())
                            .unwrap_or_default(),
                    };
                }
            }
        }

        if row.type_options == TypeOptionsState::Pending {
            match self
                .resolution
                .get(&self.context_type, &row.link.src_type, &row.link.dst_type)
                .await
            {
                Ok(resolved) => {
                    let mut options = resolved.allowed_types.clone();
                    let anomaly = !options.iter().any(|t| *t == row.link.link_type);
                    if anomaly {
                        // A stale or now-invalid type stays visible, marked.
                        options.push(row.link.link_type.clone());
                    }
                    row.type_options = TypeOptionsState::Ready { options, anomaly };
                }
                Err(e) => {
                    tracing::debug!(
                        "type options hydration failed for link {}: {}",
                        row.link.link_id,
                        e
                    );
                }
            }
        }
    }

    /// Hydrate every row of a view.
    pub async fn hydrate_view(&self, view: &mut DrawerView) {
        let ids = view.ordered_row_ids();
        for row_id in ids {
            if let Some(row) = view.rows.get_mut(&row_id) {
                self.hydrate_row(row).await;
            }
        }
    }
}
