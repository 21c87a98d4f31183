//! Link Picker
//!
//! Modal search-and-pick session for creating links. Two modes share the
//! surface: single (one source record, picked from the drawer's add button)
//! and bulk (many list records linked to one picked target in a single
//! batch call).
//!
//! Typing is debounced; every query bump invalidates older in-flight
//! searches by generation, so only the last-issued search may populate
//! results. Results are grouped by record type and each row carries its own
//! allowed-type selector, prefilled with the resolver's suggested default
//! for the pair.

use crate::models::{contexts, CreateLinkPayload, LinkTypeKey, RecordRef};
use crate::services::error::LinkServiceError;
use crate::services::mutation::LinkMutator;
use crate::services::notify::Toast;
use crate::services::type_resolution::TypeResolutionCache;
use std::sync::Arc;
use std::time::Duration;

/// Quiet period after the last keystroke before a search fires.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(200);

/// Maximum results requested per search.
pub const SEARCH_LIMIT: usize = 30;

/// Fallback link type when the resolver suggests no default.
const FALLBACK_TYPE: &str = "related";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerMode {
    /// One source record; confirm creates one link
    Single,
    /// Many source records; confirm creates one link per source
    Bulk,
}

/// One search result row with its per-row type selector.
#[derive(Debug, Clone)]
pub struct PickerRow {
    pub record: RecordRef,
    pub selected_type: String,
    pub allowed_types: Vec<String>,
}

/// One record-type section of the result list; rows stay contiguous under
/// their group label.
#[derive(Debug, Clone)]
pub struct PickerGroup {
    pub record_type: String,
    pub rows: Vec<PickerRow>,
}

/// An open picker session.
pub struct PickerSession {
    mode: PickerMode,
    source: Option<RecordRef>,
    sources: Vec<RecordRef>,
    context_type: String,
    context_id: String,
    query: String,
    generation: u64,
    groups: Vec<PickerGroup>,
    cursor: usize,
}

impl PickerSession {
    pub fn mode(&self) -> PickerMode {
        self.mode
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn groups(&self) -> &[PickerGroup] {
        &self.groups
    }

    pub fn row_count(&self) -> usize {
        self.groups.iter().map(|g| g.rows.len()).sum()
    }

    /// Row by flat index across all groups, in display order.
    pub fn row(&self, index: usize) -> Option<&PickerRow> {
        let mut remaining = index;
        for group in &self.groups {
            if remaining < group.rows.len() {
                return Some(&group.rows[remaining]);
            }
            remaining -= group.rows.len();
        }
        None
    }

    fn row_mut(&mut self, index: usize) -> Option<&mut PickerRow> {
        let mut remaining = index;
        for group in &mut self.groups {
            if remaining < group.rows.len() {
                return Some(&mut group.rows[remaining]);
            }
            remaining -= group.rows.len();
        }
        None
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selected(&self) -> Option<&PickerRow> {
        self.row(self.cursor)
    }
}

/// The picker: at most one session open at a time.
pub struct LinkPicker {
    mutator: LinkMutator,
    resolution: Arc<TypeResolutionCache>,
    session: Option<PickerSession>,
}

impl LinkPicker {
    pub fn new(mutator: LinkMutator, resolution: Arc<TypeResolutionCache>) -> Self {
        Self {
            mutator,
            resolution,
            session: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&PickerSession> {
        self.session.as_ref()
    }

    /// Open in single mode for one source record.
    pub fn open_single(
        &mut self,
        source: RecordRef,
        context_type: impl Into<String>,
        context_id: impl Into<String>,
    ) {
        self.session = Some(PickerSession {
            mode: PickerMode::Single,
            source: Some(source),
            sources: Vec::new(),
            context_type: context_type.into(),
            context_id: context_id.into(),
            query: String::new(),
            generation: 0,
            groups: Vec::new(),
            cursor: 0,
        });
    }

    /// Open in bulk mode for a set of selected list records.
    pub fn open_bulk(&mut self, sources: Vec<RecordRef>) {
        let context_id = sources.first().map(|r| r.id.clone()).unwrap_or_default();
        self.session = Some(PickerSession {
            mode: PickerMode::Bulk,
            source: None,
            sources,
            context_type: contexts::LIST_BULK.to_string(),
            context_id,
            query: String::new(),
            generation: 0,
            groups: Vec::new(),
            cursor: 0,
        });
    }

    /// Escape: close without committing anything.
    pub fn close(&mut self) {
        self.session = None;
    }

    /// Record a keystroke's query text. Returns the generation the caller
    /// passes to `run_search` after the debounce interval; an older
    /// generation means further typing happened and the search is stale.
    pub fn note_query(&mut self, query: impl Into<String>) -> Result<u64, LinkServiceError> {
        let session = self.session.as_mut().ok_or(LinkServiceError::PickerClosed)?;
        session.query = query.into();
        session.generation += 1;
        Ok(session.generation)
    }

    /// Run the search for a noted generation. Returns false when the
    /// generation is stale and nothing was touched.
    pub async fn run_search(&mut self, generation: u64) -> Result<bool, LinkServiceError> {
        let (query, src_type, context_type) = {
            let session = self.session.as_ref().ok_or(LinkServiceError::PickerClosed)?;
            if generation != session.generation {
                return Ok(false);
            }
            (
                session.query.clone(),
                self.resolution_src_type(session),
                session.context_type.clone(),
            )
        };

        if query.trim().is_empty() {
            if let Some(session) = self.session.as_mut() {
                session.groups.clear();
                session.cursor = 0;
            }
            return Ok(true);
        }

        let records = match self
            .mutator
            .backend()
            .search_records(query.trim(), SEARCH_LIMIT)
            .await
        {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("picker search failed: {}", e);
                Vec::new()
            }
        };

        // Group by record type, first-seen order, rows contiguous.
        let mut groups: Vec<PickerGroup> = Vec::new();
        for record in records {
            match groups.iter_mut().find(|g| g.record_type == record.record_type) {
                Some(group) => group.rows.push(PickerRow {
                    record,
                    selected_type: FALLBACK_TYPE.to_string(),
                    allowed_types: Vec::new(),
                }),
                None => groups.push(PickerGroup {
                    record_type: record.record_type.clone(),
                    rows: vec![PickerRow {
                        record,
                        selected_type: FALLBACK_TYPE.to_string(),
                        allowed_types: Vec::new(),
                    }],
                }),
            }
        }

        // One batched resolution call covers every result type; each row's
        // selector starts on the resolver's default for its pair.
        let dst_types: Vec<String> = groups.iter().map(|g| g.record_type.clone()).collect();
        if !dst_types.is_empty() {
            match self
                .resolution
                .resolve_many(&context_type, &src_type, &dst_types)
                .await
            {
                Ok(resolved) => {
                    for group in &mut groups {
                        if let Some(entry) = resolved.get(&group.record_type) {
                            let default = entry
                                .default_type
                                .clone()
                                .unwrap_or_else(|| FALLBACK_TYPE.to_string());
                            for row in &mut group.rows {
                                row.allowed_types = entry.allowed_types.clone();
                                row.selected_type = default.clone();
                            }
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("picker type resolution failed: {}", e);
                }
            }
        }

        let session = self.session.as_mut().ok_or(LinkServiceError::PickerClosed)?;
        if generation != session.generation {
            // Typing continued while the search was in flight.
            return Ok(false);
        }
        session.groups = groups;
        session.cursor = 0;
        Ok(true)
    }

    /// Move the cursor across all rows, clamped to the list.
    pub fn move_selection(&mut self, delta: i32) -> Result<usize, LinkServiceError> {
        let session = self.session.as_mut().ok_or(LinkServiceError::PickerClosed)?;
        let count = session.row_count();
        if count == 0 {
            session.cursor = 0;
            return Ok(0);
        }
        let next = session.cursor as i64 + delta as i64;
        session.cursor = next.clamp(0, count as i64 - 1) as usize;
        Ok(session.cursor)
    }

    /// Change a result row's selected type.
    pub fn set_row_type(&mut self, index: usize, link_type: &str) -> Result<(), LinkServiceError> {
        let session = self.session.as_mut().ok_or(LinkServiceError::PickerClosed)?;
        let row = session.row_mut(index).ok_or(LinkServiceError::NoSelection)?;
        row.selected_type = link_type.to_string();
        Ok(())
    }

    /// Confirm the session. Single mode creates one link from the source to
    /// the cursor row and emits a rich toast (Undo plus an inline type
    /// selector); bulk mode creates one link per source in a single batch.
    /// The session closes on every outcome.
    pub async fn confirm(&mut self) -> Result<(), LinkServiceError> {
        let session = self.session.take().ok_or(LinkServiceError::PickerClosed)?;
        match session.mode {
            PickerMode::Single => self.confirm_single(session).await,
            PickerMode::Bulk => self.confirm_bulk(session).await,
        }
    }

    async fn confirm_single(&self, session: PickerSession) -> Result<(), LinkServiceError> {
        let source = session.source.clone().ok_or(LinkServiceError::MissingSource)?;
        let row = session.selected().cloned().ok_or(LinkServiceError::NoSelection)?;
        let payload = CreateLinkPayload {
            src_type: source.record_type.clone(),
            src_id: source.id.clone(),
            dst_type: row.record.record_type.clone(),
            dst_id: row.record.id.clone(),
            link_type: row.selected_type.clone(),
            label: None,
            created_by: "ui".to_string(),
            context_type: session.context_type.clone(),
            context_id: session.context_id.clone(),
        };

        let type_label = LinkTypeKey::from_wire(&row.selected_type).label().to_string();
        let notifier = self.mutator.notifier();
        match self.mutator.create_silent(&payload).await {
            Ok(result) if result.duplicate => {
                notifier.info(format!("Already linked ({type_label})."));
                Ok(())
            }
            Ok(result) => {
                let display = row
                    .record
                    .title
                    .clone()
                    .unwrap_or_else(|| row.record.fallback_title());
                let mut toast = Toast::info(format!("Linked {display} ({type_label})."));
                if let Some(link_id) = result.link_id {
                    let backend = self.mutator.backend().clone();
                    let reload = self.mutator.reload_handle().clone();
                    toast = toast.with_undo(Arc::new(move || {
                        let backend = backend.clone();
                        let reload = reload.clone();
                        Box::pin(async move {
                            if let Err(e) = backend.delete_link(link_id).await {
                                tracing::warn!("undo delete failed for {}: {}", link_id, e);
                            }
                            reload.request();
                        })
                    }));
                    if !row.allowed_types.is_empty() {
                        let mutator = self.mutator.clone();
                        toast = toast.with_type_control(
                            row.allowed_types.clone(),
                            row.selected_type.clone(),
                            Arc::new(move |new_type: String| {
                                let mutator = mutator.clone();
                                Box::pin(async move {
                                    if mutator.update_type(link_id, &new_type).await.is_ok() {
                                        mutator.reload_handle().request();
                                    }
                                })
                            }),
                        );
                    }
                }
                notifier.push(toast);
                self.mutator.reload_handle().request();
                Ok(())
            }
            Err(e) => {
                tracing::warn!("picker create failed: {}", e);
                notifier.error("Couldn't create link.");
                Err(e.into())
            }
        }
    }

    async fn confirm_bulk(&self, session: PickerSession) -> Result<(), LinkServiceError> {
        let row = session.selected().cloned().ok_or(LinkServiceError::NoSelection)?;
        if session.sources.is_empty() {
            return Err(LinkServiceError::MissingSource);
        }
        let items: Vec<CreateLinkPayload> = session
            .sources
            .iter()
            .map(|source| CreateLinkPayload {
                src_type: source.record_type.clone(),
                src_id: source.id.clone(),
                dst_type: row.record.record_type.clone(),
                dst_id: row.record.id.clone(),
                link_type: row.selected_type.clone(),
                label: None,
                created_by: "ui".to_string(),
                context_type: session.context_type.clone(),
                context_id: session.context_id.clone(),
            })
            .collect();
        let notifier = self.mutator.notifier();
        match self.mutator.backend().bulk_create(&items).await {
            Ok(result) => {
                let dupes = result.duplicates();
                if dupes > 0 {
                    notifier.info(format!("Already linked {dupes} item(s)."));
                } else {
                    notifier.info(format!("Linked {} item(s).", items.len()));
                }
                self.mutator.reload_handle().request();
                Ok(())
            }
            Err(e) => {
                tracing::warn!("picker bulk create failed: {}", e);
                notifier.error("Couldn't create links.");
                Err(e.into())
            }
        }
    }

    /// Resolution source type for the session: the single source's type, or
    /// the first bulk source's (bulk selections come from one list, so the
    /// types agree).
    fn resolution_src_type(&self, session: &PickerSession) -> String {
        session
            .source
            .as_ref()
            .or_else(|| session.sources.first())
            .map(|r| r.record_type.clone())
            .unwrap_or_default()
    }
}
