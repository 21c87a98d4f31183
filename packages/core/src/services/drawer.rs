//! Drawer Controller
//!
//! Top-level state machine for the links drawer: open/closed, direction
//! (incoming/outgoing), selection, keyboard routing, width persistence. Owns
//! the link collection and drives list loads.
//!
//! # Load generations
//!
//! Every entry into an open state issues exactly one list read. Reads carry
//! a monotonically increasing generation; a completion whose generation is
//! not the latest issued is discarded, so a slow stale response can never
//! overwrite a newer list.
//!
//! # Optimistic mutations
//!
//! Delete removes the row from view and local state before the request and
//! never restores it on failure (the Undo toast re-creates an equivalent
//! edge instead). A type change re-renders immediately and, on failure,
//! re-renders from the last known-good value.

use crate::backend::LinkBackend;
use crate::config::SettingsStore;
use crate::models::{contexts, CreateLinkPayload, LinkTypeKey, RecordRef};
use crate::services::collection::{Direction, LinkCollection};
use crate::services::error::LinkServiceError;
use crate::services::mutation::{LinkMutator, ReloadHandle};
use crate::services::notify::Notifier;
use crate::services::renderer::{DrawerView, RowRenderer, RowView, TitleState};
use crate::services::reorder::{DragPayload, ReorderEngine};
use crate::services::summary_cache::SummaryCache;
use crate::services::type_resolution::TypeResolutionCache;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Client-local setting holding the persisted drawer width.
pub const DRAWER_WIDTH_SETTING: &str = "links.drawer_width";

pub const DRAWER_WIDTH_MIN: i32 = 240;
pub const DRAWER_WIDTH_MAX: i32 = 640;

/// Horizontal space always left for the page beside the drawer.
const VIEWPORT_MARGIN: i32 = 40;

/// Drawer state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawerState {
    Closed,
    Open(Direction),
}

/// Keys routed to the drawer while it has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawerKey {
    Char(char),
    Enter,
    Delete,
    Escape,
}

/// A modifier chord routed at page level, before focus dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyChord {
    pub key: char,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

/// What a routed key asks the embedding shell to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Open the link picker in single mode (drawer-add context)
    OpenPicker,
    /// Drawer gave up focus
    Blurred,
    /// Navigate to the selected row's target
    Navigate(String),
    /// Selected row was unlinked
    Unlinked,
    /// Drawer visibility toggled by the global chord
    DrawerToggled,
    /// Focus the selected row's label field
    FocusLabel(Uuid),
    /// Focus the selected row's type selector
    FocusType(Uuid),
    Ignored,
}

/// Direction requested by a `links=incoming|outgoing` URL query parameter.
pub fn requested_direction(query: &str) -> Option<Direction> {
    let query = query.strip_prefix('?').unwrap_or(query);
    for pair in query.split('&') {
        let mut parts = pair.splitn(2, '=');
        if parts.next() == Some("links") {
            return Direction::parse(&parts.next().unwrap_or("").to_lowercase());
        }
    }
    None
}

/// Append or replace the `links=` parameter on a navigation URL, preserving
/// any fragment.
pub fn with_direction_param(url: &str, direction: Direction) -> String {
    let (base, fragment) = match url.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (url, None),
    };
    let (path, query) = match base.split_once('?') {
        Some((path, query)) => (path, query),
        None => (base, ""),
    };

    let mut pairs: Vec<String> = query
        .split('&')
        .filter(|p| !p.is_empty() && !p.starts_with("links="))
        .map(String::from)
        .collect();
    pairs.push(format!("links={}", direction.as_str()));

    let mut out = format!("{}?{}", path, pairs.join("&"));
    if let Some(fragment) = fragment {
        out.push('#');
        out.push_str(fragment);
    }
    out
}

/// Clamp a width to the allowed range, never exceeding the viewport budget.
pub fn clamp_width(width: i32, viewport_width: i32) -> i32 {
    let max = DRAWER_WIDTH_MAX.min(viewport_width - VIEWPORT_MARGIN);
    width.clamp(DRAWER_WIDTH_MIN, max.max(DRAWER_WIDTH_MIN))
}

struct ResizeGesture {
    start_x: i32,
    start_width: i32,
}

/// Drawer width: persisted across sessions, adjusted by a press-drag-release
/// gesture on the resize handle. The drawer sits on the right edge, so
/// dragging left widens it.
pub struct DrawerWidth {
    settings: Arc<dyn SettingsStore>,
    current: Option<i32>,
    gesture: Option<ResizeGesture>,
}

impl DrawerWidth {
    pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
        let current = settings
            .get(DRAWER_WIDTH_SETTING)
            .and_then(|raw| raw.parse::<i32>().ok());
        Self {
            settings,
            current,
            gesture: None,
        }
    }

    /// Restored width, if one was ever persisted.
    pub fn current(&self) -> Option<i32> {
        self.current
    }

    pub fn begin_resize(&mut self, start_x: i32, start_width: i32) {
        self.gesture = Some(ResizeGesture {
            start_x,
            start_width,
        });
    }

    /// Apply a drag movement; returns the clamped width now displayed.
    pub fn update_resize(&mut self, x: i32, viewport_width: i32) -> Option<i32> {
        let gesture = self.gesture.as_ref()?;
        let width = clamp_width(
            gesture.start_width + (gesture.start_x - x),
            viewport_width,
        );
        self.current = Some(width);
        Some(width)
    }

    /// Release the handle; the last displayed width is persisted once.
    pub fn end_resize(&mut self) {
        if self.gesture.take().is_some() {
            if let Some(width) = self.current {
                self.settings.set(DRAWER_WIDTH_SETTING, &width.to_string());
            }
        }
    }
}

/// The drawer: one per inspected record, torn down on navigation.
pub struct DrawerController {
    collection: LinkCollection,
    context_type: String,
    state: DrawerState,
    focused: bool,
    view: DrawerView,
    selected_link: Option<i64>,
    generation: u64,
    default_direction: Direction,
    width: DrawerWidth,
    backend: Arc<dyn LinkBackend>,
    summaries: Arc<SummaryCache>,
    resolution: Arc<TypeResolutionCache>,
    renderer: RowRenderer,
    mutator: LinkMutator,
    reorder: ReorderEngine,
    notifier: Notifier,
    reload_rx: mpsc::UnboundedReceiver<()>,
}

impl DrawerController {
    pub fn new(
        record: RecordRef,
        context_type: impl Into<String>,
        default_direction: Direction,
        backend: Arc<dyn LinkBackend>,
        notifier: Notifier,
        settings: Arc<dyn SettingsStore>,
    ) -> Self {
        let context_type = context_type.into();
        let summaries = Arc::new(SummaryCache::new(backend.clone()));
        let resolution = Arc::new(TypeResolutionCache::new(backend.clone()));
        let renderer = RowRenderer::new(summaries.clone(), resolution.clone(), context_type.clone());
        let (reload, reload_rx) = ReloadHandle::channel();
        let mutator = LinkMutator::new(backend.clone(), notifier.clone(), reload);
        let reorder = ReorderEngine::new(mutator.clone());
        Self {
            collection: LinkCollection::new(record, default_direction),
            context_type,
            state: DrawerState::Closed,
            focused: false,
            view: DrawerView::default(),
            selected_link: None,
            generation: 0,
            default_direction,
            width: DrawerWidth::new(settings),
            backend,
            summaries,
            resolution,
            renderer,
            mutator,
            reorder,
            notifier,
            reload_rx,
        }
    }

    pub fn record(&self) -> &RecordRef {
        self.collection.record()
    }

    pub fn context_type(&self) -> &str {
        &self.context_type
    }

    pub fn state(&self) -> DrawerState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, DrawerState::Open(_))
    }

    pub fn direction(&self) -> Option<Direction> {
        match self.state {
            DrawerState::Open(direction) => Some(direction),
            DrawerState::Closed => None,
        }
    }

    pub fn view(&self) -> &DrawerView {
        &self.view
    }

    pub fn width(&mut self) -> &mut DrawerWidth {
        &mut self.width
    }

    /// Shared mutation front, for the picker and mention engine.
    pub fn mutator(&self) -> LinkMutator {
        self.mutator.clone()
    }

    pub fn resolution_cache(&self) -> Arc<TypeResolutionCache> {
        self.resolution.clone()
    }

    pub fn summary_cache(&self) -> Arc<SummaryCache> {
        self.summaries.clone()
    }

    pub fn notifier(&self) -> Notifier {
        self.notifier.clone()
    }

    /// Open the drawer. The initial direction comes from the URL query
    /// parameter when present, else the per-drawer default. Entering the
    /// open state issues one list read.
    pub async fn open(&mut self, url_query: Option<&str>) -> Result<(), LinkServiceError> {
        let direction = url_query
            .and_then(requested_direction)
            .unwrap_or(self.default_direction);
        self.state = DrawerState::Open(direction);
        self.collection.set_direction(direction);
        self.reload().await
    }

    pub fn close(&mut self) {
        self.state = DrawerState::Closed;
        self.focused = false;
    }

    /// Switch between incoming and outgoing; a direction change reloads.
    pub async fn switch_direction(&mut self, direction: Direction) -> Result<(), LinkServiceError> {
        match self.state {
            DrawerState::Closed => Err(LinkServiceError::DrawerClosed),
            DrawerState::Open(current) if current == direction => Ok(()),
            DrawerState::Open(_) => {
                self.state = DrawerState::Open(direction);
                self.collection.set_direction(direction);
                self.reload().await
            }
        }
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Issue a new load generation; any older in-flight load becomes stale.
    fn begin_load(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Apply a completed load. Returns false when the result was stale and
    /// discarded.
    fn apply_loaded(&mut self, generation: u64, links: Vec<crate::models::Link>) -> bool {
        if generation != self.generation {
            tracing::debug!(
                "discarding stale link load (generation {} < {})",
                generation,
                self.generation
            );
            return false;
        }
        self.collection.set_links(links);
        self.rebuild_view();
        true
    }

    /// Load the link list for the current record and direction.
    ///
    /// A load failure degrades to an empty list; nothing here is fatal.
    pub async fn reload(&mut self) -> Result<(), LinkServiceError> {
        let direction = self.direction().ok_or(LinkServiceError::DrawerClosed)?;
        let generation = self.begin_load();
        let record = self.collection.record().clone();
        let result = match direction {
            Direction::Outgoing => self.backend.list_outgoing(&record).await,
            Direction::Incoming => self.backend.list_incoming(&record).await,
        };
        let links = match result {
            Ok(links) => links,
            Err(e) => {
                tracing::warn!("link list load failed for {}: {}", record.cache_key(), e);
                Vec::new()
            }
        };
        self.apply_loaded(generation, links);
        Ok(())
    }

    /// Hydrate every row's summary and type options in place.
    pub async fn hydrate(&mut self) {
        self.renderer.hydrate_view(&mut self.view).await;
    }

    fn rebuild_view(&mut self) {
        self.view = self.renderer.build_view(&self.collection);
        // Selection survives a rebuild only if its link is still listed.
        if let Some(link_id) = self.selected_link {
            if self.view.row_for_link(link_id).is_none() {
                self.selected_link = None;
            }
        }
    }

    pub fn select_row(&mut self, row_id: Uuid) -> bool {
        match self.view.row(row_id) {
            Some(row) => {
                self.selected_link = Some(row.link.link_id);
                true
            }
            None => false,
        }
    }

    pub fn selected_row(&self) -> Option<&RowView> {
        self.selected_link.and_then(|id| self.view.row_for_link(id))
    }

    /// Drain queued reload requests (from undo actions, picker confirms).
    /// Returns whether any were pending; the caller then awaits `reload`.
    pub fn take_reload_request(&mut self) -> bool {
        let mut any = false;
        while self.reload_rx.try_recv().is_ok() {
            any = true;
        }
        any
    }

    /// Run any queued reload requests.
    pub async fn pump(&mut self) -> Result<(), LinkServiceError> {
        if self.take_reload_request() && self.is_open() {
            self.reload().await?;
        }
        Ok(())
    }

    /// Unlink a row: optimistic removal from view and local state, then the
    /// delete call. A failed delete leaves the row gone until the next
    /// reload reconciles.
    pub async fn unlink_row(&mut self, row_id: Uuid) -> Result<(), LinkServiceError> {
        let row = self.view.remove_row(row_id).ok_or(LinkServiceError::NoSelection)?;
        self.collection.remove(row.link.link_id);
        if self.selected_link == Some(row.link.link_id) {
            self.selected_link = None;
        }
        // Only a resolved title names the toast; anything else is "item".
        let display = match &row.title {
            TitleState::Ready { title, .. } => title.clone(),
            _ => "item".to_string(),
        };
        // Failure already notified; the row stays removed either way.
        let _ = self.mutator.delete(&row.link, &display).await;
        Ok(())
    }

    /// Change a row's type. The view reflects the new type immediately; on
    /// failure it is re-rendered from the last known-good value.
    pub async fn change_row_type(
        &mut self,
        row_id: Uuid,
        new_type: &str,
    ) -> Result<(), LinkServiceError> {
        let link_id = {
            let row = self.view.row_mut(row_id).ok_or(LinkServiceError::NoSelection)?;
            if row.link.link_type == new_type {
                return Ok(());
            }
            // Optimistic: the row shows the new type before the call lands.
            row.link.link_type = new_type.to_string();
            row.link.link_id
        };
        match self.mutator.update_type(link_id, new_type).await {
            Ok(()) => {
                self.collection.set_link_type(link_id, new_type);
                self.rebuild_view();
                Ok(())
            }
            Err(_) => {
                // Authoritative value never changed; revert is a re-render.
                self.rebuild_view();
                Ok(())
            }
        }
    }

    /// Commit a label edit (field blur). No-op when unchanged.
    pub async fn commit_label(&mut self, row_id: Uuid, label: &str) -> Result<(), LinkServiceError> {
        let (link_id, prior) = {
            let row = self.view.row(row_id).ok_or(LinkServiceError::NoSelection)?;
            (row.link.link_id, row.link.label.clone().unwrap_or_default())
        };
        let label = label.trim();
        if label == prior {
            return Ok(());
        }
        match self.mutator.update_label(link_id, label).await {
            Ok(()) => {
                self.collection.set_label(link_id, label);
                if let Some(row) = self.view.row_mut(row_id) {
                    row.link.label = Some(label.to_string());
                    row.label = label.to_string();
                }
                Ok(())
            }
            Err(_) => {
                self.cancel_label_edit(row_id);
                Ok(())
            }
        }
    }

    /// Escape in the label field: restore the prior label, commit nothing.
    pub fn cancel_label_edit(&mut self, row_id: Uuid) {
        if let Some(row) = self.view.row_mut(row_id) {
            row.label = row.link.label.clone().unwrap_or_default();
        }
    }

    /// Route a drop. Record payloads on a group header become a bulk-create
    /// with that group's type; a row payload needs `drop_row` (the drop
    /// target row identifies the position).
    pub async fn handle_drop(
        &mut self,
        payload: DragPayload,
        zone: &LinkTypeKey,
    ) -> Result<(), LinkServiceError> {
        match payload {
            DragPayload::Records(records) => self.drop_records(records, zone).await,
            DragPayload::Row { link_id } => {
                Err(LinkServiceError::reorder_rejected(format!(
                    "row {link_id} dropped on a group header"
                )))
            }
        }
    }

    async fn drop_records(
        &mut self,
        records: Vec<RecordRef>,
        zone: &LinkTypeKey,
    ) -> Result<(), LinkServiceError> {
        if records.is_empty() {
            return Ok(());
        }
        if self.direction() == Some(Direction::Incoming) {
            self.notifier.info("Switch to outgoing to create links.");
            return Ok(());
        }
        let record = self.collection.record().clone();
        let items: Vec<CreateLinkPayload> = records
            .iter()
            .map(|rec| CreateLinkPayload {
                src_type: record.record_type.clone(),
                src_id: record.id.clone(),
                dst_type: rec.record_type.clone(),
                dst_id: rec.id.clone(),
                link_type: zone.as_str().to_string(),
                label: None,
                created_by: "ui".to_string(),
                context_type: contexts::DRAWER_DROP.to_string(),
                context_id: record.id.clone(),
            })
            .collect();
        let _ = self.mutator.bulk_create(&items).await;
        self.pump().await
    }

    /// Same-group reorder: move `moved` before `before` (None = end) within
    /// the group that contains it, then persist the group's sort orders.
    pub async fn drop_row(
        &mut self,
        moved: i64,
        before: Option<i64>,
    ) -> Result<(), LinkServiceError> {
        let group_order: Vec<i64> = self
            .view
            .groups
            .iter()
            .map(|g| {
                g.row_ids
                    .iter()
                    .filter_map(|id| self.view.row(*id))
                    .map(|row| row.link.link_id)
                    .collect::<Vec<i64>>()
            })
            .find(|ids| ids.contains(&moved))
            .ok_or_else(|| {
                LinkServiceError::reorder_rejected(format!("link {moved} is not rendered"))
            })?;

        let assignments = self.reorder.reorder_row(&group_order, moved, before).await?;
        for (link_id, sort_order) in &assignments {
            self.collection.set_sort_order(*link_id, *sort_order);
        }
        // Re-render in committed order.
        let mut links = self.collection.links().to_vec();
        links.sort_by(|a, b| {
            (a.link_type.as_str(), a.sort_order, a.link_id)
                .cmp(&(b.link_type.as_str(), b.sort_order, b.link_id))
        });
        self.collection.set_links(links);
        self.rebuild_view();
        Ok(())
    }

    /// Resolve the navigation URL for a row's target, flipping the `links=`
    /// parameter so the destination drawer opens facing back.
    pub async fn target_url(&self, row_id: Uuid) -> Option<String> {
        let direction = self.direction()?;
        let row = self.view.row(row_id)?;
        let summary = self.summaries.get(&row.far_end).await.ok()?;
        summary
            .open_url
            .map(|url| with_direction_param(&url, direction.opposite()))
    }

    /// Route a page-global chord: Ctrl+Shift+L opens the picker,
    /// Ctrl+Alt+L toggles the drawer (opening loads the list as usual).
    pub async fn handle_global_chord(&mut self, chord: KeyChord) -> KeyOutcome {
        if !chord.ctrl || !chord.key.eq_ignore_ascii_case(&'l') {
            return KeyOutcome::Ignored;
        }
        if chord.shift && !chord.alt {
            return KeyOutcome::OpenPicker;
        }
        if chord.alt && !chord.shift {
            if self.is_open() {
                self.close();
            } else {
                let _ = self.open(None).await;
            }
            return KeyOutcome::DrawerToggled;
        }
        KeyOutcome::Ignored
    }

    /// Route a key while the drawer has focus.
    pub async fn handle_key(&mut self, key: DrawerKey) -> KeyOutcome {
        match key {
            DrawerKey::Char('a') | DrawerKey::Char('A') => KeyOutcome::OpenPicker,
            DrawerKey::Escape => {
                self.focused = false;
                KeyOutcome::Blurred
            }
            _ => {
                let row_id = match self.selected_row() {
                    Some(row) => row.row_id,
                    None => return KeyOutcome::Ignored,
                };
                match key {
                    DrawerKey::Enter => match self.target_url(row_id).await {
                        Some(url) => KeyOutcome::Navigate(url),
                        None => KeyOutcome::Ignored,
                    },
                    DrawerKey::Delete => {
                        let _ = self.unlink_row(row_id).await;
                        KeyOutcome::Unlinked
                    }
                    DrawerKey::Char('e') | DrawerKey::Char('E') => KeyOutcome::FocusLabel(row_id),
                    DrawerKey::Char('t') | DrawerKey::Char('T') => KeyOutcome::FocusType(row_id),
                    _ => KeyOutcome::Ignored,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemorySettings;
    use crate::models::LinkType;
    use crate::test_support::{test_link, MockBackend};

    fn drawer(backend: Arc<MockBackend>) -> DrawerController {
        DrawerController::new(
            RecordRef::new("task", "42").with_title("Ship the drawer"),
            "task_detail",
            Direction::Outgoing,
            backend,
            Notifier::new(),
            Arc::new(MemorySettings::new()),
        )
    }

    fn seed_outgoing(backend: &MockBackend) {
        let mut a = test_link(1, "task", "42", "note", "n-1", "related");
        a.sort_order = 10;
        let mut b = test_link(2, "task", "42", "note", "n-2", "related");
        b.sort_order = 20;
        let c = test_link(3, "task", "42", "file", "f-1", "attachment");
        backend.seed_link(a);
        backend.seed_link(b);
        backend.seed_link(c);
    }

    #[tokio::test]
    async fn test_open_issues_exactly_one_read() {
        let backend = Arc::new(MockBackend::new());
        seed_outgoing(&backend);
        let mut drawer = drawer(backend.clone());

        drawer.open(None).await.unwrap();
        assert_eq!(backend.list_calls(), 1);
        assert_eq!(drawer.state(), DrawerState::Open(Direction::Outgoing));
        assert_eq!(drawer.view().len(), 3);
    }

    #[tokio::test]
    async fn test_url_parameter_overrides_default_direction() {
        let backend = Arc::new(MockBackend::new());
        let mut drawer = drawer(backend);

        drawer.open(Some("?tab=x&links=incoming")).await.unwrap();
        assert_eq!(drawer.direction(), Some(Direction::Incoming));
    }

    #[tokio::test]
    async fn test_switch_direction_reloads_same_direction_does_not() {
        let backend = Arc::new(MockBackend::new());
        let mut drawer = drawer(backend.clone());
        drawer.open(None).await.unwrap();
        assert_eq!(backend.list_calls(), 1);

        drawer.switch_direction(Direction::Outgoing).await.unwrap();
        assert_eq!(backend.list_calls(), 1);

        drawer.switch_direction(Direction::Incoming).await.unwrap();
        assert_eq!(backend.list_calls(), 2);
        assert_eq!(drawer.direction(), Some(Direction::Incoming));
    }

    #[tokio::test]
    async fn test_stale_load_generation_is_discarded() {
        let backend = Arc::new(MockBackend::new());
        let mut drawer = drawer(backend);
        drawer.state = DrawerState::Open(Direction::Outgoing);

        let older = drawer.begin_load();
        let newer = drawer.begin_load();

        let fresh = vec![test_link(9, "task", "42", "note", "n-9", "related")];
        assert!(drawer.apply_loaded(newer, fresh));
        assert_eq!(drawer.view().len(), 1);

        // The slow old response lands afterwards and must not win.
        let stale = vec![
            test_link(1, "task", "42", "note", "n-1", "related"),
            test_link(2, "task", "42", "note", "n-2", "related"),
        ];
        assert!(!drawer.apply_loaded(older, stale));
        assert_eq!(drawer.view().len(), 1);
        assert!(drawer.view().row_for_link(9).is_some());
    }

    #[tokio::test]
    async fn test_unlink_removes_row_immediately_and_undo_restores() {
        let backend = Arc::new(MockBackend::new());
        seed_outgoing(&backend);
        backend.put_summary("note", "n-1", "Weekly plan");
        let mut drawer = drawer(backend.clone());
        let mut toasts = drawer.notifier().subscribe();

        drawer.open(None).await.unwrap();
        drawer.hydrate().await;
        let row_id = drawer.view().row_for_link(1).unwrap().row_id;

        drawer.unlink_row(row_id).await.unwrap();
        assert!(drawer.view().row_for_link(1).is_none());
        assert_eq!(backend.link_count(), 2);

        let toast = toasts.recv().await.unwrap();
        assert_eq!(toast.message, "Unlinked Weekly plan");
        assert!(toast.run_undo().await);

        // Undo queued a reload; after pumping, an equivalent link is back.
        drawer.pump().await.unwrap();
        let restored: Vec<_> = drawer
            .view()
            .ordered_row_ids()
            .iter()
            .filter_map(|id| drawer.view().row(*id).map(|r| r.link.clone()))
            .filter(|l| l.dst_id == "n-1" && l.link_type == "related")
            .collect();
        assert_eq!(restored.len(), 1);
        assert_ne!(restored[0].link_id, 1);
    }

    #[tokio::test]
    async fn test_failed_delete_does_not_restore_row() {
        let backend = Arc::new(MockBackend::new());
        seed_outgoing(&backend);
        let mut drawer = drawer(backend.clone());
        drawer.open(None).await.unwrap();
        backend.fail_deletes();

        let row_id = drawer.view().row_for_link(1).unwrap().row_id;
        drawer.unlink_row(row_id).await.unwrap();
        assert!(drawer.view().row_for_link(1).is_none());
    }

    #[tokio::test]
    async fn test_type_change_failure_reverts_by_rerender() {
        let backend = Arc::new(MockBackend::new());
        seed_outgoing(&backend);
        let mut drawer = drawer(backend.clone());
        drawer.open(None).await.unwrap();
        backend.fail_update_for(1);

        let row_id = drawer.view().row_for_link(1).unwrap().row_id;
        drawer.change_row_type(row_id, "about").await.unwrap();

        // Last known-good value after the failed call.
        assert_eq!(drawer.view().row_for_link(1).unwrap().link.link_type, "related");
    }

    #[tokio::test]
    async fn test_type_change_success_moves_row_to_new_group() {
        let backend = Arc::new(MockBackend::new());
        seed_outgoing(&backend);
        let mut drawer = drawer(backend.clone());
        drawer.open(None).await.unwrap();

        let row_id = drawer.view().row_for_link(1).unwrap().row_id;
        drawer.change_row_type(row_id, "about").await.unwrap();

        let about = drawer
            .view()
            .groups
            .iter()
            .find(|g| g.key == LinkTypeKey::Known(LinkType::About))
            .unwrap();
        assert_eq!(about.count(), 1);
    }

    #[tokio::test]
    async fn test_label_escape_restores_without_commit() {
        let backend = Arc::new(MockBackend::new());
        seed_outgoing(&backend);
        let mut drawer = drawer(backend.clone());
        drawer.open(None).await.unwrap();

        let row_id = drawer.view().row_for_link(1).unwrap().row_id;
        drawer.view.row_mut(row_id).unwrap().label = "half-typed".to_string();
        drawer.cancel_label_edit(row_id);
        assert_eq!(drawer.view().row(row_id).unwrap().label, "");
        assert_eq!(backend.update_calls(), 0);
    }

    #[tokio::test]
    async fn test_commit_label_sends_patch_once_changed() {
        let backend = Arc::new(MockBackend::new());
        seed_outgoing(&backend);
        let mut drawer = drawer(backend.clone());
        drawer.open(None).await.unwrap();

        let row_id = drawer.view().row_for_link(1).unwrap().row_id;
        drawer.commit_label(row_id, "  important  ").await.unwrap();
        let log = backend.patch_log();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].1.label.as_deref(), Some("important"));

        // Unchanged commit is a no-op.
        drawer.commit_label(row_id, "important").await.unwrap();
        assert_eq!(backend.patch_log().len(), 1);
    }

    #[tokio::test]
    async fn test_drop_records_routes_to_bulk_create() {
        let backend = Arc::new(MockBackend::new());
        let mut drawer = drawer(backend.clone());
        drawer.open(None).await.unwrap();

        let payload = DragPayload::Records(vec![
            RecordRef::new("file", "f-7"),
            RecordRef::new("file", "f-8"),
        ]);
        drawer
            .handle_drop(payload, &LinkTypeKey::Known(LinkType::Attachment))
            .await
            .unwrap();

        assert_eq!(backend.link_count(), 2);
        let links = backend.links();
        assert!(links.iter().all(|l| l.link_type == "attachment"));
        assert!(links
            .iter()
            .all(|l| l.context_type.as_deref() == Some(contexts::DRAWER_DROP)));
        // Drop triggered a reload of the visible list.
        assert_eq!(drawer.view().len(), 2);
    }

    #[tokio::test]
    async fn test_drop_rejected_while_incoming() {
        let backend = Arc::new(MockBackend::new());
        let mut drawer = drawer(backend.clone());
        drawer.open(Some("links=incoming")).await.unwrap();
        let mut toasts = drawer.notifier().subscribe();

        drawer
            .handle_drop(
                DragPayload::Records(vec![RecordRef::new("file", "f-7")]),
                &LinkTypeKey::Known(LinkType::Attachment),
            )
            .await
            .unwrap();

        assert_eq!(backend.link_count(), 0);
        let toast = toasts.recv().await.unwrap();
        assert_eq!(toast.message, "Switch to outgoing to create links.");
    }

    #[tokio::test]
    async fn test_drop_row_reorders_group_and_rerenders() {
        let backend = Arc::new(MockBackend::new());
        seed_outgoing(&backend);
        let mut drawer = drawer(backend.clone());
        drawer.open(None).await.unwrap();

        // Move link 2 before link 1 in the related group.
        drawer.drop_row(2, Some(1)).await.unwrap();

        let related = drawer.view().groups[0].clone();
        let order: Vec<i64> = related
            .row_ids
            .iter()
            .map(|id| drawer.view().row(*id).unwrap().link.link_id)
            .collect();
        assert_eq!(order, vec![2, 1]);
        let sort_orders: Vec<i64> = related
            .row_ids
            .iter()
            .map(|id| drawer.view().row(*id).unwrap().link.sort_order)
            .collect();
        assert_eq!(sort_orders, vec![10, 20]);
    }

    #[tokio::test]
    async fn test_keyboard_routing() {
        let backend = Arc::new(MockBackend::new());
        seed_outgoing(&backend);
        backend.put_summary("note", "n-1", "Weekly plan");
        let mut drawer = drawer(backend);
        drawer.open(None).await.unwrap();
        drawer.set_focused(true);

        assert_eq!(drawer.handle_key(DrawerKey::Char('a')).await, KeyOutcome::OpenPicker);
        // No selection yet.
        assert_eq!(drawer.handle_key(DrawerKey::Enter).await, KeyOutcome::Ignored);

        let row_id = drawer.view().row_for_link(1).unwrap().row_id;
        assert!(drawer.select_row(row_id));
        match drawer.handle_key(DrawerKey::Enter).await {
            KeyOutcome::Navigate(url) => {
                assert_eq!(url, "/note/view/n-1?links=incoming");
            }
            other => panic!("expected navigation, got {other:?}"),
        }
        assert_eq!(drawer.handle_key(DrawerKey::Char('e')).await, KeyOutcome::FocusLabel(row_id));

        assert_eq!(drawer.handle_key(DrawerKey::Escape).await, KeyOutcome::Blurred);
        assert!(!drawer.is_focused());
    }

    #[tokio::test]
    async fn test_global_chords_route_picker_and_toggle() {
        let backend = Arc::new(MockBackend::new());
        seed_outgoing(&backend);
        let mut drawer = drawer(backend.clone());

        let picker_chord = KeyChord {
            key: 'L',
            ctrl: true,
            shift: true,
            alt: false,
        };
        assert_eq!(
            drawer.handle_global_chord(picker_chord).await,
            KeyOutcome::OpenPicker
        );
        assert!(!drawer.is_open());

        let toggle = KeyChord {
            key: 'l',
            ctrl: true,
            shift: false,
            alt: true,
        };
        assert_eq!(
            drawer.handle_global_chord(toggle).await,
            KeyOutcome::DrawerToggled
        );
        assert!(drawer.is_open());
        assert_eq!(backend.list_calls(), 1);

        assert_eq!(
            drawer.handle_global_chord(toggle).await,
            KeyOutcome::DrawerToggled
        );
        assert!(!drawer.is_open());

        // Without Ctrl the chord belongs to someone else.
        let plain = KeyChord {
            key: 'l',
            ctrl: false,
            shift: true,
            alt: false,
        };
        assert_eq!(drawer.handle_global_chord(plain).await, KeyOutcome::Ignored);
    }

    #[tokio::test]
    async fn test_unlink_unresolved_title_reports_generic_item() {
        let backend = Arc::new(MockBackend::new());
        seed_outgoing(&backend);
        let mut drawer = drawer(backend.clone());
        let mut toasts = drawer.notifier().subscribe();

        // No summary seeded: hydration falls back.
        drawer.open(None).await.unwrap();
        drawer.hydrate().await;
        let row_id = drawer.view().row_for_link(1).unwrap().row_id;
        assert!(matches!(
            drawer.view().row(row_id).unwrap().title,
            TitleState::Fallback { .. }
        ));

        drawer.unlink_row(row_id).await.unwrap();
        let toast = toasts.recv().await.unwrap();
        assert_eq!(toast.message, "Unlinked item");
    }

    #[test]
    fn test_requested_direction_parsing() {
        assert_eq!(requested_direction("links=incoming"), Some(Direction::Incoming));
        assert_eq!(requested_direction("?a=1&links=OUTGOING"), Some(Direction::Outgoing));
        assert_eq!(requested_direction("links=sideways"), None);
        assert_eq!(requested_direction("other=1"), None);
    }

    #[test]
    fn test_with_direction_param_appends_replaces_and_keeps_fragment() {
        assert_eq!(
            with_direction_param("/tasks/edit/42", Direction::Incoming),
            "/tasks/edit/42?links=incoming"
        );
        assert_eq!(
            with_direction_param("/tasks/edit/42?tab=x", Direction::Incoming),
            "/tasks/edit/42?tab=x&links=incoming"
        );
        assert_eq!(
            with_direction_param("/tasks/edit/42?links=incoming#notes", Direction::Outgoing),
            "/tasks/edit/42?links=outgoing#notes"
        );
    }

    #[test]
    fn test_width_clamp_and_persistence() {
        let settings = Arc::new(MemorySettings::new());
        settings.set(DRAWER_WIDTH_SETTING, "9999");
        let mut width = DrawerWidth::new(settings.clone());
        assert_eq!(width.current(), Some(9999));

        width.begin_resize(800, 300);
        // Drag 100px left on a 1280px viewport: 400px, inside the range.
        assert_eq!(width.update_resize(700, 1280), Some(400));
        // Drag far right: clamped to the minimum.
        assert_eq!(width.update_resize(1200, 1280), Some(DRAWER_WIDTH_MIN));
        // Drag far left: clamped to the maximum.
        assert_eq!(width.update_resize(0, 1280), Some(DRAWER_WIDTH_MAX));
        // Narrow viewport shrinks the ceiling.
        assert_eq!(width.update_resize(0, 500), Some(460));
        width.end_resize();

        assert_eq!(settings.get(DRAWER_WIDTH_SETTING).as_deref(), Some("460"));
    }
}
