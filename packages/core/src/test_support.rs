//! Test Support
//!
//! Scripted [`LinkBackend`] double plus small fixture builders. The mock
//! keeps a real link store so create/delete/update flows behave like the
//! backend (duplicate detection included) while every call is counted and
//! failure modes can be switched on per operation.

use crate::backend::{BackendError, BulkResult, CreateResult, LinkBackend, ResolvedTypes};
use crate::models::{CreateLinkPayload, Link, LinkType, LinkPatch, RecordRef, Summary};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Build a create payload with "ui" provenance defaults.
pub fn payload(
    src_type: &str,
    src_id: &str,
    dst_type: &str,
    dst_id: &str,
    link_type: &str,
) -> CreateLinkPayload {
    CreateLinkPayload {
        src_type: src_type.to_string(),
        src_id: src_id.to_string(),
        dst_type: dst_type.to_string(),
        dst_id: dst_id.to_string(),
        link_type: link_type.to_string(),
        label: None,
        created_by: "ui".to_string(),
        context_type: String::new(),
        context_id: String::new(),
    }
}

/// Build a link fixture.
pub fn test_link(
    link_id: i64,
    src_type: &str,
    src_id: &str,
    dst_type: &str,
    dst_id: &str,
    link_type: &str,
) -> Link {
    serde_json::from_value(serde_json::json!({
        "link_id": link_id,
        "src_type": src_type,
        "src_id": src_id,
        "dst_type": dst_type,
        "dst_id": dst_id,
        "link_type": link_type,
    }))
    .expect("link fixture")
}

#[derive(Default)]
struct MockState {
    links: Vec<Link>,
    summaries: HashMap<String, Summary>,
    resolutions: HashMap<String, ResolvedTypes>,
    search_results: Vec<RecordRef>,
    fail_creates: bool,
    fail_deletes: bool,
    fail_searches: bool,
    fail_updates_for: HashSet<i64>,
    patch_log: Vec<(i64, LinkPatch)>,
}

/// Scripted in-memory backend.
#[derive(Default)]
pub struct MockBackend {
    state: Mutex<MockState>,
    next_id: AtomicI64,
    latency: Option<Duration>,
    summary_calls: AtomicUsize,
    resolve_calls: AtomicUsize,
    search_calls: AtomicUsize,
    update_calls: AtomicUsize,
    list_calls: AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            ..Default::default()
        }
    }

    /// Delay every call, forcing overlap in concurrency tests.
    pub fn with_latency_ms(mut self, millis: u64) -> Self {
        self.latency = Some(Duration::from_millis(millis));
        self
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().expect("mock state lock")
    }

    pub fn put_summary(&self, record_type: &str, id: &str, title: &str) {
        self.lock().summaries.insert(
            format!("{record_type}:{id}"),
            Summary {
                title: Some(title.to_string()),
                subtitle: None,
                icon: Some(record_type.to_string()),
                open_url: Some(format!("/{record_type}/view/{id}")),
            },
        );
    }

    /// Script the resolution for a destination type (any context/source).
    pub fn put_resolution(&self, dst_type: &str, allowed: Vec<&str>, default_type: &str) {
        self.lock().resolutions.insert(
            dst_type.to_string(),
            ResolvedTypes {
                allowed_types: allowed.into_iter().map(String::from).collect(),
                default_type: Some(default_type.to_string()),
            },
        );
    }

    pub fn put_search_result(&self, record: RecordRef) {
        self.lock().search_results.push(record);
    }

    /// Seed a link directly into the store.
    pub fn seed_link(&self, link: Link) {
        let mut state = self.lock();
        self.next_id.fetch_max(link.link_id + 1, Ordering::SeqCst);
        state.links.push(link);
    }

    pub fn fail_creates(&self) {
        self.lock().fail_creates = true;
    }

    pub fn fail_deletes(&self) {
        self.lock().fail_deletes = true;
    }

    pub fn fail_searches(&self) {
        self.lock().fail_searches = true;
    }

    /// Fail PATCHes for one link id.
    pub fn fail_update_for(&self, link_id: i64) {
        self.lock().fail_updates_for.insert(link_id);
    }

    pub fn links(&self) -> Vec<Link> {
        self.lock().links.clone()
    }

    pub fn link_count(&self) -> usize {
        self.lock().links.len()
    }

    pub fn patch_log(&self) -> Vec<(i64, LinkPatch)> {
        self.lock().patch_log.clone()
    }

    pub fn summary_calls(&self) -> usize {
        self.summary_calls.load(Ordering::SeqCst)
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn find_duplicate(state: &MockState, item: &CreateLinkPayload) -> Option<i64> {
        state
            .links
            .iter()
            .find(|l| {
                l.src_type == item.src_type
                    && l.src_id == item.src_id
                    && l.dst_type == item.dst_type
                    && l.dst_id == item.dst_id
                    && l.link_type == item.link_type
            })
            .map(|l| l.link_id)
    }

    fn insert_link(&self, state: &mut MockState, item: &CreateLinkPayload) -> CreateResult {
        if let Some(existing) = Self::find_duplicate(state, item) {
            return CreateResult {
                created: false,
                duplicate: true,
                link_id: Some(existing),
                error: None,
            };
        }
        let link_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut link = test_link(
            link_id,
            &item.src_type,
            &item.src_id,
            &item.dst_type,
            &item.dst_id,
            &item.link_type,
        );
        link.label = item.label.clone();
        link.created_by = Some(item.created_by.clone());
        link.context_type = Some(item.context_type.clone());
        link.context_id = Some(item.context_id.clone());
        state.links.push(link);
        CreateResult {
            created: true,
            duplicate: false,
            link_id: Some(link_id),
            error: None,
        }
    }
}

#[async_trait]
impl LinkBackend for MockBackend {
    async fn list_outgoing(&self, src: &RecordRef) -> Result<Vec<Link>, BackendError> {
        self.simulate_latency().await;
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let mut links: Vec<Link> = self
            .lock()
            .links
            .iter()
            .filter(|l| l.src_type == src.record_type && l.src_id == src.id)
            .cloned()
            .collect();
        links.sort_by(|a, b| {
            (a.link_type.as_str(), a.sort_order, a.link_id)
                .cmp(&(b.link_type.as_str(), b.sort_order, b.link_id))
        });
        Ok(links)
    }

    async fn list_incoming(&self, dst: &RecordRef) -> Result<Vec<Link>, BackendError> {
        self.simulate_latency().await;
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let mut links: Vec<Link> = self
            .lock()
            .links
            .iter()
            .filter(|l| l.dst_type == dst.record_type && l.dst_id == dst.id)
            .cloned()
            .collect();
        links.sort_by(|a, b| {
            (a.link_type.as_str(), a.sort_order, a.link_id)
                .cmp(&(b.link_type.as_str(), b.sort_order, b.link_id))
        });
        Ok(links)
    }

    async fn get_summary(&self, record: &RecordRef) -> Result<Summary, BackendError> {
        self.simulate_latency().await;
        self.summary_calls.fetch_add(1, Ordering::SeqCst);
        self.lock()
            .summaries
            .get(&record.cache_key())
            .cloned()
            .ok_or_else(|| BackendError::api(404, "not_found"))
    }

    async fn resolve_types(
        &self,
        _context_type: &str,
        _src_type: &str,
        dst_types: &[String],
    ) -> Result<HashMap<String, ResolvedTypes>, BackendError> {
        self.simulate_latency().await;
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.lock();
        let mut resolved = HashMap::new();
        for dst_type in dst_types {
            let entry = state.resolutions.get(dst_type).cloned().unwrap_or_else(|| {
                ResolvedTypes {
                    allowed_types: LinkType::ALL.iter().map(|t| t.as_str().to_string()).collect(),
                    default_type: Some("related".to_string()),
                }
            });
            resolved.insert(dst_type.clone(), entry);
        }
        Ok(resolved)
    }

    async fn create_link(&self, item: &CreateLinkPayload) -> Result<CreateResult, BackendError> {
        self.simulate_latency().await;
        let mut state = self.lock();
        if state.fail_creates {
            return Err(BackendError::api(500, "create_failed"));
        }
        Ok(self.insert_link(&mut state, item))
    }

    async fn bulk_create(&self, items: &[CreateLinkPayload]) -> Result<BulkResult, BackendError> {
        self.simulate_latency().await;
        let mut state = self.lock();
        if state.fail_creates {
            return Err(BackendError::api(500, "create_failed"));
        }
        let results = items
            .iter()
            .map(|item| self.insert_link(&mut state, item))
            .collect();
        Ok(BulkResult { results })
    }

    async fn update_link(&self, link_id: i64, patch: &LinkPatch) -> Result<(), BackendError> {
        self.simulate_latency().await;
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock();
        if state.fail_updates_for.contains(&link_id) {
            return Err(BackendError::api(500, "update_failed"));
        }
        state.patch_log.push((link_id, patch.clone()));
        if let Some(link) = state.links.iter_mut().find(|l| l.link_id == link_id) {
            if let Some(link_type) = &patch.link_type {
                link.link_type = link_type.clone();
            }
            if let Some(label) = &patch.label {
                link.label = Some(label.clone());
            }
            if let Some(sort_order) = patch.sort_order {
                link.sort_order = sort_order;
            }
        }
        Ok(())
    }

    async fn delete_link(&self, link_id: i64) -> Result<(), BackendError> {
        self.simulate_latency().await;
        let mut state = self.lock();
        if state.fail_deletes {
            return Err(BackendError::api(500, "delete_failed"));
        }
        state.links.retain(|l| l.link_id != link_id);
        Ok(())
    }

    async fn search_records(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<RecordRef>, BackendError> {
        self.simulate_latency().await;
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.lock();
        if state.fail_searches {
            return Err(BackendError::api(500, "search_failed"));
        }
        let needle = query.to_lowercase();
        Ok(state
            .search_results
            .iter()
            .filter(|r| {
                r.title
                    .as_deref()
                    .map(|t| t.to_lowercase().contains(&needle))
                    .unwrap_or(false)
                    || r.id.to_lowercase().contains(&needle)
            })
            .take(limit)
            .cloned()
            .collect())
    }
}
