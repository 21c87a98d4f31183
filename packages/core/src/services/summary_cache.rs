//! Summary Resolver Cache
//!
//! Memoizes "what does this record look like" lookups for the life of the
//! session. Keyed by `"{type}:{id}"`. The cache is never invalidated
//! client-side; a record renamed elsewhere keeps its old summary until the
//! next page load, which is a known trade-off.

use crate::backend::{BackendError, LinkBackend};
use crate::models::{RecordRef, Summary};
use crate::services::memo::AsyncMemo;
use std::sync::Arc;

/// Session-wide summary cache with in-flight request de-duplication.
pub struct SummaryCache {
    backend: Arc<dyn LinkBackend>,
    memo: AsyncMemo<Summary>,
}

impl SummaryCache {
    pub fn new(backend: Arc<dyn LinkBackend>) -> Self {
        Self {
            backend,
            memo: AsyncMemo::new(),
        }
    }

    /// Resolve the summary for a record, cache-or-network.
    pub async fn get(&self, record: &RecordRef) -> Result<Summary, BackendError> {
        let key = record.cache_key();
        self.memo
            .get_or_resolve(&key, || async {
                tracing::debug!("summary cache miss for {}", key);
                self.backend.get_summary(record).await
            })
            .await
    }

    /// Whether a summary is already resolved for this record.
    pub fn is_resolved(&self, record: &RecordRef) -> bool {
        self.memo.is_resolved(&record.cache_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockBackend;

    #[tokio::test]
    async fn test_second_lookup_hits_cache() {
        let backend = Arc::new(MockBackend::new());
        backend.put_summary("task", "42", "Ship the drawer");
        let cache = SummaryCache::new(backend.clone());
        let record = RecordRef::new("task", "42");

        let first = cache.get(&record).await.unwrap();
        let second = cache.get(&record).await.unwrap();
        assert_eq!(first.title.as_deref(), Some("Ship the drawer"));
        assert_eq!(first, second);
        assert_eq!(backend.summary_calls(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_lookups_share_one_request() {
        let backend = Arc::new(MockBackend::new().with_latency_ms(10));
        backend.put_summary("note", "n-1", "Weekly plan");
        let cache = Arc::new(SummaryCache::new(backend.clone()));
        let record = RecordRef::new("note", "n-1");

        let (a, b) = tokio::join!(cache.get(&record), cache.get(&record));
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(backend.summary_calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_lookup_can_retry() {
        let backend = Arc::new(MockBackend::new());
        let cache = SummaryCache::new(backend.clone());
        let record = RecordRef::new("task", "missing");

        assert!(cache.get(&record).await.is_err());
        assert!(!cache.is_resolved(&record));

        backend.put_summary("task", "missing", "Found it");
        assert!(cache.get(&record).await.is_ok());
        assert!(cache.is_resolved(&record));
    }
}
