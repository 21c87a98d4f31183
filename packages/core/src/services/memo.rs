//! Memoized Asynchronous Lookup
//!
//! A map from a composite string key to a shared pending-or-resolved
//! computation. Concurrent callers for the same key share one in-flight
//! request (request de-duplication); later callers get the cached value with
//! no network call. Entries are never evicted for the life of the session —
//! staleness is an accepted trade-off.
//!
//! A failed computation is not cached: the next caller retries.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;

/// Session-lifetime memoization of async lookups.
pub struct AsyncMemo<V> {
    entries: Mutex<HashMap<String, Arc<OnceCell<V>>>>,
}

impl<V: Clone> AsyncMemo<V> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached value for `key`, or run `resolve` to produce it.
    ///
    /// Exactly one resolver runs per key no matter how many callers arrive
    /// concurrently; the rest await the same cell.
    pub async fn get_or_resolve<F, Fut, E>(&self, key: &str, resolve: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let cell = {
            let mut entries = self.entries.lock().expect("memo lock");
            entries
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };
        cell.get_or_try_init(resolve).await.map(|value| value.clone())
    }

    /// Whether a resolved value exists for `key`.
    pub fn is_resolved(&self, key: &str) -> bool {
        self.entries
            .lock()
            .expect("memo lock")
            .get(key)
            .map(|cell| cell.initialized())
            .unwrap_or(false)
    }

    /// Number of keys seen (resolved or in flight).
    pub fn len(&self) -> usize {
        self.entries.lock().expect("memo lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Clone> Default for AsyncMemo<V> {
    fn default() -> Self {
        Self::new()
    }
}
