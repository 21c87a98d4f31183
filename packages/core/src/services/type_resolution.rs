//! Type-Resolution Cache
//!
//! Memoizes "which link types may connect kind A to kind B" lookups. The
//! backend's resolver owns the policy; this cache only remembers its answers
//! for the session.
//!
//! Keys are partitioned by context (`"{context}:{src}:{dst}"`). The pair
//! alone is not enough: the resolver's suggested default depends on the
//! context a mutation originates from, so two contexts must never share an
//! entry.

use crate::backend::{BackendError, LinkBackend, ResolvedTypes};
use crate::services::memo::AsyncMemo;
use std::collections::HashMap;
use std::sync::Arc;

fn pair_key(context_type: &str, src_type: &str, dst_type: &str) -> String {
    format!("{context_type}:{src_type}:{dst_type}")
}

/// Session-wide allowed-type cache with in-flight request de-duplication.
pub struct TypeResolutionCache {
    backend: Arc<dyn LinkBackend>,
    memo: AsyncMemo<ResolvedTypes>,
}

impl TypeResolutionCache {
    pub fn new(backend: Arc<dyn LinkBackend>) -> Self {
        Self {
            backend,
            memo: AsyncMemo::new(),
        }
    }

    /// Allowed types and default for one ordered pair in one context.
    pub async fn get(
        &self,
        context_type: &str,
        src_type: &str,
        dst_type: &str,
    ) -> Result<ResolvedTypes, BackendError> {
        let key = pair_key(context_type, src_type, dst_type);
        self.memo
            .get_or_resolve(&key, || async {
                tracing::debug!("type resolution cache miss for {}", key);
                let dst_types = vec![dst_type.to_string()];
                let mut resolved = self
                    .backend
                    .resolve_types(context_type, src_type, &dst_types)
                    .await?;
                resolved.remove(dst_type).ok_or_else(|| {
                    BackendError::invalid_response(format!(
                        "resolve response missing dst_type {dst_type}"
                    ))
                })
            })
            .await
    }

    /// Resolve several destination types in one backend call (picker path),
    /// priming the per-pair entries so row hydration hits the cache.
    ///
    /// Already-resolved pairs are served from cache and excluded from the
    /// batch request.
    pub async fn resolve_many(
        &self,
        context_type: &str,
        src_type: &str,
        dst_types: &[String],
    ) -> Result<HashMap<String, ResolvedTypes>, BackendError> {
        let mut out = HashMap::new();
        let mut missing: Vec<String> = Vec::new();
        for dst_type in dst_types {
            if out.contains_key(dst_type) || missing.contains(dst_type) {
                continue;
            }
            if self.memo.is_resolved(&pair_key(context_type, src_type, dst_type)) {
                let cached = self.get(context_type, src_type, dst_type).await?;
                out.insert(dst_type.clone(), cached);
            } else {
                missing.push(dst_type.clone());
            }
        }

        if !missing.is_empty() {
            let resolved = self
                .backend
                .resolve_types(context_type, src_type, &missing)
                .await?;
            for dst_type in &missing {
                let entry = resolved.get(dst_type).cloned().unwrap_or_default();
                let key = pair_key(context_type, src_type, dst_type);
                let primed = entry.clone();
                // Prime the per-pair cell; if a concurrent caller beat us to
                // it the existing value wins.
                let _ = self
                    .memo
                    .get_or_resolve(&key, || async { Ok::<_, BackendError>(primed) })
                    .await;
                out.insert(dst_type.clone(), entry);
            }
        }
        Ok(out)
    }

    /// Whether the pair is already resolved under this context.
    pub fn is_resolved(&self, context_type: &str, src_type: &str, dst_type: &str) -> bool {
        self.memo
            .is_resolved(&pair_key(context_type, src_type, dst_type))
    }
}
