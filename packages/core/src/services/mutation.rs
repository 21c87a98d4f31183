//! Optimistic Mutation Protocol
//!
//! Every link mutation — create, update, delete, bulk-create — funnels
//! through [`LinkMutator`]: one backend call, one notification, and a reload
//! request when the visible list needs refreshing. There is no retry policy:
//! a failed mutation is terminal for that attempt.
//!
//! Rollback depth is deliberately uneven and must stay that way:
//!
//! - a failed **type change** reverts by re-rendering from the last
//!   known-good value (the authoritative value was never mutated early)
//! - a **delete** is optimistic (row already gone); its Undo re-creates an
//!   equivalent link rather than resurrecting the old id, and a failed
//!   delete does *not* restore the row
//!
//! Duplicate detection is a distinguished success, never an error.

use crate::backend::{BackendError, BulkResult, CreateResult, LinkBackend};
use crate::models::{CreateLinkPayload, Link, LinkPatch, LinkTypeKey};
use crate::services::notify::{Notifier, Toast};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Requests a drawer list reload after a mutation. Cheap to clone; undo
/// closures carry one.
#[derive(Clone)]
pub struct ReloadHandle {
    tx: mpsc::UnboundedSender<()>,
}

impl ReloadHandle {
    /// Create a handle and the receiver the drawer drains.
    pub fn channel() -> (ReloadHandle, mpsc::UnboundedReceiver<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ReloadHandle { tx }, rx)
    }

    pub fn request(&self) {
        // Drawer gone (navigation) is fine; the request is moot.
        let _ = self.tx.send(());
    }
}

/// Shared mutation front for the drawer, picker, reorder and mention flows.
#[derive(Clone)]
pub struct LinkMutator {
    backend: Arc<dyn LinkBackend>,
    notifier: Notifier,
    reload: ReloadHandle,
}

impl LinkMutator {
    pub fn new(backend: Arc<dyn LinkBackend>, notifier: Notifier, reload: ReloadHandle) -> Self {
        Self {
            backend,
            notifier,
            reload,
        }
    }

    pub fn backend(&self) -> &Arc<dyn LinkBackend> {
        &self.backend
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn reload_handle(&self) -> &ReloadHandle {
        &self.reload
    }

    /// Create one link without any notification. Callers that build richer
    /// toasts (picker confirm, mention insert) start here.
    pub async fn create_silent(
        &self,
        payload: &CreateLinkPayload,
    ) -> Result<CreateResult, BackendError> {
        self.backend.create_link(payload).await
    }

    /// Create one link with the standard notifications: duplicate is an
    /// informational outcome, success requests a reload, failure notifies
    /// and leaves local state alone.
    pub async fn create(
        &self,
        payload: &CreateLinkPayload,
        display: &str,
    ) -> Result<CreateResult, BackendError> {
        let type_label = LinkTypeKey::from_wire(&payload.link_type).label().to_string();
        match self.create_silent(payload).await {
            Ok(result) => {
                if result.duplicate {
                    self.notifier.info(format!("Already linked ({type_label})."));
                } else {
                    self.notifier.info(format!("Linked {display} ({type_label})."));
                    self.reload.request();
                }
                Ok(result)
            }
            Err(e) => {
                tracing::warn!("link create failed: {}", e);
                self.notifier.error("Couldn't create link.");
                Err(e)
            }
        }
    }

    /// Change a link's type. The caller has already re-rendered with the new
    /// type; on failure it re-renders from the last known-good value while
    /// this method notifies.
    pub async fn update_type(&self, link_id: i64, new_type: &str) -> Result<(), BackendError> {
        let patch = LinkPatch::link_type(new_type);
        match self.backend.update_link(link_id, &patch).await {
            Ok(()) => {
                let label = LinkTypeKey::from_wire(new_type).label().to_string();
                self.notifier.info(format!("Updated link type to {label}"));
                Ok(())
            }
            Err(e) => {
                tracing::warn!("link type update failed for {}: {}", link_id, e);
                self.notifier.error("Couldn't update link type.");
                Err(e)
            }
        }
    }

    /// Commit a label edit (on field blur, not per keystroke).
    pub async fn update_label(&self, link_id: i64, label: &str) -> Result<(), BackendError> {
        let patch = LinkPatch::label(label);
        match self.backend.update_link(link_id, &patch).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!("link label update failed for {}: {}", link_id, e);
                self.notifier.error("Couldn't update link label.");
                Err(e)
            }
        }
    }

    /// Delete a link the caller has already removed from view. Success emits
    /// a toast whose Undo re-creates an equivalent edge and reloads; failure
    /// notifies without restoring the removed row.
    pub async fn delete(&self, link: &Link, display: &str) -> Result<(), BackendError> {
        match self.backend.delete_link(link.link_id).await {
            Ok(()) => {
                let backend = self.backend.clone();
                let reload = self.reload.clone();
                let payload = CreateLinkPayload::equivalent_to(link);
                let toast = Toast::info(format!("Unlinked {display}")).with_undo(Arc::new(
                    move || {
                        let backend = backend.clone();
                        let reload = reload.clone();
                        let payload = payload.clone();
                        Box::pin(async move {
                            if let Err(e) = backend.create_link(&payload).await {
                                tracing::warn!("undo re-create failed: {}", e);
                            }
                            reload.request();
                        })
                    },
                ));
                self.notifier.push(toast);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("link delete failed for {}: {}", link.link_id, e);
                self.notifier.error("Couldn't unlink item.");
                Err(e)
            }
        }
    }

    /// Create many links in one call with a single summary notification:
    /// count already-duplicate when any, otherwise count linked.
    pub async fn bulk_create(
        &self,
        items: &[CreateLinkPayload],
    ) -> Result<BulkResult, BackendError> {
        match self.backend.bulk_create(items).await {
            Ok(result) => {
                let dupes = result.duplicates();
                if dupes > 0 {
                    self.notifier.info(format!("Already linked {dupes} item(s)."));
                } else {
                    self.notifier.info(format!("Linked {} item(s).", items.len()));
                }
                self.reload.request();
                Ok(result)
            }
            Err(e) => {
                tracing::warn!("bulk link create failed: {}", e);
                self.notifier.error("Couldn't create link.");
                Err(e)
            }
        }
    }

    /// Persist a reorder batch: one PATCH per `(link_id, sort_order)` pair.
    /// The batch succeeds only if every PATCH succeeds; one failure
    /// notification covers the whole batch, with no partial-success
    /// granularity.
    pub async fn apply_reorder(&self, assignments: &[(i64, i64)]) -> Result<(), BackendError> {
        let mut failure: Option<BackendError> = None;
        for (link_id, sort_order) in assignments {
            let patch = LinkPatch::sort_order(*sort_order);
            if let Err(e) = self.backend.update_link(*link_id, &patch).await {
                tracing::warn!("sort order update failed for {}: {}", link_id, e);
                failure.get_or_insert(e);
            }
        }
        match failure {
            Some(e) => {
                self.notifier.error("Couldn't update link order.");
                Err(e)
            }
            None => Ok(()),
        }
    }
}
