//! Toast / Undo Notifier
//!
//! Ephemeral feedback channel built on a broadcast channel, the same shape
//! the domain-event bus takes elsewhere in the stack. Every mutation outcome
//! funnels through here: successes, failures, duplicate notices.
//!
//! A toast may carry an undo action (a compensating async closure) and an
//! inline type-change control. Auto-dismiss is the consumer's concern; the
//! toast records a `dismiss_after` hint.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Broadcast capacity for toasts. Mutations are user-paced, so a small
/// buffer is plenty; lagging consumers only lose stale toasts.
const TOAST_CHANNEL_CAPACITY: usize = 32;

/// How long a toast stays visible before fading.
pub const TOAST_DISMISS_AFTER: Duration = Duration::from_secs(6);

/// Compensating action attached to a toast (e.g. re-create a deleted link).
pub type ToastAction = Arc<dyn Fn() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Handler for the inline type-change control on a create toast.
pub type TypeChangeFn =
    Arc<dyn Fn(String) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

/// Inline type selector rendered inside a toast.
#[derive(Clone)]
pub struct TypeControl {
    pub options: Vec<String>,
    pub current: String,
    pub on_change: TypeChangeFn,
}

/// One ephemeral notification.
#[derive(Clone)]
pub struct Toast {
    pub message: String,
    pub severity: Severity,
    pub undo: Option<ToastAction>,
    pub type_control: Option<TypeControl>,
    pub dismiss_after: Duration,
}

impl Toast {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Info,
            undo: None,
            type_control: None,
            dismiss_after: TOAST_DISMISS_AFTER,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            ..Self::info(message)
        }
    }

    pub fn with_undo(mut self, undo: ToastAction) -> Self {
        self.undo = Some(undo);
        self
    }

    pub fn with_type_control(
        mut self,
        options: Vec<String>,
        current: impl Into<String>,
        on_change: TypeChangeFn,
    ) -> Self {
        self.type_control = Some(TypeControl {
            options,
            current: current.into(),
            on_change,
        });
        self
    }

    /// Run the undo action, if any. Returns whether one existed.
    pub async fn run_undo(&self) -> bool {
        match &self.undo {
            Some(action) => {
                action().await;
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for Toast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Toast")
            .field("message", &self.message)
            .field("severity", &self.severity)
            .field("has_undo", &self.undo.is_some())
            .field("has_type_control", &self.type_control.is_some())
            .finish()
    }
}

/// Broadcast sender for toasts. Cheap to clone; every service holds one.
#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Toast>,
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(TOAST_CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Subscribe to the toast stream. Each subscriber sees every toast
    /// emitted after the subscription.
    pub fn subscribe(&self) -> broadcast::Receiver<Toast> {
        self.tx.subscribe()
    }

    pub fn push(&self, toast: Toast) {
        // No subscribers is fine: toasts are fire-and-forget.
        let _ = self.tx.send(toast);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(Toast::info(message));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(Toast::error(message));
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}
