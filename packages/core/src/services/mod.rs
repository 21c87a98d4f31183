//! Link Engine Services
//!
//! This module contains the client-side services of the link engine:
//!
//! - `DrawerController` - Drawer state machine, loads, keyboard, width
//! - `LinkCollection` - Loaded link set, grouped by type for rendering
//! - `RowRenderer` - Row view models with independent hydration
//! - `LinkMutator` - Optimistic mutation protocol and its notifications
//! - `ReorderEngine` - Same-group drag reorder
//! - `LinkPicker` - Modal search-and-pick sessions (single and bulk)
//! - `MentionEngine` - Editor @mention detection, tokens, background links
//! - `Notifier` - Toast/undo broadcast channel
//! - `SummaryCache` / `TypeResolutionCache` - Session caches with in-flight
//!   request de-duplication
//!
//! Services coordinate between the backend layer and view state,
//! implementing the engine's concurrency and rollback rules.

pub mod collection;
pub mod drawer;
pub mod error;
pub mod memo;
pub mod mentions;
pub mod mutation;
pub mod notify;
pub mod picker;
pub mod renderer;
pub mod reorder;
pub mod summary_cache;
pub mod type_resolution;

pub use collection::{far_end, Direction, LinkCollection, LinkGroup};
pub use drawer::{
    clamp_width, requested_direction, with_direction_param, DrawerController, DrawerKey,
    DrawerState, DrawerWidth, KeyChord, KeyOutcome, DRAWER_WIDTH_MAX, DRAWER_WIDTH_MIN,
    DRAWER_WIDTH_SETTING,
};
pub use error::LinkServiceError;
pub use memo::AsyncMemo;
pub use mentions::{
    find_mention_range, splice_token, MentionEngine, MentionInsert, MentionRange, SUGGEST_LIMIT,
};
pub use mutation::{LinkMutator, ReloadHandle};
pub use notify::{
    Notifier, Severity, Toast, ToastAction, TypeChangeFn, TypeControl, TOAST_DISMISS_AFTER,
};
pub use picker::{
    LinkPicker, PickerGroup, PickerMode, PickerRow, PickerSession, SEARCH_DEBOUNCE, SEARCH_LIMIT,
};
pub use renderer::{DrawerView, GroupView, RowRenderer, RowView, TitleState, TypeOptionsState};
pub use reorder::{move_before, sort_assignments, DragPayload, ReorderEngine, SORT_ORDER_STEP};
pub use summary_cache::SummaryCache;
pub use type_resolution::TypeResolutionCache;
