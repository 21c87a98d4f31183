//! Drag-Reorder Engine
//!
//! Two draggable payload kinds share the drop surface, distinguished by the
//! transfer marker: external record references dropped on a type-group
//! header (routed to bulk-create by the drawer), and an existing link row
//! reordered within its own group.
//!
//! A same-group reorder reassigns every row in the group
//! `sort_order = (index + 1) * 10` top to bottom and issues one PATCH per
//! row; the batch is all-or-nothing from the notification's point of view.

use crate::models::RecordRef;
use crate::services::error::LinkServiceError;
use crate::services::mutation::LinkMutator;

/// Spacing between persisted sort order values after a reorder.
pub const SORT_ORDER_STEP: i64 = 10;

/// A drag payload, as decoded from the transfer-data marker.
#[derive(Debug, Clone, PartialEq)]
pub enum DragPayload {
    /// External records dragged from a list, dropped on a group header
    Records(Vec<RecordRef>),
    /// An existing link row being reordered
    Row { link_id: i64 },
}

/// Move `moved` directly before `before` within a group's row order
/// (`None` = move to the end). Both ids must belong to the order; a drop
/// whose source or target is outside the list is rejected, which is what
/// makes cross-group reorders impossible.
pub fn move_before(
    order: &[i64],
    moved: i64,
    before: Option<i64>,
) -> Result<Vec<i64>, LinkServiceError> {
    if !order.contains(&moved) {
        return Err(LinkServiceError::reorder_rejected(format!(
            "link {moved} is not in the target group"
        )));
    }
    if let Some(before_id) = before {
        if !order.contains(&before_id) {
            return Err(LinkServiceError::reorder_rejected(format!(
                "drop target {before_id} is not in the source group"
            )));
        }
        if before_id == moved {
            return Ok(order.to_vec());
        }
    }

    let mut next: Vec<i64> = order.iter().copied().filter(|id| *id != moved).collect();
    match before {
        Some(before_id) => {
            let idx = next.iter().position(|id| *id == before_id).expect("checked above");
            next.insert(idx, moved);
        }
        None => next.push(moved),
    }
    Ok(next)
}

/// Persisted sort orders for a group's new visual order:
/// `{10, 20, ..., 10N}` top to bottom.
pub fn sort_assignments(order: &[i64]) -> Vec<(i64, i64)> {
    order
        .iter()
        .enumerate()
        .map(|(idx, link_id)| (*link_id, (idx as i64 + 1) * SORT_ORDER_STEP))
        .collect()
}

/// Applies same-group reorders through the mutation protocol.
#[derive(Clone)]
pub struct ReorderEngine {
    mutator: LinkMutator,
}

impl ReorderEngine {
    pub fn new(mutator: LinkMutator) -> Self {
        Self { mutator }
    }

    /// Reorder `moved` before `before` within `group_order` and persist the
    /// whole group's sort orders. Returns the committed assignments so the
    /// caller can update local state and re-render.
    pub async fn reorder_row(
        &self,
        group_order: &[i64],
        moved: i64,
        before: Option<i64>,
    ) -> Result<Vec<(i64, i64)>, LinkServiceError> {
        let next = move_before(group_order, moved, before)?;
        let assignments = sort_assignments(&next);
        self.mutator.apply_reorder(&assignments).await?;
        Ok(assignments)
    }
}
