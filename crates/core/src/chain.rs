//! Rules for mutating an approver chain while its request is pending.
//!
//! Only steps that are still `pending` *and* sit after the active step may be
//! reordered or deleted. Orders are kept dense (`0..n-1`); [`dense_orders`]
//! computes the healing plan used after every structural change.

use std::collections::HashSet;

use crate::approval::{ApprovalStatus, WorkflowError};
use crate::identity::fold_key;
use crate::types::DbId;

/// Offset added to reorderable steps before they receive their final order,
/// keeping the intermediate state clear of `uq_approval_steps_order`.
pub const REORDER_BAND: i32 = 1_000_000;

/// How many times a reorder is retried after renumbering on a uniqueness
/// violation.
pub const REORDER_MAX_RETRIES: u32 = 1;

/// The fields of a step that chain rules look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPosition {
    pub id: DbId,
    pub step_order: i32,
    pub status: ApprovalStatus,
}

impl StepPosition {
    /// Not yet reached and not yet decided.
    pub fn is_mutable(&self, current_step: i32) -> bool {
        self.status == ApprovalStatus::Pending && self.step_order > current_step
    }
}

/// Ids of steps that may be reordered, in their current order.
pub fn reorderable_ids(steps: &[StepPosition], current_step: i32) -> Vec<DbId> {
    let mut eligible: Vec<&StepPosition> =
        steps.iter().filter(|s| s.is_mutable(current_step)).collect();
    eligible.sort_by_key(|s| (s.step_order, s.id));
    eligible.into_iter().map(|s| s.id).collect()
}

/// Check that `supplied` names exactly the eligible steps, each once.
///
/// Order of `supplied` is the requested new order and is not compared.
pub fn validate_reorder(eligible: &[DbId], supplied: &[DbId]) -> Result<(), WorkflowError> {
    let mut a = eligible.to_vec();
    let mut b = supplied.to_vec();
    a.sort_unstable();
    b.sort_unstable();
    if a == b {
        Ok(())
    } else {
        Err(WorkflowError::InvalidIds)
    }
}

/// Assign `current_step + 1, current_step + 2, ...` in the supplied order.
pub fn reorder_plan(current_step: i32, ordered_ids: &[DbId]) -> Vec<(DbId, i32)> {
    ordered_ids
        .iter()
        .zip((current_step + 1)..)
        .map(|(&id, order)| (id, order))
        .collect()
}

/// Order for a step appended to the end of the chain.
pub fn next_order(steps: &[StepPosition]) -> i32 {
    steps
        .iter()
        .map(|s| s.step_order)
        .max()
        .map_or(0, |max| max + 1)
}

/// Dense `0..n-1` orders by `(step_order, id)`; returns `(id, new_order)`
/// for every step. Applying the plan twice yields the same mapping.
pub fn dense_orders(steps: &[StepPosition]) -> Vec<(DbId, i32)> {
    let mut sorted: Vec<&StepPosition> = steps.iter().collect();
    sorted.sort_by_key(|s| (s.step_order, s.id));
    sorted
        .into_iter()
        .zip(0..)
        .map(|(s, order)| (s.id, order))
        .collect()
}

/// Whether `candidate` duplicates any existing approver name (folded).
pub fn is_duplicate_name<'a>(
    existing: impl IntoIterator<Item = &'a str>,
    candidate: &str,
) -> bool {
    let names: HashSet<String> = existing.into_iter().map(fold_key).collect();
    names.contains(&fold_key(candidate))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn step(id: DbId, step_order: i32, status: ApprovalStatus) -> StepPosition {
        StepPosition {
            id,
            step_order,
            status,
        }
    }

    fn chain() -> Vec<StepPosition> {
        vec![
            step(10, 0, ApprovalStatus::Approved),
            step(11, 1, ApprovalStatus::Pending),
            step(12, 2, ApprovalStatus::Pending),
            step(13, 3, ApprovalStatus::Pending),
        ]
    }

    #[test]
    fn only_steps_after_the_active_one_are_reorderable() {
        assert_eq!(reorderable_ids(&chain(), 1), vec![12, 13]);
        assert_eq!(reorderable_ids(&chain(), 3), Vec::<DbId>::new());
    }

    #[test]
    fn reorder_accepts_any_permutation_of_eligible_ids() {
        assert!(validate_reorder(&[12, 13], &[13, 12]).is_ok());
        assert!(validate_reorder(&[], &[]).is_ok());
    }

    #[test]
    fn reorder_rejects_decided_or_active_steps() {
        // 11 is the active step, 10 already approved.
        assert_matches!(validate_reorder(&[12, 13], &[11, 12, 13]), Err(WorkflowError::InvalidIds));
        assert_matches!(validate_reorder(&[12, 13], &[10, 13]), Err(WorkflowError::InvalidIds));
    }

    #[test]
    fn reorder_rejects_duplicates_and_omissions() {
        assert_matches!(validate_reorder(&[12, 13], &[12, 12]), Err(WorkflowError::InvalidIds));
        assert_matches!(validate_reorder(&[12, 13], &[12]), Err(WorkflowError::InvalidIds));
    }

    #[test]
    fn reorder_plan_starts_after_current_step() {
        assert_eq!(reorder_plan(1, &[13, 12]), vec![(13, 2), (12, 3)]);
    }

    #[test]
    fn next_order_appends_after_max() {
        assert_eq!(next_order(&chain()), 4);
        assert_eq!(next_order(&[]), 0);
    }

    #[test]
    fn dense_orders_heal_duplicates_and_gaps() {
        let broken = vec![
            step(5, 3, ApprovalStatus::Pending),
            step(2, 0, ApprovalStatus::Approved),
            step(4, 3, ApprovalStatus::Pending),
            step(9, 7, ApprovalStatus::Pending),
        ];
        assert_eq!(dense_orders(&broken), vec![(2, 0), (4, 1), (5, 2), (9, 3)]);
    }

    #[test]
    fn dense_orders_is_idempotent() {
        let broken = vec![
            step(1, 4, ApprovalStatus::Pending),
            step(2, 4, ApprovalStatus::Pending),
            step(3, 0, ApprovalStatus::Pending),
        ];
        let once = dense_orders(&broken);
        let applied: Vec<StepPosition> = once
            .iter()
            .map(|&(id, order)| step(id, order, ApprovalStatus::Pending))
            .collect();
        assert_eq!(dense_orders(&applied), once);
    }

    #[test]
    fn duplicate_names_ignore_case_and_spacing() {
        let existing = ["Alice", "Samuel  Huang"];
        assert!(is_duplicate_name(existing, "  alice "));
        assert!(is_duplicate_name(existing, "samuel huang"));
        assert!(!is_duplicate_name(existing, "Bob"));
    }
}
