//! Approver chain mutations on a pending request.
//!
//! Every mutation ends with [`renumber`], so step orders stay dense and the
//! request's `current_step` keeps pointing at the step that was active.

use portal_core::approval::{ActionKind, WorkflowError};
use portal_core::chain::{
    dense_orders, is_duplicate_name, next_order, reorder_plan, reorderable_ids, validate_reorder,
    StepPosition, REORDER_BAND, REORDER_MAX_RETRIES,
};
use portal_core::error::CoreError;
use portal_core::identity::resolve_approver;
use portal_core::types::DbId;
use portal_db::models::approval::{Approval, ApprovalStep};
use portal_db::repositories::{ApprovalActionRepo, ApprovalRepo, ApprovalStepRepo};
use portal_db::{is_unique_violation, Tx};
use serde::Serialize;
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

use super::access::{approval_not_found, lock_for_change};
use super::{directory, Actor};

const ORDER_CONSTRAINT: &str = "uq_approval_steps_order";

/// Rewrite step orders to `0..n-1` and re-point `current_step`.
///
/// Returns how many steps moved. Running it again on the result is a no-op.
pub async fn renumber(tx: &mut Tx<'_>, approval: &Approval) -> Result<usize, sqlx::Error> {
    let steps = ApprovalStepRepo::list_for_approval(&mut **tx, approval.id).await?;
    let positions: Vec<StepPosition> = steps.iter().map(ApprovalStep::position).collect();
    let plan = dense_orders(&positions);

    let moved: Vec<(DbId, i32)> = plan
        .iter()
        .copied()
        .filter(|&(id, order)| positions.iter().any(|p| p.id == id && p.step_order != order))
        .collect();
    if !moved.is_empty() {
        // Park the moving steps out of the way before assigning final orders.
        let ids: Vec<DbId> = moved.iter().map(|&(id, _)| id).collect();
        ApprovalStepRepo::shift_orders(tx, approval.id, &ids, REORDER_BAND).await?;
        ApprovalStepRepo::apply_orders(tx, approval.id, &moved).await?;
    }

    if approval.is_pending() {
        if let Some(current) = repointed_step(&positions, &plan, approval.current_step) {
            if current != approval.current_step {
                ApprovalRepo::set_current_step(tx, approval.id, current).await?;
            }
        }
    }

    if !moved.is_empty() {
        tracing::info!(approval_id = approval.id, moved = moved.len(), "Renumbered approval steps");
    }
    Ok(moved.len())
}

/// New order of the step that was active under `current_step`.
///
/// Falls back to the first pending step at or after the old pointer when the
/// pointer names no pending step.
fn repointed_step(
    before: &[StepPosition],
    plan: &[(DbId, i32)],
    current_step: i32,
) -> Option<i32> {
    let mut pending: Vec<&StepPosition> = before
        .iter()
        .filter(|p| p.status == portal_core::approval::ApprovalStatus::Pending)
        .filter(|p| p.step_order >= current_step)
        .collect();
    pending.sort_by_key(|p| (p.step_order, p.id));
    let active = pending.first()?;
    plan.iter()
        .find(|(id, _)| *id == active.id)
        .map(|&(_, order)| order)
}

async fn chain_of(tx: &mut Tx<'_>, approval_id: DbId) -> Result<Vec<ApprovalStep>, sqlx::Error> {
    ApprovalStepRepo::list_for_approval(&mut **tx, approval_id).await
}

/// Append an approver at the end of the chain.
pub async fn append_step(
    state: &AppState,
    actor: &Actor,
    approval_id: DbId,
    display_name: &str,
) -> AppResult<Vec<ApprovalStep>> {
    if display_name.trim().is_empty() {
        return Err(WorkflowError::InvalidDisplayName.into());
    }
    let entries = directory::load(&state.pool).await;
    let resolved = resolve_approver(&entries, display_name);

    let mut tx = state.pool.begin().await?;
    let approval = lock_for_change(&mut tx, actor, approval_id).await?;
    let steps = chain_of(&mut tx, approval_id).await?;

    if is_duplicate_name(steps.iter().map(|s| s.approver_name.as_str()), &resolved.name) {
        return Err(WorkflowError::DuplicatedName.into());
    }

    let positions: Vec<StepPosition> = steps.iter().map(ApprovalStep::position).collect();
    let step = ApprovalStepRepo::create(
        &mut tx,
        approval_id,
        next_order(&positions),
        &resolved.name,
        resolved.email.as_deref(),
    )
    .await?;
    ApprovalActionRepo::record(
        &mut tx,
        approval_id,
        Some(step.id),
        &actor.login,
        ActionKind::AddApprover,
        Some(&resolved.name),
    )
    .await?;
    renumber(&mut tx, &approval).await?;
    let chain = chain_of(&mut tx, approval_id).await?;
    tx.commit().await?;

    tracing::info!(approval_id, approver = %resolved.name, "Approver appended");
    Ok(chain)
}

/// Delete an undecided step after the active one.
pub async fn delete_step(
    state: &AppState,
    actor: &Actor,
    approval_id: DbId,
    step_id: DbId,
) -> AppResult<Vec<ApprovalStep>> {
    let mut tx = state.pool.begin().await?;
    let approval = lock_for_change(&mut tx, actor, approval_id).await?;
    let steps = chain_of(&mut tx, approval_id).await?;

    let step = steps
        .iter()
        .find(|s| s.id == step_id)
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "ApprovalStep",
            id: step_id,
        }))?;
    if !step.position().is_mutable(approval.current_step) {
        return Err(WorkflowError::CannotDeleteStep.into());
    }
    let removed_name = step.approver_name.clone();

    if !ApprovalStepRepo::delete(&mut tx, approval_id, step_id).await? {
        return Err(WorkflowError::CannotDeleteStep.into());
    }
    ApprovalActionRepo::record(
        &mut tx,
        approval_id,
        None,
        &actor.login,
        ActionKind::DeleteStep,
        Some(&removed_name),
    )
    .await?;
    renumber(&mut tx, &approval).await?;
    let chain = chain_of(&mut tx, approval_id).await?;
    tx.commit().await?;

    tracing::info!(approval_id, step_id, approver = %removed_name, "Approval step deleted");
    Ok(chain)
}

/// Reorder the undecided steps after the active one.
///
/// `ordered_ids` must name exactly those steps. A uniqueness violation on
/// step order rolls back, heals the chain in a separate transaction, and
/// retries; a repeat failure is `renumber_conflict`.
pub async fn reorder_steps(
    state: &AppState,
    actor: &Actor,
    approval_id: DbId,
    ordered_ids: &[DbId],
) -> AppResult<Vec<ApprovalStep>> {
    let mut retries = 0;
    loop {
        match try_reorder(&state.pool, actor, approval_id, ordered_ids).await {
            Ok(chain) => return Ok(chain),
            Err(AppError::Database(e)) if is_unique_violation(&e, ORDER_CONSTRAINT) => {
                if retries >= REORDER_MAX_RETRIES {
                    tracing::error!(approval_id, "Step order conflict persisted after renumbering");
                    return Err(WorkflowError::RenumberConflict.into());
                }
                retries += 1;
                tracing::warn!(approval_id, attempt = retries, "Step order conflict; renumbering and retrying");
                heal(&state.pool, approval_id).await?;
            }
            Err(e) => return Err(e),
        }
    }
}

async fn try_reorder(
    pool: &PgPool,
    actor: &Actor,
    approval_id: DbId,
    ordered_ids: &[DbId],
) -> AppResult<Vec<ApprovalStep>> {
    let mut tx = pool.begin().await?;
    let approval = lock_for_change(&mut tx, actor, approval_id).await?;
    let steps = chain_of(&mut tx, approval_id).await?;
    let positions: Vec<StepPosition> = steps.iter().map(ApprovalStep::position).collect();

    let eligible = reorderable_ids(&positions, approval.current_step);
    validate_reorder(&eligible, ordered_ids)?;

    if !eligible.is_empty() {
        ApprovalStepRepo::shift_orders(&mut tx, approval_id, &eligible, REORDER_BAND).await?;
        let plan = reorder_plan(approval.current_step, ordered_ids);
        ApprovalStepRepo::apply_orders(&mut tx, approval_id, &plan).await?;
    }

    let note = ordered_ids
        .iter()
        .map(DbId::to_string)
        .collect::<Vec<_>>()
        .join(",");
    ApprovalActionRepo::record(
        &mut tx,
        approval_id,
        None,
        &actor.login,
        ActionKind::ReorderSteps,
        Some(&note),
    )
    .await?;
    let chain = chain_of(&mut tx, approval_id).await?;
    tx.commit().await?;

    tracing::info!(approval_id, order = %note, "Approval steps reordered");
    Ok(chain)
}

/// Renumber one request in its own transaction.
async fn heal(pool: &PgPool, approval_id: DbId) -> AppResult<usize> {
    let mut tx = pool.begin().await?;
    let approval = ApprovalRepo::lock(&mut tx, approval_id)
        .await?
        .ok_or_else(|| approval_not_found(approval_id))?;
    let moved = renumber(&mut tx, &approval).await?;
    tx.commit().await?;
    Ok(moved)
}

/// Outcome of a maintenance renumber over every request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RenumberReport {
    pub approvals: usize,
    pub steps_moved: usize,
}

/// Renumber every request, one transaction each.
pub async fn renumber_all(pool: &PgPool) -> AppResult<RenumberReport> {
    let mut report = RenumberReport::default();
    for id in ApprovalRepo::list_ids(pool).await? {
        report.steps_moved += heal(pool, id).await?;
        report.approvals += 1;
    }
    tracing::info!(
        approvals = report.approvals,
        steps_moved = report.steps_moved,
        "Renumbered all approval chains"
    );
    Ok(report)
}
