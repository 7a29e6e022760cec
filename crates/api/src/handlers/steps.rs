//! Handlers for `/approvals/{id}/steps`: chain edits on a pending request.
//!
//! Each returns the full chain after the change.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use portal_core::types::DbId;
use portal_db::models::approval::ApprovalStep;
use serde::Deserialize;

use crate::engine::{chain, Actor};
use crate::error::AppResult;
use crate::middleware::rbac::RequireApprovals;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /approvals/{id}/steps`.
#[derive(Debug, Deserialize)]
pub struct AppendStepRequest {
    pub display_name: String,
}

/// Request body for `POST /approvals/{id}/steps/reorder`.
#[derive(Debug, Deserialize)]
pub struct ReorderStepsRequest {
    /// Every undecided step after the active one, in the new order.
    pub step_ids: Vec<DbId>,
}

/// POST /api/v1/approvals/{id}/steps
pub async fn append(
    RequireApprovals(auth): RequireApprovals,
    State(state): State<AppState>,
    Path(approval_id): Path<DbId>,
    Json(input): Json<AppendStepRequest>,
) -> AppResult<impl IntoResponse> {
    let actor = Actor::load(&state.pool, &auth).await;
    let steps = chain::append_step(&state, &actor, approval_id, &input.display_name).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: steps })))
}

/// DELETE /api/v1/approvals/{id}/steps/{step_id}
pub async fn delete(
    RequireApprovals(auth): RequireApprovals,
    State(state): State<AppState>,
    Path((approval_id, step_id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<Vec<ApprovalStep>>>> {
    let actor = Actor::load(&state.pool, &auth).await;
    let data = chain::delete_step(&state, &actor, approval_id, step_id).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/approvals/{id}/steps/reorder
pub async fn reorder(
    RequireApprovals(auth): RequireApprovals,
    State(state): State<AppState>,
    Path(approval_id): Path<DbId>,
    Json(input): Json<ReorderStepsRequest>,
) -> AppResult<Json<DataResponse<Vec<ApprovalStep>>>> {
    let actor = Actor::load(&state.pool, &auth).await;
    let data = chain::reorder_steps(&state, &actor, approval_id, &input.step_ids).await?;
    Ok(Json(DataResponse { data }))
}
