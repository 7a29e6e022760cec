//! Handlers for `/approvals/{id}/versions`.

use axum::extract::{Path, State};
use axum::Json;
use portal_core::error::CoreError;
use portal_core::types::DbId;
use portal_db::models::approval::{ApprovalVersion, ApprovalVersionSummary};
use portal_db::repositories::ApprovalVersionRepo;

use crate::engine::access::{load_viewable, may_read_confidential};
use crate::engine::{snapshot, Actor};
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireApprovals;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/approvals/{id}/versions
///
/// Version history, newest first, without snapshot bodies.
pub async fn list(
    RequireApprovals(auth): RequireApprovals,
    State(state): State<AppState>,
    Path(approval_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<ApprovalVersionSummary>>>> {
    let actor = Actor::load(&state.pool, &auth).await;
    load_viewable(&state.pool, &actor, approval_id).await?;
    let data = ApprovalVersionRepo::list_for_approval(&state.pool, approval_id).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/approvals/{id}/versions/{version}
pub async fn get(
    RequireApprovals(auth): RequireApprovals,
    State(state): State<AppState>,
    Path((approval_id, version)): Path<(DbId, i32)>,
) -> AppResult<Json<DataResponse<ApprovalVersion>>> {
    let actor = Actor::load(&state.pool, &auth).await;
    let (approval, steps) = load_viewable(&state.pool, &actor, approval_id).await?;

    let mut data = ApprovalVersionRepo::find(&state.pool, approval_id, version)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "ApprovalVersion",
                id: version.into(),
            })
        })?;
    if !may_read_confidential(&actor, &approval, &steps) {
        snapshot::redact(&mut data.snapshot);
    }
    Ok(Json(DataResponse { data }))
}
