//! Handlers for `/admin`: maintenance operations.
//!
//! All handlers require the `admin` role via [`RequireAdmin`].

use axum::extract::State;
use axum::Json;

use crate::engine::chain::{self, RenumberReport};
use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/admin/approvals/renumber
///
/// Heal every chain to dense step orders. Safe to run repeatedly.
pub async fn renumber_approvals(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<RenumberReport>>> {
    tracing::info!(admin = %admin.loginname, "Renumbering all approval chains");
    let data = chain::renumber_all(&state.pool).await?;
    Ok(Json(DataResponse { data }))
}
