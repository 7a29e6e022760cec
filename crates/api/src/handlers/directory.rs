//! Handlers for `/directory`: the approver picker.

use axum::extract::{Query, State};
use axum::Json;
use portal_core::search::{clamp_limit, contains_pattern};
use portal_db::models::employee::Employee;
use portal_db::repositories::EmployeeRepo;

use crate::error::AppResult;
use crate::middleware::rbac::RequireApprovals;
use crate::query::{DepartmentParams, DirectorySearchParams};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/directory/departments
pub async fn departments(
    RequireApprovals(_auth): RequireApprovals,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<String>>>> {
    let data = EmployeeRepo::list_departments(&state.pool).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/directory/approvers?dept=
///
/// Picker labels (`"English Local"`) for everyone in a department.
pub async fn approvers(
    RequireApprovals(_auth): RequireApprovals,
    State(state): State<AppState>,
    Query(params): Query<DepartmentParams>,
) -> AppResult<Json<DataResponse<Vec<String>>>> {
    let dept = params.dept.trim();
    let data = if dept.is_empty() {
        Vec::new()
    } else {
        EmployeeRepo::names_by_department(&state.pool, dept).await?
    };
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/directory/search?q=&limit=
pub async fn search(
    RequireApprovals(_auth): RequireApprovals,
    State(state): State<AppState>,
    Query(params): Query<DirectorySearchParams>,
) -> AppResult<Json<DataResponse<Vec<Employee>>>> {
    let data = match contains_pattern(&params.q) {
        Some(pattern) => {
            EmployeeRepo::search(&state.pool, &pattern, clamp_limit(params.limit)).await?
        }
        None => Vec::new(),
    };
    Ok(Json(DataResponse { data }))
}
