//! Handlers for the `/approvals` resource: submission, detail, search, and
//! decisions.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use portal_core::types::DbId;
use portal_db::models::approval::UpdateApproval;

use crate::engine::access::{self, ApprovalDetail};
use crate::engine::search::{self, ApprovalSummary, Inbox};
use crate::engine::workflow::{self, DecisionInput, DecisionOutcome, NewApproval};
use crate::engine::Actor;
use crate::error::AppResult;
use crate::handlers::attachments::{read_multipart, MultipartForm};
use crate::middleware::rbac::RequireApprovals;
use crate::query::{ApprovalSearchParams, LimitParams};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/approvals
///
/// Submit a request from a JSON body. Returns 201 with the new request.
pub async fn create(
    RequireApprovals(auth): RequireApprovals,
    State(state): State<AppState>,
    Json(input): Json<NewApproval>,
) -> AppResult<impl IntoResponse> {
    let actor = Actor::load(&state.pool, &auth).await;
    let approval = workflow::create(&state, &actor, input, Vec::new()).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: approval })))
}

/// Map multipart text fields onto a [`NewApproval`].
///
/// `approver_names` may repeat, and each value may hold one name per line.
fn new_approval_from_form(form: &MultipartForm) -> NewApproval {
    let text = |name: &str| form.text(name).unwrap_or_default().to_string();
    NewApproval {
        subject: text("subject"),
        description: text("description"),
        confidential_note: form.text("confidential_note").map(str::to_string),
        requester_dept: text("requester_dept"),
        approver_names: form
            .all("approver_names")
            .iter()
            .flat_map(|v| v.lines())
            .map(str::to_string)
            .collect(),
        visibility_scope: form.text("visibility_scope").map(str::to_string),
        publish_on_complete: matches!(
            form.text("publish_on_complete").map(str::trim),
            Some("true" | "1" | "on" | "yes")
        ),
    }
}

/// POST /api/v1/approvals/upload
///
/// Submit a request from a multipart form with attached files.
pub async fn create_upload(
    RequireApprovals(auth): RequireApprovals,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let form = read_multipart(multipart).await?;
    let input = new_approval_from_form(&form);
    let actor = Actor::load(&state.pool, &auth).await;
    let approval = workflow::create(&state, &actor, input, form.files).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: approval })))
}

/// GET /api/v1/approvals/inbox
///
/// Requests waiting on the caller, and requests the caller submitted.
pub async fn inbox(
    RequireApprovals(auth): RequireApprovals,
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> AppResult<Json<DataResponse<Inbox>>> {
    let actor = Actor::load(&state.pool, &auth).await;
    let data = search::inbox(&state.pool, &actor, params.limit).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/approvals/search
pub async fn search(
    RequireApprovals(auth): RequireApprovals,
    State(state): State<AppState>,
    Query(params): Query<ApprovalSearchParams>,
) -> AppResult<Json<DataResponse<Vec<ApprovalSummary>>>> {
    let actor = Actor::load(&state.pool, &auth).await;
    let data = search::search(&state.pool, &actor, &params).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/approvals/{id}
pub async fn get_by_id(
    RequireApprovals(auth): RequireApprovals,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ApprovalDetail>>> {
    let actor = Actor::load(&state.pool, &auth).await;
    let data = access::load_detail(&state.pool, &actor, id).await?;
    Ok(Json(DataResponse { data }))
}

/// PUT /api/v1/approvals/{id}
///
/// Partial content update; absent fields are left unchanged and
/// `confidential_note: null` clears the note.
pub async fn update(
    RequireApprovals(auth): RequireApprovals,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateApproval>,
) -> AppResult<impl IntoResponse> {
    let actor = Actor::load(&state.pool, &auth).await;
    let approval = workflow::update_content(&state, &actor, id, input).await?;
    Ok(Json(DataResponse { data: approval }))
}

/// POST /api/v1/approvals/{id}/decision
pub async fn decide(
    RequireApprovals(auth): RequireApprovals,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<DecisionInput>,
) -> AppResult<Json<DataResponse<DecisionOutcome>>> {
    let actor = Actor::load(&state.pool, &auth).await;
    let data = workflow::decide(&state, &actor, id, input).await?;
    Ok(Json(DataResponse { data }))
}
