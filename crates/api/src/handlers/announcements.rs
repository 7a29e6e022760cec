//! Handler for `GET /announcements`.

use axum::extract::{Query, State};
use axum::Json;
use portal_core::search::clamp_limit;
use portal_db::models::announcement::Announcement;
use portal_db::repositories::AnnouncementRepo;

use crate::engine::Actor;
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::query::LimitParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/announcements
///
/// Admins see every notice; others see `org` notices plus restricted ones
/// they authored.
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> AppResult<Json<DataResponse<Vec<Announcement>>>> {
    let limit = clamp_limit(params.limit);
    let data = if auth.is_admin() {
        AnnouncementRepo::list_visible(&state.pool, None, limit).await?
    } else {
        let actor = Actor::load(&state.pool, &auth).await;
        let keys = actor.keys.sorted();
        AnnouncementRepo::list_visible(&state.pool, Some(&keys), limit).await?
    };
    Ok(Json(DataResponse { data }))
}
