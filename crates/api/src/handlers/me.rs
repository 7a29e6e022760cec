//! Handler for `GET /me`.

use std::collections::HashMap;

use axum::extract::State;
use axum::Json;
use portal_core::navigation::{filter_visible, NavNode};
use portal_core::types::DbId;
use serde::Serialize;

use crate::engine::Actor;
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// The caller as the portal sees them.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: DbId,
    pub loginname: String,
    pub display_name: String,
    pub role: String,
    pub permissions: HashMap<String, bool>,
    /// Every folded name the caller can act under.
    pub identity_keys: Vec<String>,
    pub navigation: Vec<NavNode>,
}

/// GET /api/v1/me
pub async fn me(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<MeResponse>>> {
    let actor = Actor::load(&state.pool, &auth).await;
    let navigation = filter_visible(&state.navigation, auth.is_admin(), &auth.permissions);

    Ok(Json(DataResponse {
        data: MeResponse {
            id: auth.user_id,
            identity_keys: actor.keys.sorted(),
            loginname: auth.loginname,
            display_name: auth.display_name,
            role: auth.role,
            permissions: auth.permissions,
            navigation,
        },
    }))
}
