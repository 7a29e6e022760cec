//! JWT-based authentication extractor for Axum handlers.

use std::collections::HashMap;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use portal_core::error::CoreError;
use portal_core::roles::ROLE_ADMIN;
use portal_core::types::DbId;
use portal_db::repositories::UserRepo;

use crate::auth::jwt::validate_token;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// The authenticated caller.
///
/// The token only identifies the user; role and permission flags are read
/// from the database on every request.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id, login = %user.loginname, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user's internal database id (from `claims.sub`).
    pub user_id: DbId,
    /// Login name; the identity used for requester and approver matching.
    pub loginname: String,
    pub display_name: String,
    /// `"admin"` or `"user"`.
    pub role: String,
    /// Per-module permission flags.
    pub permissions: HashMap<String, bool>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    /// Admins implicitly hold every flag.
    pub fn has_permission(&self, key: &str) -> bool {
        self.is_admin() || self.permissions.get(key).copied().unwrap_or(false)
    }
}

fn unauthorized(msg: &str) -> AppError {
    AppError::Core(CoreError::Unauthorized(msg.into()))
}

/// Load an active user and their flags by id.
pub async fn load_user(state: &AppState, user_id: DbId) -> AppResult<AuthUser> {
    let user = UserRepo::find_by_id(&state.pool, user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| unauthorized("Account not found or disabled"))?;
    let permissions = UserRepo::permissions(&state.pool, user.id).await?;

    Ok(AuthUser {
        user_id: user.id,
        loginname: user.loginname,
        display_name: user.display_name,
        role: user.role,
        permissions,
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| unauthorized("Missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| unauthorized("Invalid Authorization format. Expected: Bearer <token>"))?;

        let claims = validate_token(token, &state.config.jwt)
            .map_err(|_| unauthorized("Invalid or expired token"))?;

        load_user(state, claims.sub).await
    }
}
