//! Module gates layered on [`AuthUser`].
//!
//! Handlers name the gate in their signature; a caller who fails it never
//! reaches the handler body.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use portal_core::error::CoreError;
use portal_core::roles::PERM_APPROVALS;

use super::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Authenticate, then apply `allowed`; 403 with `denied` otherwise.
async fn gate(
    parts: &mut Parts,
    state: &AppState,
    allowed: fn(&AuthUser) -> bool,
    denied: &'static str,
) -> AppResult<AuthUser> {
    let user = AuthUser::from_request_parts(parts, state).await?;
    if allowed(&user) {
        Ok(user)
    } else {
        tracing::debug!(user_id = user.user_id, denied, "Module gate refused caller");
        Err(AppError::Core(CoreError::Forbidden(denied.into())))
    }
}

/// Admin role only: maintenance endpoints.
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> AppResult<Self> {
        gate(parts, state, AuthUser::is_admin, "Admin role required")
            .await
            .map(Self)
    }
}

/// The approvals module: admins, or holders of the `approvals` flag.
pub struct RequireApprovals(pub AuthUser);

impl FromRequestParts<AppState> for RequireApprovals {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> AppResult<Self> {
        gate(
            parts,
            state,
            |user| user.has_permission(PERM_APPROVALS),
            "Approvals permission required",
        )
        .await
        .map(Self)
    }
}
