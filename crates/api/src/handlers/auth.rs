//! Password login.
//!
//! The issued token carries only the user id; role and permission flags are
//! re-read by [`AuthUser`](crate::middleware::auth::AuthUser) on every request.

use axum::extract::State;
use axum::Json;
use portal_core::error::CoreError;
use portal_core::types::DbId;
use portal_db::models::user::User;
use portal_db::repositories::UserRepo;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::auth::jwt::{generate_access_token, JwtConfig};
use crate::auth::password::verify_password;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub loginname: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    /// Seconds until `access_token` expires.
    pub expires_in: i64,
    pub user: LoginUser,
}

#[derive(Debug, Serialize)]
pub struct LoginUser {
    pub id: DbId,
    pub loginname: String,
    pub display_name: String,
    pub role: String,
    pub is_admin: bool,
}

impl LoginResponse {
    fn issue(user: User, jwt: &JwtConfig) -> AppResult<Self> {
        let access_token = generate_access_token(user.id, jwt)
            .map_err(|e| AppError::InternalError(format!("Token generation failed: {e}")))?;
        Ok(Self {
            access_token,
            expires_in: jwt.access_token_expiry_mins * 60,
            user: LoginUser {
                is_admin: user.is_admin(),
                id: user.id,
                loginname: user.loginname,
                display_name: user.display_name,
                role: user.role,
            },
        })
    }
}

/// Unknown login and wrong password share one message.
fn rejected() -> AppError {
    CoreError::Unauthorized("Invalid login name or password".into()).into()
}

async fn authenticate(pool: &PgPool, loginname: &str, password: &str) -> AppResult<User> {
    let Some(user) = UserRepo::find_by_loginname(pool, loginname).await? else {
        tracing::info!(login = %loginname, "Login rejected: unknown account");
        return Err(rejected());
    };

    let matches = verify_password(password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Stored hash for user {} is unusable: {e}", user.id)))?;
    if !matches {
        tracing::info!(login = %loginname, "Login rejected: wrong password");
        return Err(rejected());
    }
    // Only reported once the password matched.
    if !user.is_active {
        return Err(CoreError::Forbidden("Account is deactivated".into()).into());
    }
    Ok(user)
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let user = authenticate(&state.pool, input.loginname.trim(), &input.password).await?;
    tracing::info!(user_id = user.id, login = %user.loginname, "User logged in");
    Ok(Json(LoginResponse::issue(user, &state.config.jwt)?))
}
