//! Repository for the `users` and `user_permissions` tables.

use std::collections::HashMap;

use portal_core::types::DbId;
use sqlx::PgPool;

use crate::models::user::User;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, loginname, display_name, password_hash, role, is_active, created_at, updated_at";

/// Read access to login accounts and their permission flags.
///
/// Accounts are provisioned outside this service.
pub struct UserRepo;

impl UserRepo {
    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by login name (case-sensitive).
    pub async fn find_by_loginname(
        pool: &PgPool,
        loginname: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE loginname = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(loginname)
            .fetch_optional(pool)
            .await
    }

    /// All permission flags of a user.
    pub async fn permissions(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<HashMap<String, bool>, sqlx::Error> {
        let rows: Vec<(String, bool)> =
            sqlx::query_as("SELECT perm_key, value FROM user_permissions WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(pool)
                .await?;
        Ok(rows.into_iter().collect())
    }

}
