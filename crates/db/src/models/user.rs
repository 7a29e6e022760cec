//! Login account model.

use portal_core::roles::ROLE_ADMIN;
use portal_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// Full row from the `users` table.
///
/// Contains the password hash; never serialize it to API responses.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub loginname: String,
    pub display_name: String,
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}
