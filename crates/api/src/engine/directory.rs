//! Directory access for identity resolution.

use portal_core::identity::DirectoryEntry;
use portal_db::repositories::EmployeeRepo;
use sqlx::PgPool;

/// Load every directory row.
///
/// A failed lookup is logged and yields an empty directory: approver names
/// then stay as typed and carry no email.
pub async fn load(pool: &PgPool) -> Vec<DirectoryEntry> {
    match EmployeeRepo::directory_entries(pool).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(error = %e, "Directory lookup failed; using raw names");
            Vec::new()
        }
    }
}
