//! Repository for the append-only `approval_versions` table.

use portal_core::types::DbId;
use sqlx::PgPool;

use crate::models::approval::{ApprovalVersion, ApprovalVersionSummary};
use crate::Tx;

const COLUMNS: &str = "id, approval_id, version, snapshot, change_description, actor, created_at";

/// Snapshot history of request content.
pub struct ApprovalVersionRepo;

impl ApprovalVersionRepo {
    /// Append a snapshot as `max(version) + 1` (1 for the first).
    ///
    /// Callers hold the approval row lock, so numbering cannot race.
    pub async fn append(
        tx: &mut Tx<'_>,
        approval_id: DbId,
        snapshot: &serde_json::Value,
        change_description: &str,
        actor: &str,
    ) -> Result<ApprovalVersion, sqlx::Error> {
        let query = format!(
            "INSERT INTO approval_versions (approval_id, version, snapshot, change_description, actor)
             SELECT $1, COALESCE(MAX(version), 0) + 1, $2, $3, $4
             FROM approval_versions WHERE approval_id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ApprovalVersion>(&query)
            .bind(approval_id)
            .bind(snapshot)
            .bind(change_description)
            .bind(actor)
            .fetch_one(&mut **tx)
            .await
    }

    /// History of a request, newest version first.
    pub async fn list_for_approval(
        pool: &PgPool,
        approval_id: DbId,
    ) -> Result<Vec<ApprovalVersionSummary>, sqlx::Error> {
        sqlx::query_as::<_, ApprovalVersionSummary>(
            "SELECT id, version, change_description, actor, created_at
             FROM approval_versions
             WHERE approval_id = $1
             ORDER BY version DESC",
        )
        .bind(approval_id)
        .fetch_all(pool)
        .await
    }

    /// One snapshot by version number.
    pub async fn find(
        pool: &PgPool,
        approval_id: DbId,
        version: i32,
    ) -> Result<Option<ApprovalVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM approval_versions WHERE approval_id = $1 AND version = $2"
        );
        sqlx::query_as::<_, ApprovalVersion>(&query)
            .bind(approval_id)
            .bind(version)
            .fetch_optional(pool)
            .await
    }
}
