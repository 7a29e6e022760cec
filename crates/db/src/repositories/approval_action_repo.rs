//! Repository for the append-only `approval_actions` table.

use portal_core::approval::ActionKind;
use portal_core::types::DbId;
use sqlx::PgPool;

use crate::models::approval::ApprovalAction;
use crate::Tx;

const COLUMNS: &str = "id, approval_id, step_id, actor, action, note, created_at";

/// Audit log writer and reader.
pub struct ApprovalActionRepo;

impl ApprovalActionRepo {
    /// Append one audit row.
    pub async fn record(
        tx: &mut Tx<'_>,
        approval_id: DbId,
        step_id: Option<DbId>,
        actor: &str,
        kind: ActionKind,
        note: Option<&str>,
    ) -> Result<ApprovalAction, sqlx::Error> {
        let query = format!(
            "INSERT INTO approval_actions (approval_id, step_id, actor, action, note)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ApprovalAction>(&query)
            .bind(approval_id)
            .bind(step_id)
            .bind(actor)
            .bind(kind.as_str())
            .bind(note)
            .fetch_one(&mut **tx)
            .await
    }

    /// The audit trail of a request, oldest first.
    pub async fn list_for_approval(
        pool: &PgPool,
        approval_id: DbId,
    ) -> Result<Vec<ApprovalAction>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM approval_actions
             WHERE approval_id = $1
             ORDER BY created_at, id"
        );
        sqlx::query_as::<_, ApprovalAction>(&query)
            .bind(approval_id)
            .fetch_all(pool)
            .await
    }
}
