//! Repository for the `approval_steps` table.

use portal_core::approval::ApprovalStatus;
use portal_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::approval::ApprovalStep;
use crate::Tx;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, approval_id, step_order, approver_name, approver_email, status, decided_at, comment";

/// Provides persistence for approver chains.
pub struct ApprovalStepRepo;

impl ApprovalStepRepo {
    /// All steps of a request ordered by `(step_order, id)`.
    ///
    /// Accepts a pool or an open transaction.
    pub async fn list_for_approval<'e, E>(
        executor: E,
        approval_id: DbId,
    ) -> Result<Vec<ApprovalStep>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM approval_steps
             WHERE approval_id = $1
             ORDER BY step_order, id"
        );
        sqlx::query_as::<_, ApprovalStep>(&query)
            .bind(approval_id)
            .fetch_all(executor)
            .await
    }

    /// Append a pending step.
    pub async fn create(
        tx: &mut Tx<'_>,
        approval_id: DbId,
        step_order: i32,
        approver_name: &str,
        approver_email: Option<&str>,
    ) -> Result<ApprovalStep, sqlx::Error> {
        let query = format!(
            "INSERT INTO approval_steps (approval_id, step_order, approver_name, approver_email)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ApprovalStep>(&query)
            .bind(approval_id)
            .bind(step_order)
            .bind(approver_name)
            .bind(approver_email)
            .fetch_one(&mut **tx)
            .await
    }

    /// Record a decision on a step that is still pending.
    ///
    /// Returns `false` when the step was already decided.
    pub async fn decide(
        tx: &mut Tx<'_>,
        step_id: DbId,
        status: ApprovalStatus,
        comment: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE approval_steps
             SET status = $2, decided_at = now(), comment = $3
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(step_id)
        .bind(status.as_str())
        .bind(comment)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a step. Returns `true` if a row was removed.
    pub async fn delete(tx: &mut Tx<'_>, approval_id: DbId, step_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM approval_steps WHERE id = $1 AND approval_id = $2")
            .bind(step_id)
            .bind(approval_id)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Add `offset` to the order of the given steps in one statement.
    pub async fn shift_orders(
        tx: &mut Tx<'_>,
        approval_id: DbId,
        step_ids: &[DbId],
        offset: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE approval_steps SET step_order = step_order + $3
             WHERE approval_id = $1 AND id = ANY($2)",
        )
        .bind(approval_id)
        .bind(step_ids)
        .bind(offset)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Assign `(id, step_order)` pairs in one statement.
    ///
    /// `uq_approval_steps_order` is checked once the whole statement has run,
    /// so the plan may permute existing orders freely.
    pub async fn apply_orders(
        tx: &mut Tx<'_>,
        approval_id: DbId,
        plan: &[(DbId, i32)],
    ) -> Result<(), sqlx::Error> {
        if plan.is_empty() {
            return Ok(());
        }
        let (ids, orders): (Vec<DbId>, Vec<i32>) = plan.iter().copied().unzip();
        sqlx::query(
            "UPDATE approval_steps s SET step_order = p.step_order
             FROM UNNEST($2::bigint[], $3::int[]) AS p(id, step_order)
             WHERE s.approval_id = $1 AND s.id = p.id AND s.step_order <> p.step_order",
        )
        .bind(approval_id)
        .bind(&ids)
        .bind(&orders)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}
