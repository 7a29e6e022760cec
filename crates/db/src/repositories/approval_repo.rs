//! Repository for the `approvals` table.

use portal_core::approval::{ApprovalStatus, NO_CURRENT_STEP};
use portal_core::types::DbId;
use sqlx::PgPool;

use crate::models::approval::{
    Approval, ApprovalSearchFilter, ApprovalSearchRow, CreateApproval, UpdateApproval,
};
use crate::Tx;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, subject, description, confidential_note, requester, requester_dept, \
                        submitted_at, status, current_step, visibility_scope, publish_on_complete";

/// Provides persistence for approval requests.
pub struct ApprovalRepo;

impl ApprovalRepo {
    /// Insert a new pending request pointing at step 0.
    pub async fn create(tx: &mut Tx<'_>, input: &CreateApproval) -> Result<Approval, sqlx::Error> {
        let query = format!(
            "INSERT INTO approvals
                (subject, description, confidential_note, requester, requester_dept,
                 visibility_scope, publish_on_complete, status, current_step)
             VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending', 0)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Approval>(&query)
            .bind(&input.subject)
            .bind(&input.description)
            .bind(&input.confidential_note)
            .bind(&input.requester)
            .bind(&input.requester_dept)
            .bind(&input.visibility_scope)
            .bind(input.publish_on_complete)
            .fetch_one(&mut **tx)
            .await
    }

    /// Find a request by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Approval>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM approvals WHERE id = $1");
        sqlx::query_as::<_, Approval>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Load a request and hold its row lock until the transaction ends.
    ///
    /// Every workflow mutation starts here, so operations on one request are
    /// serialized.
    pub async fn lock(tx: &mut Tx<'_>, id: DbId) -> Result<Option<Approval>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM approvals WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Approval>(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Move the active-step pointer of a pending request.
    pub async fn set_current_step(
        tx: &mut Tx<'_>,
        id: DbId,
        current_step: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE approvals SET current_step = $2 WHERE id = $1 AND status = 'pending'")
            .bind(id)
            .bind(current_step)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Resolve a request: set a terminal status and clear the pointer.
    pub async fn resolve(
        tx: &mut Tx<'_>,
        id: DbId,
        status: ApprovalStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE approvals SET status = $2, current_step = $3 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .bind(NO_CURRENT_STEP)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Apply a content patch. Only non-`None` fields are changed.
    pub async fn update_content(
        tx: &mut Tx<'_>,
        id: DbId,
        input: &UpdateApproval,
    ) -> Result<Approval, sqlx::Error> {
        let query = format!(
            "UPDATE approvals SET
                subject = COALESCE($2, subject),
                description = COALESCE($3, description),
                confidential_note = CASE WHEN $4 THEN $5 ELSE confidential_note END,
                visibility_scope = COALESCE($6, visibility_scope),
                publish_on_complete = COALESCE($7, publish_on_complete)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let (set_note, note) = match &input.confidential_note {
            Some(note) => (true, note.clone()),
            None => (false, None),
        };
        sqlx::query_as::<_, Approval>(&query)
            .bind(id)
            .bind(&input.subject)
            .bind(&input.description)
            .bind(set_note)
            .bind(note)
            .bind(&input.visibility_scope)
            .bind(input.publish_on_complete)
            .fetch_one(&mut **tx)
            .await
    }

    /// IDs of every request, oldest first.
    pub async fn list_ids(pool: &PgPool) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar("SELECT id FROM approvals ORDER BY id")
            .fetch_all(pool)
            .await
    }

    /// Newest-first search over the SQL-expressible filters.
    ///
    /// Visibility filtering happens on the returned rows; callers page with
    /// `filter.limit` and `filter.offset`.
    pub async fn search(
        pool: &PgPool,
        filter: &ApprovalSearchFilter,
    ) -> Result<Vec<ApprovalSearchRow>, sqlx::Error> {
        sqlx::query_as::<_, ApprovalSearchRow>(
            "SELECT
                a.id, a.subject, a.description, a.requester, a.requester_dept,
                a.submitted_at, a.status, a.current_step, a.visibility_scope,
                ARRAY(
                    SELECT s.approver_name FROM approval_steps s
                    WHERE s.approval_id = a.id
                    ORDER BY s.step_order
                ) AS approver_names,
                (
                    SELECT s.approver_name FROM approval_steps s
                    WHERE s.approval_id = a.id
                      AND s.step_order = a.current_step
                      AND s.status = 'pending'
                      AND a.status = 'pending'
                    LIMIT 1
                ) AS active_approver
             FROM approvals a
             WHERE ($1::text IS NULL OR a.status = $1)
               AND ($2::timestamptz IS NULL OR a.submitted_at >= $2)
               AND ($3::timestamptz IS NULL OR a.submitted_at < $3)
               AND ($4::text IS NULL
                    OR a.subject ILIKE $4
                    OR a.description ILIKE $4
                    OR a.requester ILIKE $4
                    OR EXISTS (
                        SELECT 1 FROM approval_steps s
                        WHERE s.approval_id = a.id
                          AND (s.approver_name ILIKE $4 OR s.approver_email ILIKE $4)
                    ))
               AND ($5::text[] IS NULL
                    OR LOWER(REGEXP_REPLACE(TRIM(a.requester), '\\s+', ' ', 'g')) = ANY($5))
               AND ($6::text[] IS NULL
                    OR (a.status = 'pending' AND EXISTS (
                        SELECT 1 FROM approval_steps s
                        WHERE s.approval_id = a.id
                          AND s.step_order = a.current_step
                          AND s.status = 'pending'
                          AND LOWER(REGEXP_REPLACE(TRIM(s.approver_name), '\\s+', ' ', 'g')) = ANY($6)
                    )))
             ORDER BY a.submitted_at DESC, a.id DESC
             LIMIT $7 OFFSET $8",
        )
        .bind(&filter.status)
        .bind(filter.submitted_from)
        .bind(filter.submitted_before)
        .bind(&filter.pattern)
        .bind(&filter.requester_keys)
        .bind(&filter.approver_keys)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(pool)
        .await
    }
}
