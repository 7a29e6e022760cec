//! Repository for the `approval_attachments` table.

use portal_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::attachment::{Attachment, CreateAttachment};
use crate::Tx;

const COLUMNS: &str = "id, approval_id, original_filename, stored_filename, content_type, \
                        size_bytes, uploaded_by, uploaded_at";

/// Metadata for files attached to a request.
pub struct AttachmentRepo;

impl AttachmentRepo {
    pub async fn create(
        tx: &mut Tx<'_>,
        input: &CreateAttachment,
    ) -> Result<Attachment, sqlx::Error> {
        let query = format!(
            "INSERT INTO approval_attachments
                (approval_id, original_filename, stored_filename, content_type, size_bytes, uploaded_by)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Attachment>(&query)
            .bind(input.approval_id)
            .bind(&input.original_filename)
            .bind(&input.stored_filename)
            .bind(&input.content_type)
            .bind(input.size_bytes)
            .bind(&input.uploaded_by)
            .fetch_one(&mut **tx)
            .await
    }

    /// Attachments of a request in upload order.
    pub async fn list_for_approval<'e, E>(
        executor: E,
        approval_id: DbId,
    ) -> Result<Vec<Attachment>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM approval_attachments
             WHERE approval_id = $1
             ORDER BY uploaded_at, id"
        );
        sqlx::query_as::<_, Attachment>(&query)
            .bind(approval_id)
            .fetch_all(executor)
            .await
    }

    /// Find an attachment, scoped to its request.
    pub async fn find(
        pool: &PgPool,
        approval_id: DbId,
        id: DbId,
    ) -> Result<Option<Attachment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM approval_attachments WHERE id = $1 AND approval_id = $2"
        );
        sqlx::query_as::<_, Attachment>(&query)
            .bind(id)
            .bind(approval_id)
            .fetch_optional(pool)
            .await
    }

    /// Delete an attachment row, returning it so the caller can remove the file.
    pub async fn delete(
        tx: &mut Tx<'_>,
        approval_id: DbId,
        id: DbId,
    ) -> Result<Option<Attachment>, sqlx::Error> {
        let query = format!(
            "DELETE FROM approval_attachments WHERE id = $1 AND approval_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Attachment>(&query)
            .bind(id)
            .bind(approval_id)
            .fetch_optional(&mut **tx)
            .await
    }
}
