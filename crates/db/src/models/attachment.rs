//! Approval attachment model.

use portal_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `approval_attachments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Attachment {
    pub id: DbId,
    pub approval_id: DbId,
    pub original_filename: String,
    /// Name of the file inside the approval's storage directory.
    #[serde(skip_serializing)]
    pub stored_filename: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub uploaded_by: String,
    pub uploaded_at: Timestamp,
}

/// DTO for recording a stored upload.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAttachment {
    pub approval_id: DbId,
    pub original_filename: String,
    pub stored_filename: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub uploaded_by: String,
}
