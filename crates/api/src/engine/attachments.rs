//! Attachment upload, download, and removal.
//!
//! Files are written before the owning transaction commits; [`Written`]
//! tracks them so a failed transaction leaves no orphans behind.

use portal_core::approval::ActionKind;
use portal_core::attachment::DEFAULT_CONTENT_TYPE;
use portal_core::error::CoreError;
use portal_core::types::DbId;
use portal_db::models::attachment::{Attachment, CreateAttachment};
use portal_db::repositories::{ApprovalActionRepo, AttachmentRepo};
use portal_db::Tx;
use tokio::fs::File;

use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::storage::AttachmentStore;

use super::access::{lock_for_change, load_viewable};
use super::{snapshot, Actor};

/// One uploaded file as received from a multipart body.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Files written to the store during a transaction that has not committed.
#[derive(Debug, Default)]
pub struct Written(Vec<(DbId, String)>);

impl Written {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Remove every tracked file; failures are logged.
    pub async fn discard(self, store: &AttachmentStore) {
        for (approval_id, stored) in self.0 {
            if let Err(e) = store.delete(approval_id, &stored).await {
                tracing::warn!(approval_id, stored = %stored, error = %e, "Failed to remove orphaned attachment");
            }
        }
    }
}

/// Write uploads and record their rows inside `tx`.
pub(crate) async fn store_all(
    state: &AppState,
    tx: &mut Tx<'_>,
    approval_id: DbId,
    uploader: &str,
    uploads: Vec<Upload>,
    written: &mut Written,
) -> AppResult<Vec<Attachment>> {
    let mut rows = Vec::with_capacity(uploads.len());
    for upload in uploads {
        let stored = state
            .attachments
            .save(approval_id, &upload.filename, &upload.bytes)
            .await?;
        written.0.push((approval_id, stored.stored_filename.clone()));

        let content_type = upload
            .content_type
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
        let row = AttachmentRepo::create(
            tx,
            &CreateAttachment {
                approval_id,
                original_filename: stored.original_filename,
                stored_filename: stored.stored_filename,
                content_type,
                size_bytes: stored.size_bytes,
                uploaded_by: uploader.to_string(),
            },
        )
        .await?;
        ApprovalActionRepo::record(
            tx,
            approval_id,
            None,
            uploader,
            ActionKind::AddAttachment,
            Some(&row.original_filename),
        )
        .await?;
        rows.push(row);
    }
    Ok(rows)
}

/// Attach files to a pending request.
pub async fn add(
    state: &AppState,
    actor: &Actor,
    approval_id: DbId,
    uploads: Vec<Upload>,
) -> AppResult<Vec<Attachment>> {
    if uploads.is_empty() {
        return Err(AppError::BadRequest("No files uploaded".into()));
    }

    let mut written = Written::default();
    match add_in_tx(state, actor, approval_id, uploads, &mut written).await {
        Ok(rows) => {
            tracing::info!(approval_id, count = rows.len(), "Attachments added");
            Ok(rows)
        }
        Err(e) => {
            written.discard(&state.attachments).await;
            Err(e)
        }
    }
}

async fn add_in_tx(
    state: &AppState,
    actor: &Actor,
    approval_id: DbId,
    uploads: Vec<Upload>,
    written: &mut Written,
) -> AppResult<Vec<Attachment>> {
    let mut tx = state.pool.begin().await?;
    let approval = lock_for_change(&mut tx, actor, approval_id).await?;
    let rows = store_all(state, &mut tx, approval_id, &actor.login, uploads, written).await?;
    snapshot::record(&mut tx, &approval, snapshot::CHANGE_ATTACHMENT_ADDED, &actor.login).await?;
    tx.commit().await?;
    Ok(rows)
}

fn attachment_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Attachment",
        id,
    })
}

/// Remove an attachment from a pending request.
///
/// The row goes first; the file is removed after commit.
pub async fn remove(
    state: &AppState,
    actor: &Actor,
    approval_id: DbId,
    attachment_id: DbId,
) -> AppResult<()> {
    let mut tx = state.pool.begin().await?;
    let approval = lock_for_change(&mut tx, actor, approval_id).await?;
    let removed = AttachmentRepo::delete(&mut tx, approval_id, attachment_id)
        .await?
        .ok_or_else(|| attachment_not_found(attachment_id))?;
    ApprovalActionRepo::record(
        &mut tx,
        approval_id,
        None,
        &actor.login,
        ActionKind::DeleteAttachment,
        Some(&removed.original_filename),
    )
    .await?;
    snapshot::record(&mut tx, &approval, snapshot::CHANGE_ATTACHMENT_REMOVED, &actor.login).await?;
    tx.commit().await?;

    if let Err(e) = state
        .attachments
        .delete(approval_id, &removed.stored_filename)
        .await
    {
        tracing::warn!(approval_id, attachment_id, error = %e, "Attachment row removed but file delete failed");
    }
    tracing::info!(approval_id, attachment_id, "Attachment removed");
    Ok(())
}

/// Open an attachment the actor may view.
pub async fn open(
    state: &AppState,
    actor: &Actor,
    approval_id: DbId,
    attachment_id: DbId,
) -> AppResult<(Attachment, File)> {
    load_viewable(&state.pool, actor, approval_id).await?;
    let attachment = AttachmentRepo::find(&state.pool, approval_id, attachment_id)
        .await?
        .ok_or_else(|| attachment_not_found(attachment_id))?;
    let file = match state
        .attachments
        .open(approval_id, &attachment.stored_filename)
        .await
    {
        Ok(file) => file,
        Err(e) if e.is_not_found() => {
            tracing::warn!(approval_id, attachment_id, "Attachment file missing from store");
            return Err(attachment_not_found(attachment_id));
        }
        Err(e) => return Err(e.into()),
    };
    Ok((attachment, file))
}
