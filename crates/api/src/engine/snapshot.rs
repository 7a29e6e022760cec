//! Version snapshots of a request's content.

use portal_db::models::approval::{Approval, ApprovalVersion};
use portal_db::repositories::{ApprovalVersionRepo, AttachmentRepo};
use portal_db::Tx;
use serde_json::json;

pub const CHANGE_SUBMITTED: &str = "submitted";
pub const CHANGE_CONTENT: &str = "content updated";
pub const CHANGE_ATTACHMENT_ADDED: &str = "attachments added";
pub const CHANGE_ATTACHMENT_REMOVED: &str = "attachment removed";

/// Append a version holding the request and its current attachment list.
pub async fn record(
    tx: &mut Tx<'_>,
    approval: &Approval,
    change_description: &str,
    actor: &str,
) -> Result<ApprovalVersion, sqlx::Error> {
    let attachments = AttachmentRepo::list_for_approval(&mut **tx, approval.id).await?;
    let snapshot = json!({
        "approval": approval,
        "attachments": attachments,
    });
    ApprovalVersionRepo::append(tx, approval.id, &snapshot, change_description, actor).await
}

/// Blank the confidential note inside a stored snapshot.
pub fn redact(snapshot: &mut serde_json::Value) {
    if let Some(note) = snapshot
        .get_mut("approval")
        .and_then(|a| a.get_mut("confidential_note"))
    {
        *note = serde_json::Value::Null;
    }
}
