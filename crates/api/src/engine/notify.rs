//! Workflow notices sent after a transaction commits.

use portal_db::models::approval::Approval;
use portal_events::Mailer;

/// One outgoing email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

impl Notice {
    /// Ask the next approver to review.
    pub fn approver_turn(approval: &Approval, approver_email: Option<String>) -> Self {
        Self {
            to: approver_email.into_iter().collect(),
            subject: format!("Approval needed: {}", approval.subject),
            body: format!(
                "Subject: {}\nRequester: {}\n\n{}\n",
                approval.subject,
                approval.requester,
                portal_core::search::strip_html(&approval.description),
            ),
        }
    }

    /// Tell the requester their request was sent back.
    pub fn rejected(
        approval: &Approval,
        requester_email: Option<String>,
        rejected_by: &str,
        comment: &str,
    ) -> Self {
        Self {
            to: requester_email.into_iter().collect(),
            subject: format!("Approval rejected: {}", approval.subject),
            body: format!(
                "{}, your request \"{}\" was rejected by {}.\nComment: {}\n",
                approval.requester, approval.subject, rejected_by, comment,
            ),
        }
    }

    /// Tell the requester every step approved.
    pub fn completed(approval: &Approval, requester_email: Option<String>) -> Self {
        Self {
            to: requester_email.into_iter().collect(),
            subject: format!("Approval completed: {}", approval.subject),
            body: format!(
                "{}, your request \"{}\" has been approved by every approver.\n",
                approval.requester, approval.subject,
            ),
        }
    }

    /// Recipients that look like addresses.
    fn recipients(&self) -> Vec<String> {
        self.to
            .iter()
            .map(|a| a.trim())
            .filter(|a| a.contains('@'))
            .map(str::to_string)
            .collect()
    }
}

/// Send a notice, logging instead of failing.
pub async fn deliver(mailer: &dyn Mailer, notice: Notice) {
    let to = notice.recipients();
    if to.is_empty() {
        tracing::debug!(subject = %notice.subject, "No deliverable recipient; notice skipped");
        return;
    }
    if let Err(e) = mailer.send(&to, &notice.subject, &notice.body).await {
        tracing::warn!(error = %e, subject = %notice.subject, "Failed to send workflow notice");
    }
}
