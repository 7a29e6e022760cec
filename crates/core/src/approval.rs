//! Approval workflow states, decisions, and the transition rules that move a
//! request along its approver chain.
//!
//! The database stores every enum here as lowercase text; `as_str` / `parse`
//! are the only conversion points so the two never drift apart.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Value of `approvals.current_step` once a request is resolved.
pub const NO_CURRENT_STEP: i32 = -1;

/// Maximum subject length accepted on create / update.
pub const MAX_SUBJECT_LEN: usize = 200;

/// Note recorded on an `acknowledge` decision submitted without a comment.
pub const DEFAULT_ACKNOWLEDGE_NOTE: &str = "acknowledged";

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle status shared by approval requests and their steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// A decision an approver can record on the active step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    Reject,
    /// Advances the chain exactly like `Approve`; differs only in the audit trail.
    Acknowledge,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Acknowledge => "acknowledge",
        }
    }

    pub fn parse(s: &str) -> Result<Self, WorkflowError> {
        match s.trim() {
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            "acknowledge" => Ok(Self::Acknowledge),
            other => Err(WorkflowError::InvalidAction(other.to_string())),
        }
    }

    /// Status written onto the decided step.
    pub fn step_status(&self) -> ApprovalStatus {
        match self {
            Self::Reject => ApprovalStatus::Rejected,
            Self::Approve | Self::Acknowledge => ApprovalStatus::Approved,
        }
    }

    /// Audit action kind recorded for this decision.
    pub fn action_kind(&self) -> ActionKind {
        match self {
            Self::Approve => ActionKind::Approve,
            Self::Reject => ActionKind::Reject,
            Self::Acknowledge => ActionKind::Acknowledge,
        }
    }

    pub fn requires_comment(&self) -> bool {
        !matches!(self, Self::Acknowledge)
    }
}

/// Trim and validate a decision comment.
///
/// Approve and reject require a non-blank comment; acknowledge falls back to
/// [`DEFAULT_ACKNOWLEDGE_NOTE`].
pub fn normalize_comment(
    decision: Decision,
    comment: Option<&str>,
) -> Result<String, WorkflowError> {
    let trimmed = comment.map(str::trim).unwrap_or_default();
    if !trimmed.is_empty() {
        return Ok(trimmed.to_string());
    }
    if decision.requires_comment() {
        Err(WorkflowError::CommentRequired)
    } else {
        Ok(DEFAULT_ACKNOWLEDGE_NOTE.to_string())
    }
}

// ---------------------------------------------------------------------------
// Visibility scope
// ---------------------------------------------------------------------------

/// Who besides participants and admins may see a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityScope {
    /// Anyone with access to the approvals module.
    #[default]
    Org,
    /// Participants and admins only.
    Restricted,
    /// Participants and admins only; never listed to non-participants.
    TopSecret,
}

impl VisibilityScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Org => "org",
            Self::Restricted => "restricted",
            Self::TopSecret => "top_secret",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "org" => Some(Self::Org),
            "restricted" => Some(Self::Restricted),
            "top_secret" => Some(Self::TopSecret),
            _ => None,
        }
    }

    /// Visibility of the announcement published when a request completes.
    ///
    /// Announcements only know `org` and `restricted`, so `top_secret` is
    /// downgraded to `restricted`.
    pub fn announcement_visibility(&self) -> Self {
        match self {
            Self::TopSecret => Self::Restricted,
            other => *other,
        }
    }
}

// ---------------------------------------------------------------------------
// Audit action kinds
// ---------------------------------------------------------------------------

/// Kind of a row in the append-only `approval_actions` log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Submit,
    Approve,
    Reject,
    Acknowledge,
    AddApprover,
    DeleteStep,
    ReorderSteps,
    UpdateContent,
    AddAttachment,
    DeleteAttachment,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Acknowledge => "acknowledge",
            Self::AddApprover => "add_approver",
            Self::DeleteStep => "delete_step",
            Self::ReorderSteps => "reorder_steps",
            Self::UpdateContent => "update_content",
            Self::AddAttachment => "add_attachment",
            Self::DeleteAttachment => "delete_attachment",
        }
    }
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// Where the chain goes after the active step is approved or acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Move the pointer to this step order.
    Next(i32),
    /// The last step was decided; the request is approved.
    Complete,
}

/// Compute the transition after a positive decision on `current_step`.
pub fn advance(current_step: i32, total_steps: i64) -> Advance {
    let next = current_step + 1;
    if i64::from(next) >= total_steps {
        Advance::Complete
    } else {
        Advance::Next(next)
    }
}

/// Validate and trim a request subject.
pub fn validate_subject(subject: &str) -> Result<String, String> {
    let trimmed = subject.trim();
    if trimmed.is_empty() {
        return Err("Subject must not be empty".to_string());
    }
    if trimmed.chars().count() > MAX_SUBJECT_LEN {
        return Err(format!(
            "Subject must be at most {MAX_SUBJECT_LEN} characters"
        ));
    }
    Ok(trimmed.to_string())
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Expected failures of workflow operations.
///
/// Each variant carries a stable snake_case [`code`](WorkflowError::code)
/// that clients match on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    #[error("At least one approver required")]
    ApproverRequired,

    #[error("A comment is required for this decision")]
    CommentRequired,

    #[error("Approver name must not be blank")]
    InvalidDisplayName,

    #[error("Unknown decision '{0}'. Must be one of: approve, reject, acknowledge")]
    InvalidAction(String),

    #[error("Supplied step ids do not match the reorderable steps")]
    InvalidIds,

    #[error("You are not the approver of the active step")]
    NotYourStep,

    #[error("Only the requester or an admin can change this approval")]
    OnlyRequesterOrAdmin,

    #[error("No active step (it may already have been decided)")]
    NoActiveStep,

    #[error("Approval is no longer pending")]
    NotPending,

    #[error("Only undecided steps after the active step can be deleted")]
    CannotDeleteStep,

    #[error("This approver is already in the chain")]
    DuplicatedName,

    #[error("Step order conflict persisted after renumbering")]
    RenumberConflict,
}

impl WorkflowError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ApproverRequired => "approver_required",
            Self::CommentRequired => "comment_required",
            Self::InvalidDisplayName => "invalid_display_name",
            Self::InvalidAction(_) => "invalid_action",
            Self::InvalidIds => "invalid_ids",
            Self::NotYourStep => "not_your_step",
            Self::OnlyRequesterOrAdmin => "only_requester_or_admin",
            Self::NoActiveStep => "no_active_step",
            Self::NotPending => "approval_not_pending",
            Self::CannotDeleteStep => "cannot_delete_this_step",
            Self::DuplicatedName => "duplicated_name",
            Self::RenumberConflict => "renumber_conflict",
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn status_round_trips_through_text() {
        for status in [
            ApprovalStatus::Pending,
            ApprovalStatus::Approved,
            ApprovalStatus::Rejected,
        ] {
            assert_eq!(ApprovalStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ApprovalStatus::parse("PENDING"), None);
    }

    #[test]
    fn unknown_decision_is_rejected() {
        assert_matches!(
            Decision::parse("escalate"),
            Err(WorkflowError::InvalidAction(a)) if a == "escalate"
        );
        assert_eq!(Decision::parse(" approve "), Ok(Decision::Approve));
    }

    #[test]
    fn acknowledge_advances_like_approve() {
        assert_eq!(
            Decision::Acknowledge.step_status(),
            Decision::Approve.step_status()
        );
        assert_eq!(Decision::Reject.step_status(), ApprovalStatus::Rejected);
        assert_eq!(Decision::Acknowledge.action_kind(), ActionKind::Acknowledge);
    }

    #[test]
    fn approve_and_reject_require_a_comment() {
        assert_eq!(
            normalize_comment(Decision::Approve, Some("   ")),
            Err(WorkflowError::CommentRequired)
        );
        assert_eq!(
            normalize_comment(Decision::Reject, None),
            Err(WorkflowError::CommentRequired)
        );
        assert_eq!(
            normalize_comment(Decision::Approve, Some("  ok \n")),
            Ok("ok".to_string())
        );
    }

    #[test]
    fn acknowledge_comment_is_optional() {
        assert_eq!(
            normalize_comment(Decision::Acknowledge, None),
            Ok(DEFAULT_ACKNOWLEDGE_NOTE.to_string())
        );
        assert_eq!(
            normalize_comment(Decision::Acknowledge, Some("seen")),
            Ok("seen".to_string())
        );
    }

    #[test]
    fn advance_moves_to_next_step_until_last() {
        assert_eq!(advance(0, 3), Advance::Next(1));
        assert_eq!(advance(1, 3), Advance::Next(2));
        assert_eq!(advance(2, 3), Advance::Complete);
        assert_eq!(advance(0, 1), Advance::Complete);
    }

    #[test]
    fn top_secret_announcement_is_downgraded() {
        assert_eq!(
            VisibilityScope::TopSecret.announcement_visibility(),
            VisibilityScope::Restricted
        );
        assert_eq!(
            VisibilityScope::Org.announcement_visibility(),
            VisibilityScope::Org
        );
        assert_eq!(
            VisibilityScope::Restricted.announcement_visibility(),
            VisibilityScope::Restricted
        );
    }

    #[test]
    fn subject_is_trimmed_and_bounded() {
        assert_eq!(validate_subject("  Budget  "), Ok("Budget".to_string()));
        assert!(validate_subject("   ").is_err());
        assert!(validate_subject(&"x".repeat(MAX_SUBJECT_LEN + 1)).is_err());
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(WorkflowError::NotPending.code(), "approval_not_pending");
        assert_eq!(WorkflowError::CannotDeleteStep.code(), "cannot_delete_this_step");
        assert_eq!(WorkflowError::DuplicatedName.code(), "duplicated_name");
        assert_eq!(WorkflowError::NoActiveStep.code(), "no_active_step");
    }
}
