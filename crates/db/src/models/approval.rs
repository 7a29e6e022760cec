//! Approval request, step, action, and version models.

use portal_core::approval::{ApprovalStatus, VisibilityScope};
use portal_core::chain::StepPosition;
use portal_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `approvals` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Approval {
    pub id: DbId,
    pub subject: String,
    pub description: String,
    pub confidential_note: Option<String>,
    pub requester: String,
    pub requester_dept: String,
    pub submitted_at: Timestamp,
    pub status: String,
    pub current_step: i32,
    pub visibility_scope: String,
    pub publish_on_complete: bool,
}

impl Approval {
    pub fn is_pending(&self) -> bool {
        self.status == ApprovalStatus::Pending.as_str()
    }

    /// Parsed visibility scope. Unknown values fail closed as `restricted`.
    pub fn scope(&self) -> VisibilityScope {
        VisibilityScope::parse(&self.visibility_scope).unwrap_or(VisibilityScope::Restricted)
    }
}

/// DTO for inserting a new request.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateApproval {
    pub subject: String,
    pub description: String,
    pub confidential_note: Option<String>,
    pub requester: String,
    pub requester_dept: String,
    pub visibility_scope: String,
    pub publish_on_complete: bool,
}

/// Content patch. `None` leaves a column unchanged; `confidential_note` is
/// cleared with `Some(None)`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateApproval {
    pub subject: Option<String>,
    pub description: Option<String>,
    #[serde(default, with = "double_option")]
    pub confidential_note: Option<Option<String>>,
    pub visibility_scope: Option<String>,
    pub publish_on_complete: Option<bool>,
}

/// Distinguishes an absent field from an explicit `null`.
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

/// A row from the `approval_steps` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ApprovalStep {
    pub id: DbId,
    pub approval_id: DbId,
    pub step_order: i32,
    pub approver_name: String,
    pub approver_email: Option<String>,
    pub status: String,
    pub decided_at: Option<Timestamp>,
    pub comment: Option<String>,
}

impl ApprovalStep {
    pub fn is_pending(&self) -> bool {
        self.status == ApprovalStatus::Pending.as_str()
    }

    /// The fields chain rules operate on.
    ///
    /// The `CHECK` constraint keeps `status` to known values; anything else is
    /// treated as decided so it can never be moved.
    pub fn position(&self) -> StepPosition {
        StepPosition {
            id: self.id,
            step_order: self.step_order,
            status: ApprovalStatus::parse(&self.status).unwrap_or(ApprovalStatus::Rejected),
        }
    }
}

/// A row from the append-only `approval_actions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ApprovalAction {
    pub id: DbId,
    pub approval_id: DbId,
    pub step_id: Option<DbId>,
    pub actor: String,
    pub action: String,
    pub note: Option<String>,
    pub created_at: Timestamp,
}

/// A full row from the `approval_versions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ApprovalVersion {
    pub id: DbId,
    pub approval_id: DbId,
    pub version: i32,
    pub snapshot: serde_json::Value,
    pub change_description: String,
    pub actor: String,
    pub created_at: Timestamp,
}

/// Version history entry without the snapshot body.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ApprovalVersionSummary {
    pub id: DbId,
    pub version: i32,
    pub change_description: String,
    pub actor: String,
    pub created_at: Timestamp,
}

/// Filters for [`ApprovalRepo::search`](crate::repositories::ApprovalRepo::search).
///
/// Every `None` disables its filter.
#[derive(Debug, Clone, Default)]
pub struct ApprovalSearchFilter {
    pub status: Option<String>,
    pub submitted_from: Option<Timestamp>,
    pub submitted_before: Option<Timestamp>,
    /// `ILIKE` pattern, already escaped.
    pub pattern: Option<String>,
    /// Folded identity keys; restricts to requests whose requester is one of them.
    pub requester_keys: Option<Vec<String>>,
    /// Folded identity keys; restricts to pending requests whose active step
    /// belongs to one of them.
    pub approver_keys: Option<Vec<String>>,
    pub limit: i64,
    pub offset: i64,
}

/// One search hit, with the chain's approver names for visibility checks.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ApprovalSearchRow {
    pub id: DbId,
    pub subject: String,
    pub description: String,
    pub requester: String,
    pub requester_dept: String,
    pub submitted_at: Timestamp,
    pub status: String,
    pub current_step: i32,
    pub visibility_scope: String,
    pub approver_names: Vec<String>,
    /// Approver of the active step, if the request is pending.
    pub active_approver: Option<String>,
}

impl ApprovalSearchRow {
    pub fn scope(&self) -> VisibilityScope {
        VisibilityScope::parse(&self.visibility_scope).unwrap_or(VisibilityScope::Restricted)
    }
}
