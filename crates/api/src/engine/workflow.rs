//! Submitting, deciding, and editing approval requests.

use portal_core::approval::{
    advance, normalize_comment, validate_subject, ActionKind, Advance, ApprovalStatus, Decision,
    VisibilityScope, WorkflowError, NO_CURRENT_STEP,
};
use portal_core::error::CoreError;
use portal_core::identity::{email_for, normalize, resolve_approver, DirectoryEntry};
use portal_core::search::strip_html;
use portal_core::types::DbId;
use portal_db::models::announcement::{CreateAnnouncement, SOURCE_APPROVAL};
use portal_db::models::approval::{Approval, ApprovalStep, CreateApproval, UpdateApproval};
use portal_db::repositories::{
    AnnouncementRepo, ApprovalActionRepo, ApprovalRepo, ApprovalStepRepo,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

use super::access::{approval_not_found, lock_for_change};
use super::attachments::{self, Upload, Written};
use super::notify::{self, Notice};
use super::{directory, snapshot, Actor};

/// Body of a new request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewApproval {
    pub subject: String,
    #[serde(default)]
    pub description: String,
    pub confidential_note: Option<String>,
    #[serde(default)]
    pub requester_dept: String,
    /// Approver display names in chain order.
    #[serde(default)]
    pub approver_names: Vec<String>,
    pub visibility_scope: Option<String>,
    #[serde(default)]
    pub publish_on_complete: bool,
}

/// Body of a decision on the active step.
#[derive(Debug, Clone, Deserialize)]
pub struct DecisionInput {
    pub action: String,
    pub comment: Option<String>,
}

/// Where a request stands after a decision.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionOutcome {
    pub approval_id: DbId,
    pub decision: Decision,
    pub status: ApprovalStatus,
    pub current_step: i32,
}

fn parse_scope(raw: Option<&str>) -> AppResult<VisibilityScope> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(VisibilityScope::Org),
        Some(s) => VisibilityScope::parse(s).ok_or_else(|| {
            AppError::Core(CoreError::Validation(format!(
                "Invalid visibility_scope '{s}'. Must be one of: org, restricted, top_secret"
            )))
        }),
    }
}

fn blank_to_none(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Submit a request: chain, audit row, first version, then mail the first
/// approver.
pub async fn create(
    state: &AppState,
    actor: &Actor,
    input: NewApproval,
    uploads: Vec<Upload>,
) -> AppResult<Approval> {
    let names: Vec<String> = input
        .approver_names
        .iter()
        .map(|n| normalize(n))
        .filter(|n| !n.is_empty())
        .collect();
    if names.is_empty() {
        return Err(WorkflowError::ApproverRequired.into());
    }
    let subject = validate_subject(&input.subject).map_err(CoreError::Validation)?;
    let scope = parse_scope(input.visibility_scope.as_deref())?;

    let entries = directory::load(&state.pool).await;
    let requester_dept = input.requester_dept.trim().to_string();
    let new = CreateApproval {
        subject,
        description: input.description,
        confidential_note: blank_to_none(input.confidential_note),
        requester: actor.login.clone(),
        requester_dept,
        visibility_scope: scope.as_str().to_string(),
        publish_on_complete: input.publish_on_complete,
    };

    let mut written = Written::default();
    let (approval, steps) =
        match submit(state, actor, &new, &names, &entries, uploads, &mut written).await {
            Ok(created) => created,
            Err(e) => {
                written.discard(&state.attachments).await;
                return Err(e);
            }
        };

    tracing::info!(
        approval_id = approval.id,
        requester = %approval.requester,
        steps = steps.len(),
        attachments = written.len(),
        "Approval submitted"
    );

    if let Some(first) = steps.first() {
        let email = first
            .approver_email
            .clone()
            .or_else(|| email_for(&entries, &first.approver_name));
        notify::deliver(state.mailer.as_ref(), Notice::approver_turn(&approval, email)).await;
    }
    Ok(approval)
}

async fn submit(
    state: &AppState,
    actor: &Actor,
    new: &CreateApproval,
    names: &[String],
    entries: &[DirectoryEntry],
    uploads: Vec<Upload>,
    written: &mut Written,
) -> AppResult<(Approval, Vec<ApprovalStep>)> {
    let mut tx = state.pool.begin().await?;
    let approval = ApprovalRepo::create(&mut tx, new).await?;

    let mut steps = Vec::with_capacity(names.len());
    for (order, name) in (0..).zip(names) {
        let resolved = resolve_approver(entries, name);
        let step = ApprovalStepRepo::create(
            &mut tx,
            approval.id,
            order,
            &resolved.name,
            resolved.email.as_deref(),
        )
        .await?;
        steps.push(step);
    }

    ApprovalActionRepo::record(
        &mut tx,
        approval.id,
        None,
        &actor.login,
        ActionKind::Submit,
        None,
    )
    .await?;
    attachments::store_all(state, &mut tx, approval.id, &actor.login, uploads, written).await?;
    snapshot::record(&mut tx, &approval, snapshot::CHANGE_SUBMITTED, &actor.login).await?;
    tx.commit().await?;

    Ok((approval, steps))
}

/// Record a decision on the active step and move the request along.
pub async fn decide(
    state: &AppState,
    actor: &Actor,
    approval_id: DbId,
    input: DecisionInput,
) -> AppResult<DecisionOutcome> {
    let decision = Decision::parse(&input.action)?;
    let comment = normalize_comment(decision, input.comment.as_deref())?;
    let entries = directory::load(&state.pool).await;

    let mut tx = state.pool.begin().await?;
    let approval = ApprovalRepo::lock(&mut tx, approval_id)
        .await?
        .ok_or_else(|| approval_not_found(approval_id))?;
    if !approval.is_pending() {
        return Err(WorkflowError::NotPending.into());
    }

    let steps = ApprovalStepRepo::list_for_approval(&mut *tx, approval_id).await?;
    let active = steps
        .iter()
        .find(|s| s.step_order == approval.current_step && s.is_pending())
        .ok_or(WorkflowError::NoActiveStep)?;
    if !actor.keys.matches(&active.approver_name) {
        return Err(WorkflowError::NotYourStep.into());
    }

    if !ApprovalStepRepo::decide(&mut tx, active.id, decision.step_status(), &comment).await? {
        return Err(WorkflowError::NoActiveStep.into());
    }
    ApprovalActionRepo::record(
        &mut tx,
        approval_id,
        Some(active.id),
        &actor.login,
        decision.action_kind(),
        Some(&comment),
    )
    .await?;

    let requester_email = || email_for(&entries, &approval.requester);

    let (status, current_step, notice) = match decision {
        Decision::Reject => {
            ApprovalRepo::resolve(&mut tx, approval_id, ApprovalStatus::Rejected).await?;
            let notice = Notice::rejected(&approval, requester_email(), &actor.login, &comment);
            (ApprovalStatus::Rejected, NO_CURRENT_STEP, notice)
        }
        Decision::Approve | Decision::Acknowledge => {
            match advance(approval.current_step, steps.len() as i64) {
                Advance::Complete => {
                    ApprovalRepo::resolve(&mut tx, approval_id, ApprovalStatus::Approved).await?;
                    if approval.publish_on_complete {
                        publish(&mut tx, &approval).await?;
                    }
                    (
                        ApprovalStatus::Approved,
                        NO_CURRENT_STEP,
                        Notice::completed(&approval, requester_email()),
                    )
                }
                Advance::Next(next) => {
                    ApprovalRepo::set_current_step(&mut tx, approval_id, next).await?;
                    let email = steps
                        .iter()
                        .find(|s| s.step_order == next)
                        .and_then(|s| {
                            s.approver_email
                                .clone()
                                .or_else(|| email_for(&entries, &s.approver_name))
                        });
                    (
                        ApprovalStatus::Pending,
                        next,
                        Notice::approver_turn(&approval, email),
                    )
                }
            }
        }
    };
    tx.commit().await?;

    tracing::info!(
        approval_id,
        actor = %actor.login,
        decision = decision.as_str(),
        status = status.as_str(),
        current_step,
        "Approval decision recorded"
    );

    notify::deliver(state.mailer.as_ref(), notice).await;
    Ok(DecisionOutcome {
        approval_id,
        decision,
        status,
        current_step,
    })
}

/// Publish the completion announcement inside the deciding transaction.
async fn publish(tx: &mut portal_db::Tx<'_>, approval: &Approval) -> Result<(), sqlx::Error> {
    let visibility = approval.scope().announcement_visibility();
    let announcement = AnnouncementRepo::create(
        tx,
        &CreateAnnouncement {
            title: approval.subject.clone(),
            body: strip_html(&approval.description).trim().to_string(),
            visibility: visibility.as_str().to_string(),
            author: approval.requester.clone(),
            source: SOURCE_APPROVAL.to_string(),
            source_id: Some(approval.id),
        },
    )
    .await?;
    tracing::info!(
        approval_id = approval.id,
        announcement_id = announcement.id,
        visibility = visibility.as_str(),
        "Completion announcement published"
    );
    Ok(())
}

/// Edit subject, description, note, scope, or the publish flag.
pub async fn update_content(
    state: &AppState,
    actor: &Actor,
    approval_id: DbId,
    patch: UpdateApproval,
) -> AppResult<Approval> {
    let subject = patch
        .subject
        .as_deref()
        .map(validate_subject)
        .transpose()
        .map_err(CoreError::Validation)?;
    let visibility_scope = match patch.visibility_scope.as_deref() {
        Some(raw) => Some(parse_scope(Some(raw))?.as_str().to_string()),
        None => None,
    };
    let patch = UpdateApproval {
        subject,
        visibility_scope,
        confidential_note: patch.confidential_note.map(blank_to_none),
        ..patch
    };

    let mut tx = state.pool.begin().await?;
    lock_for_change(&mut tx, actor, approval_id).await?;
    let updated = ApprovalRepo::update_content(&mut tx, approval_id, &patch).await?;
    ApprovalActionRepo::record(
        &mut tx,
        approval_id,
        None,
        &actor.login,
        ActionKind::UpdateContent,
        None,
    )
    .await?;
    snapshot::record(&mut tx, &updated, snapshot::CHANGE_CONTENT, &actor.login).await?;
    tx.commit().await?;

    tracing::info!(approval_id, actor = %actor.login, "Approval content updated");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn scope_defaults_to_org() {
        assert_eq!(parse_scope(None).unwrap(), VisibilityScope::Org);
        assert_eq!(parse_scope(Some("  ")).unwrap(), VisibilityScope::Org);
        assert_eq!(parse_scope(Some("top_secret")).unwrap(), VisibilityScope::TopSecret);
    }

    #[test]
    fn unknown_scope_is_a_validation_error() {
        assert_matches!(
            parse_scope(Some("everyone")),
            Err(AppError::Core(CoreError::Validation(_)))
        );
    }

    #[test]
    fn blank_notes_are_dropped() {
        assert_eq!(blank_to_none(Some("  ".into())), None);
        assert_eq!(blank_to_none(Some(" keep ".into())).as_deref(), Some("keep"));
    }
}
