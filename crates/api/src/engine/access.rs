//! The acting user and the checks every operation shares.

use portal_core::approval::WorkflowError;
use portal_core::error::CoreError;
use portal_core::identity::{DirectoryEntry, IdentityKeys};
use portal_core::roles::PERM_APPROVALS;
use portal_core::types::DbId;
use portal_core::visibility::{can_read_confidential, can_view, is_participant, Viewer};
use portal_db::models::approval::{Approval, ApprovalAction, ApprovalStep};
use portal_db::models::attachment::Attachment;
use portal_db::repositories::{ApprovalActionRepo, ApprovalRepo, ApprovalStepRepo, AttachmentRepo};
use portal_db::Tx;
use serde::Serialize;
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;

use super::directory;

/// The caller of a workflow operation.
#[derive(Debug, Clone)]
pub struct Actor {
    pub login: String,
    pub is_admin: bool,
    pub has_module_access: bool,
    /// Every name form the caller may act under.
    pub keys: IdentityKeys,
}

impl Actor {
    pub fn new(user: &AuthUser, directory: &[DirectoryEntry]) -> Self {
        Self {
            login: user.loginname.clone(),
            is_admin: user.is_admin(),
            has_module_access: user.has_permission(PERM_APPROVALS),
            keys: IdentityKeys::for_login(&user.loginname, directory),
        }
    }

    /// Build an actor, loading the directory to expand identity keys.
    pub async fn load(pool: &PgPool, user: &AuthUser) -> Self {
        let directory = directory::load(pool).await;
        Self::new(user, &directory)
    }

    pub fn viewer(&self) -> Viewer<'_> {
        Viewer {
            is_admin: self.is_admin,
            has_module_access: self.has_module_access,
            keys: &self.keys,
        }
    }

    pub fn is_requester(&self, approval: &Approval) -> bool {
        self.keys.matches(&approval.requester)
    }

    /// Requester or admin: the only callers allowed to change a request.
    pub fn can_modify(&self, approval: &Approval) -> bool {
        self.is_admin || self.is_requester(approval)
    }

    pub fn is_participant(&self, approval: &Approval, steps: &[ApprovalStep]) -> bool {
        is_participant(
            &self.keys,
            &approval.requester,
            steps.iter().map(|s| s.approver_name.as_str()),
        )
    }
}

pub(crate) fn approval_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Approval",
        id,
    })
}

fn forbidden() -> AppError {
    AppError::Core(CoreError::Forbidden(
        "You do not have access to this approval".into(),
    ))
}

/// Lock a request that the actor is about to change.
///
/// Fails with `only_requester_or_admin` or `approval_not_pending`.
pub async fn lock_for_change(tx: &mut Tx<'_>, actor: &Actor, id: DbId) -> AppResult<Approval> {
    let approval = ApprovalRepo::lock(tx, id)
        .await?
        .ok_or_else(|| approval_not_found(id))?;
    if !actor.can_modify(&approval) {
        return Err(WorkflowError::OnlyRequesterOrAdmin.into());
    }
    if !approval.is_pending() {
        return Err(WorkflowError::NotPending.into());
    }
    Ok(approval)
}

/// Load a request the actor may view, with its chain.
pub async fn load_viewable(
    pool: &PgPool,
    actor: &Actor,
    id: DbId,
) -> AppResult<(Approval, Vec<ApprovalStep>)> {
    let approval = ApprovalRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| approval_not_found(id))?;
    let steps = ApprovalStepRepo::list_for_approval(pool, id).await?;
    let participant = actor.is_participant(&approval, &steps);
    if !can_view(approval.scope(), actor.viewer(), participant) {
        tracing::debug!(approval_id = id, login = %actor.login, "Approval view denied");
        return Err(forbidden());
    }
    Ok((approval, steps))
}

/// Whether the confidential note may be shown to this actor.
pub fn may_read_confidential(actor: &Actor, approval: &Approval, steps: &[ApprovalStep]) -> bool {
    can_read_confidential(actor.viewer(), actor.is_participant(approval, steps))
}

/// Full detail view of one request.
#[derive(Debug, Serialize)]
pub struct ApprovalDetail {
    pub approval: Approval,
    pub steps: Vec<ApprovalStep>,
    pub actions: Vec<ApprovalAction>,
    pub attachments: Vec<Attachment>,
    /// The caller is the approver of the active step.
    pub can_decide: bool,
    /// The caller may change the chain, content, and attachments.
    pub can_modify: bool,
}

/// Detail view, or 404 / 403.
///
/// The confidential note is blanked for viewers who are neither admins nor
/// participants.
pub async fn load_detail(pool: &PgPool, actor: &Actor, id: DbId) -> AppResult<ApprovalDetail> {
    let (mut approval, steps) = load_viewable(pool, actor, id).await?;
    if !may_read_confidential(actor, &approval, &steps) {
        approval.confidential_note = None;
    }

    let actions = ApprovalActionRepo::list_for_approval(pool, id).await?;
    let attachments = AttachmentRepo::list_for_approval(pool, id).await?;

    let can_decide = approval.is_pending()
        && steps.iter().any(|s| {
            s.step_order == approval.current_step
                && s.is_pending()
                && actor.keys.matches(&s.approver_name)
        });
    let can_modify = approval.is_pending() && actor.can_modify(&approval);

    Ok(ApprovalDetail {
        approval,
        steps,
        actions,
        attachments,
        can_decide,
        can_modify,
    })
}
