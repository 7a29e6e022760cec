//! Approval listing: SQL filters first, then visibility checks in memory.
//!
//! Rows are scanned a page at a time until enough visible hits are found or
//! the filtered set is exhausted.

use chrono::{DateTime, NaiveDate, Utc};
use portal_core::approval::ApprovalStatus;
use portal_core::search::{
    clamp_limit, contains_pattern, parse_status_filter, preview, SearchScope, SEARCH_SCAN_LIMIT,
};
use portal_core::types::{DbId, Timestamp};
use portal_core::visibility::{can_list, is_participant};
use portal_db::models::approval::{ApprovalSearchFilter, ApprovalSearchRow};
use portal_db::repositories::ApprovalRepo;
use serde::Serialize;
use sqlx::PgPool;

use crate::error::AppResult;
use crate::query::ApprovalSearchParams;

use super::Actor;

/// One listed request. The description is reduced to a plain-text preview.
#[derive(Debug, Clone, Serialize)]
pub struct ApprovalSummary {
    pub id: DbId,
    pub subject: String,
    pub preview: String,
    pub requester: String,
    pub requester_dept: String,
    pub submitted_at: Timestamp,
    pub status: String,
    pub current_step: i32,
    pub visibility_scope: String,
    pub approvers: Vec<String>,
    pub active_approver: Option<String>,
}

impl From<ApprovalSearchRow> for ApprovalSummary {
    fn from(row: ApprovalSearchRow) -> Self {
        Self {
            preview: preview(&row.description),
            id: row.id,
            subject: row.subject,
            requester: row.requester,
            requester_dept: row.requester_dept,
            submitted_at: row.submitted_at,
            status: row.status,
            current_step: row.current_step,
            visibility_scope: row.visibility_scope,
            approvers: row.approver_names,
            active_approver: row.active_approver,
        }
    }
}

/// The caller's two queues: waiting on them, and submitted by them.
#[derive(Debug, Clone, Serialize)]
pub struct Inbox {
    pub todo: Vec<ApprovalSummary>,
    pub mine: Vec<ApprovalSummary>,
}

fn start_of_day(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc())
}

fn build_filter(actor: &Actor, params: &ApprovalSearchParams) -> ApprovalSearchFilter {
    let status = match params.scope {
        SearchScope::Todo => Some(ApprovalStatus::Pending),
        _ => parse_status_filter(params.status.as_deref()),
    };
    let (requester_keys, approver_keys) = match params.scope {
        SearchScope::Mine => (Some(actor.keys.sorted()), None),
        SearchScope::Todo => (None, Some(actor.keys.sorted())),
        SearchScope::All => (None, None),
    };
    ApprovalSearchFilter {
        status: status.map(|s| s.as_str().to_string()),
        submitted_from: params.date_from.and_then(start_of_day),
        // Inclusive end date: everything before the following midnight.
        submitted_before: params
            .date_to
            .and_then(|d| d.succ_opt())
            .and_then(start_of_day),
        pattern: params.q.as_deref().and_then(contains_pattern),
        requester_keys,
        approver_keys,
        limit: SEARCH_SCAN_LIMIT,
        offset: 0,
    }
}

fn keep(actor: &Actor, scope: SearchScope, row: &ApprovalSearchRow) -> bool {
    if scope == SearchScope::Todo
        && !row
            .active_approver
            .as_deref()
            .is_some_and(|name| actor.keys.matches(name))
    {
        return false;
    }
    let participant = is_participant(
        &actor.keys,
        &row.requester,
        row.approver_names.iter().map(String::as_str),
    );
    can_list(row.scope(), actor.viewer(), participant)
}

/// Search requests the actor may list, newest first.
pub async fn search(
    pool: &PgPool,
    actor: &Actor,
    params: &ApprovalSearchParams,
) -> AppResult<Vec<ApprovalSummary>> {
    let limit = clamp_limit(params.limit) as usize;
    let mut filter = build_filter(actor, params);
    let mut hits: Vec<ApprovalSummary> = Vec::new();
    let mut scanned = 0;

    loop {
        let rows = ApprovalRepo::search(pool, &filter).await?;
        let fetched = rows.len();
        scanned += fetched;
        hits.extend(
            rows.into_iter()
                .filter(|row| keep(actor, params.scope, row))
                .map(ApprovalSummary::from),
        );
        if hits.len() >= limit || (fetched as i64) < filter.limit {
            break;
        }
        filter.offset += filter.limit;
    }
    hits.truncate(limit);

    tracing::debug!(
        login = %actor.login,
        scope = ?params.scope,
        scanned,
        returned = hits.len(),
        "Approval search"
    );
    Ok(hits)
}

/// Pending work for the actor plus their own submissions.
pub async fn inbox(pool: &PgPool, actor: &Actor, limit: Option<i64>) -> AppResult<Inbox> {
    let todo = search(
        pool,
        actor,
        &ApprovalSearchParams {
            scope: SearchScope::Todo,
            limit,
            ..Default::default()
        },
    )
    .await?;
    let mine = search(
        pool,
        actor,
        &ApprovalSearchParams {
            scope: SearchScope::Mine,
            limit,
            ..Default::default()
        },
    )
    .await?;
    Ok(Inbox { todo, mine })
}
