//! Shared query parameter types for API handlers.

use chrono::NaiveDate;
use portal_core::search::SearchScope;
use serde::Deserialize;

/// `?limit=` for plain listings. Clamped by the handler.
#[derive(Debug, Deserialize)]
pub struct LimitParams {
    pub limit: Option<i64>,
}

/// Query parameters for `GET /approvals/search`.
#[derive(Debug, Default, Deserialize)]
pub struct ApprovalSearchParams {
    pub q: Option<String>,
    #[serde(default)]
    pub scope: SearchScope,
    /// `pending`, `approved`, `rejected`, or `all` / absent for no filter.
    pub status: Option<String>,
    /// Inclusive first submission day (UTC).
    pub date_from: Option<NaiveDate>,
    /// Inclusive last submission day (UTC).
    pub date_to: Option<NaiveDate>,
    pub limit: Option<i64>,
}

/// Query parameters for `GET /directory/approvers`.
#[derive(Debug, Deserialize)]
pub struct DepartmentParams {
    pub dept: String,
}

/// Query parameters for `GET /directory/search`.
#[derive(Debug, Deserialize)]
pub struct DirectorySearchParams {
    #[serde(default)]
    pub q: String,
    pub limit: Option<i64>,
}
