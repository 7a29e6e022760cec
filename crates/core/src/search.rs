//! Search constants and helpers for the approval listing and the employee
//! directory picker.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::approval::ApprovalStatus;

// ---------------------------------------------------------------------------
// Pagination defaults
// ---------------------------------------------------------------------------

/// Default number of search results.
pub const DEFAULT_SEARCH_LIMIT: i64 = 50;

/// Maximum number of search results.
pub const MAX_SEARCH_LIMIT: i64 = 200;

/// Page size when scanning rows for visibility filtering.
pub const SEARCH_SCAN_LIMIT: i64 = 1000;

/// Length of the plain-text description preview in search results.
pub const PREVIEW_CHARS: usize = 120;

/// Clamp a caller-supplied limit into `1..=MAX_SEARCH_LIMIT`.
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, MAX_SEARCH_LIMIT)
}

// ---------------------------------------------------------------------------
// Scope and status filters
// ---------------------------------------------------------------------------

/// Which requests a search covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    /// Everything the caller may list.
    #[default]
    All,
    /// Pending requests whose active step is the caller's.
    Todo,
    /// Requests the caller submitted.
    Mine,
}

/// Parse a `status` query value; `all`, blank, and unknown values mean no filter.
pub fn parse_status_filter(status: Option<&str>) -> Option<ApprovalStatus> {
    status.and_then(|s| ApprovalStatus::parse(s.trim()))
}

// ---------------------------------------------------------------------------
// Text helpers
// ---------------------------------------------------------------------------

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*?>").expect("valid regex"));

/// Drop HTML tags from rich-text descriptions.
pub fn strip_html(s: &str) -> String {
    TAG_RE.replace_all(s, "").into_owned()
}

/// First [`PREVIEW_CHARS`] characters of the tag-stripped description.
pub fn preview(description: &str) -> String {
    strip_html(description).chars().take(PREVIEW_CHARS).collect()
}

/// Build an `ILIKE` pattern matching `q` anywhere, with wildcards escaped.
///
/// Returns `None` for blank input.
pub fn contains_pattern(q: &str) -> Option<String> {
    let q = q.trim();
    if q.is_empty() {
        return None;
    }
    let escaped = q
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    Some(format!("%{escaped}%"))
}
