//! Route definitions for the `/admin` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin` (admin role required).
///
/// ```text
/// POST /approvals/renumber   renumber_approvals
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/approvals/renumber", post(admin::renumber_approvals))
}
