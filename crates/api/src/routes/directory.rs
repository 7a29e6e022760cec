//! Route definitions for the `/directory` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::directory;
use crate::state::AppState;

/// Routes mounted at `/directory`.
///
/// ```text
/// GET /departments          departments
/// GET /approvers?dept=      approvers
/// GET /search?q=&limit=     search
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/departments", get(directory::departments))
        .route("/approvers", get(directory::approvers))
        .route("/search", get(directory::search))
}
