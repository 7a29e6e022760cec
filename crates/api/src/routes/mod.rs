pub mod admin;
pub mod approvals;
pub mod auth;
pub mod directory;
pub mod health;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                                      login (public)
/// /me                                              caller, identity keys, navigation
///
/// /approvals                                       create, search, inbox, detail
/// /approvals/{id}/decision                         approve / reject / acknowledge
/// /approvals/{id}/steps                            chain edits
/// /approvals/{id}/versions                         version history
/// /approvals/{id}/attachments                      upload, download, delete
///
/// /directory/departments                           department list
/// /directory/approvers                             picker names by department
/// /directory/search                                directory search
///
/// /announcements                                   completion notices
///
/// /admin/approvals/renumber                        heal every chain (admin only)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .route("/me", get(handlers::me::me))
        .nest("/approvals", approvals::router())
        .nest("/directory", directory::router())
        .route("/announcements", get(handlers::announcements::list))
        .nest("/admin", admin::router())
}
