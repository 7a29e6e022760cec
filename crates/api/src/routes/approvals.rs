//! Route definitions for the `/approvals` resource.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::{approval, attachments, steps, versions};
use crate::state::AppState;

/// Routes mounted at `/approvals`.
///
/// ```text
/// POST   /                                  create (JSON)
/// POST   /upload                            create_upload (multipart)
/// GET    /inbox                             inbox
/// GET    /search                            search
/// GET    /{id}                              get_by_id
/// PUT    /{id}                              update
/// POST   /{id}/decision                     decide
/// POST   /{id}/steps                        steps::append
/// POST   /{id}/steps/reorder                steps::reorder
/// DELETE /{id}/steps/{step_id}              steps::delete
/// GET    /{id}/versions                     versions::list
/// GET    /{id}/versions/{version}           versions::get
/// POST   /{id}/attachments                  attachments::upload
/// GET    /{id}/attachments/{attachment_id}  attachments::download
/// DELETE /{id}/attachments/{attachment_id}  attachments::delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(approval::create))
        .route("/upload", post(approval::create_upload))
        .route("/inbox", get(approval::inbox))
        .route("/search", get(approval::search))
        .route("/{id}", get(approval::get_by_id).put(approval::update))
        .route("/{id}/decision", post(approval::decide))
        .route("/{id}/steps", post(steps::append))
        .route("/{id}/steps/reorder", post(steps::reorder))
        .route("/{id}/steps/{step_id}", delete(steps::delete))
        .route("/{id}/versions", get(versions::list))
        .route("/{id}/versions/{version}", get(versions::get))
        .route("/{id}/attachments", post(attachments::upload))
        .route(
            "/{id}/attachments/{attachment_id}",
            get(attachments::download).delete(attachments::delete),
        )
}
