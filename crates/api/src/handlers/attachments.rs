//! Handlers for `/approvals/{id}/attachments`, plus the multipart reader the
//! upload-on-create endpoint shares.

use std::collections::HashMap;

use axum::body::Body;
use axum::extract::{Multipart, Path, State};
use axum::http::header;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use portal_core::types::DbId;
use tokio_util::io::ReaderStream;

use crate::engine::attachments::{self, Upload};
use crate::engine::Actor;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireApprovals;
use crate::response::DataResponse;
use crate::state::AppState;

/// A parsed multipart body: text fields by name (repeatable) and files.
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, Vec<String>>,
    pub files: Vec<Upload>,
}

impl MultipartForm {
    /// Last value of a text field.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(|v| v.last())
            .map(String::as_str)
    }

    pub fn all(&self, name: &str) -> &[String] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Read every field; parts carrying a filename are treated as files.
pub async fn read_multipart(mut multipart: Multipart) -> AppResult<MultipartForm> {
    let mut form = MultipartForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match field.file_name().map(str::to_string) {
            Some(filename) => {
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                // Browsers send an empty part for an untouched file input.
                if filename.is_empty() && bytes.is_empty() {
                    continue;
                }
                form.files.push(Upload {
                    filename,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            None => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                form.fields.entry(name).or_default().push(text);
            }
        }
    }
    Ok(form)
}

/// POST /api/v1/approvals/{id}/attachments
///
/// Multipart upload; every file part is attached. Requester or admin, and
/// only while pending.
pub async fn upload(
    RequireApprovals(auth): RequireApprovals,
    State(state): State<AppState>,
    Path(approval_id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let form = read_multipart(multipart).await?;
    let actor = Actor::load(&state.pool, &auth).await;
    let rows = attachments::add(&state, &actor, approval_id, form.files).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: rows })))
}

/// GET /api/v1/approvals/{id}/attachments/{attachment_id}
///
/// Streams the file to anyone who may view the request.
pub async fn download(
    RequireApprovals(auth): RequireApprovals,
    State(state): State<AppState>,
    Path((approval_id, attachment_id)): Path<(DbId, DbId)>,
) -> AppResult<Response> {
    let actor = Actor::load(&state.pool, &auth).await;
    let (attachment, file) = attachments::open(&state, &actor, approval_id, attachment_id).await?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        attachment.original_filename.replace('"', "")
    );
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, attachment.content_type)
        .header(header::CONTENT_LENGTH, attachment.size_bytes.to_string())
        .header(header::CONTENT_DISPOSITION, disposition)
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| AppError::InternalError(format!("Failed to build download response: {e}")))
}

/// DELETE /api/v1/approvals/{id}/attachments/{attachment_id}
pub async fn delete(
    RequireApprovals(auth): RequireApprovals,
    State(state): State<AppState>,
    Path((approval_id, attachment_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    let actor = Actor::load(&state.pool, &auth).await;
    attachments::remove(&state, &actor, approval_id, attachment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
