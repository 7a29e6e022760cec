//! HTTP error mapping.
//!
//! Every failure leaves a handler as an [`AppError`] and reaches the client
//! as `{"error": message, "code": code}`. Workflow errors keep their
//! snake_case codes; generic errors use upper-case codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use portal_core::approval::WorkflowError;
use portal_core::error::CoreError;
use serde_json::json;

use crate::storage::StorageError;

const SANITIZED: &str = "An internal error occurred";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Malformed input the domain never saw, e.g. a broken multipart body.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Logged in full, returned sanitized.
    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        AppError::Core(CoreError::Workflow(err))
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidName(name) => {
                AppError::BadRequest(format!("Invalid stored filename: {name}"))
            }
            StorageError::Io(e) => AppError::InternalError(format!("Attachment store: {e}")),
        }
    }
}

/// HTTP status for a workflow error; the body code is [`WorkflowError::code`].
pub fn workflow_status(err: &WorkflowError) -> StatusCode {
    use WorkflowError::*;
    match err {
        ApproverRequired | CommentRequired | InvalidDisplayName | InvalidAction(_)
        | InvalidIds => StatusCode::BAD_REQUEST,
        NotYourStep | OnlyRequesterOrAdmin => StatusCode::FORBIDDEN,
        NoActiveStep | NotPending | CannotDeleteStep | DuplicatedName | RenumberConflict => {
            StatusCode::CONFLICT
        }
    }
}

impl AppError {
    /// Status, wire code, and client-facing message.
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Core(CoreError::NotFound { entity, id }) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("{entity} with id {id} not found"),
            ),
            AppError::Core(CoreError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Core(CoreError::Unauthorized(msg)) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
            }
            AppError::Core(CoreError::Forbidden(msg)) => {
                (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone())
            }
            AppError::Core(CoreError::Workflow(err)) => {
                (workflow_status(err), err.code(), err.to_string())
            }
            AppError::Database(err) => database_parts(err),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        }
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        SANITIZED.to_string(),
    )
}

/// `RowNotFound` is 404, a unique violation on a `uq_` constraint is 409,
/// a `ck_` check violation is 400. Anything else is a sanitized 500.
fn database_parts(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    if let sqlx::Error::RowNotFound = err {
        return (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        );
    }
    if let sqlx::Error::Database(db_err) = err {
        let constraint = db_err.constraint().unwrap_or_default();
        match db_err.code().as_deref() {
            Some("23505") if constraint.starts_with("uq_") => {
                return (
                    StatusCode::CONFLICT,
                    "CONFLICT",
                    format!("Duplicate value violates unique constraint: {constraint}"),
                );
            }
            Some("23514") if constraint.starts_with("ck_") => {
                return (
                    StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR",
                    format!("Value violates check constraint: {constraint}"),
                );
            }
            _ => {}
        }
    }
    tracing::error!(error = %err, "Database error");
    internal()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        (status, axum::Json(json!({ "error": message, "code": code }))).into_response()
    }
}
