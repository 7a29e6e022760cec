//! Errors shared by every layer of the portal.

use crate::approval::WorkflowError;
use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    #[error("{0}")]
    Validation(String),

    /// Missing or invalid credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated, but not allowed.
    #[error("{0}")]
    Forbidden(String),

    /// A workflow rule refused the operation; carries its own wire code.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}
