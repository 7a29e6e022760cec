//! The mail transport seam.

use async_trait::async_trait;

use crate::delivery::email::EmailError;

/// Sends one plain-text message to a list of recipients.
///
/// Implementations must be cheap to share; the API keeps one behind an `Arc`
/// for the life of the process.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &[String], subject: &str, body: &str) -> Result<(), EmailError>;
}
