//! Mailer used when SMTP is not configured.

use async_trait::async_trait;

use crate::delivery::email::EmailError;
use crate::mailer::Mailer;

/// Writes each message to the log instead of sending it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &[String], subject: &str, body: &str) -> Result<(), EmailError> {
        tracing::info!(
            to = ?to,
            subject,
            body_len = body.len(),
            "SMTP not configured; notification logged only"
        );
        Ok(())
    }
}
