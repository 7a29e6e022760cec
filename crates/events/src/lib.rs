//! Outbound notifications for the portal.
//!
//! - [`Mailer`]: the transport seam the workflow engine sends through.
//! - [`delivery`]: concrete transports (SMTP, log-only).

pub mod delivery;
pub mod mailer;

pub use delivery::email::{EmailConfig, EmailError, SmtpMailer, SmtpSecurity};
pub use delivery::log::LogMailer;
pub use mailer::Mailer;
