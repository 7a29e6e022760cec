//! SMTP transport for workflow mail.
//!
//! Configured from `SMTP_*` variables. Without `SMTP_HOST`,
//! [`EmailConfig::from_env`] yields `None` and the server falls back to
//! [`LogMailer`](crate::LogMailer).

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::mailer::Mailer;

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Email build error: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("Message has no recipients")]
    NoRecipients,
}

const DEFAULT_FROM_ADDRESS: &str = "Hotel Portal <portal-noreply@hotel.local>";

/// Prefix added to every subject line.
pub const SUBJECT_PREFIX: &str = "[Portal]";

/// How the connection to the relay is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpSecurity {
    /// Upgrade a plain connection (port 587).
    StartTls,
    /// TLS from the first byte (port 465).
    Tls,
    /// No encryption; local catch-all relays only.
    None,
}

impl SmtpSecurity {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "starttls" => Some(Self::StartTls),
            "tls" | "ssl" => Some(Self::Tls),
            "none" | "plain" => Some(Self::None),
            _ => None,
        }
    }

    fn default_port(self) -> u16 {
        match self {
            Self::StartTls => 587,
            Self::Tls => 465,
            Self::None => 25,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub security: SmtpSecurity,
    /// `From` header, either a bare address or `Name <address>`.
    pub from_address: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
}

impl EmailConfig {
    /// | Variable        | Default                                     |
    /// |-----------------|---------------------------------------------|
    /// | `SMTP_HOST`     | unset disables SMTP                         |
    /// | `SMTP_SECURITY` | `starttls` (`tls`, `none` also accepted)    |
    /// | `SMTP_PORT`     | 587 / 465 / 25 by security mode             |
    /// | `SMTP_FROM`     | `Hotel Portal <portal-noreply@hotel.local>` |
    /// | `SMTP_USER`     | none                                        |
    /// | `SMTP_PASSWORD` | none                                        |
    ///
    /// Unparseable `SMTP_SECURITY` or `SMTP_PORT` values fall back to the
    /// defaults with a warning.
    pub fn from_env() -> Option<Self> {
        let var = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());

        let smtp_host = var("SMTP_HOST")?;
        let security = match var("SMTP_SECURITY") {
            Some(raw) => SmtpSecurity::parse(&raw).unwrap_or_else(|| {
                tracing::warn!(value = %raw, "Unknown SMTP_SECURITY; using starttls");
                SmtpSecurity::StartTls
            }),
            None => SmtpSecurity::StartTls,
        };
        let smtp_port = match var("SMTP_PORT").map(|p| p.trim().parse::<u16>()) {
            Some(Ok(port)) => port,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "Invalid SMTP_PORT; using the default");
                security.default_port()
            }
            None => security.default_port(),
        };

        Some(Self {
            smtp_host,
            smtp_port,
            security,
            from_address: var("SMTP_FROM").unwrap_or_else(|| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: var("SMTP_USER"),
            smtp_password: var("SMTP_PASSWORD"),
        })
    }
}

/// Sends through one SMTP relay. Connections are pooled by `lettre`.
pub struct SmtpMailer {
    from: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("from", &format_args!("{}", self.from))
            .finish_non_exhaustive()
    }
}

impl SmtpMailer {
    /// Validates the sender and builds the transport; nothing connects until
    /// the first send.
    pub fn new(config: EmailConfig) -> Result<Self, EmailError> {
        let from: Mailbox = config.from_address.parse()?;
        let host = config.smtp_host.as_str();
        let builder = match config.security {
            SmtpSecurity::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?,
            SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(host)?,
            SmtpSecurity::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host),
        };
        let builder = builder.port(config.smtp_port);
        let builder = match (config.smtp_user, config.smtp_password) {
            (Some(user), Some(pass)) => builder.credentials(Credentials::new(user, pass)),
            _ => builder,
        };

        Ok(Self {
            from,
            transport: builder.build(),
        })
    }

    fn build_message(&self, to: &[String], subject: &str, body: &str) -> Result<Message, EmailError> {
        if to.is_empty() {
            return Err(EmailError::NoRecipients);
        }
        let builder = to.iter().try_fold(
            Message::builder()
                .from(self.from.clone())
                .subject(format!("{SUBJECT_PREFIX} {subject}"))
                .header(ContentType::TEXT_PLAIN),
            |builder, address| Ok::<_, EmailError>(builder.to(address.parse()?)),
        )?;
        Ok(builder.body(body.to_string())?)
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &[String], subject: &str, body: &str) -> Result<(), EmailError> {
        let message = self.build_message(to, subject, body)?;
        self.transport.send(message).await?;
        tracing::info!(recipients = to.len(), subject, "Workflow mail sent");
        Ok(())
    }
}
