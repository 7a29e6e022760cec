use std::sync::Arc;

use portal_core::navigation::NavNode;
use portal_events::Mailer;

use crate::config::ServerConfig;
use crate::storage::AttachmentStore;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind an `Arc` or is already a handle.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: portal_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Outbound mail transport (SMTP, or log-only when unconfigured).
    pub mailer: Arc<dyn Mailer>,
    /// Attachment file store.
    pub attachments: Arc<AttachmentStore>,
    /// Full navigation tree, filtered per caller.
    pub navigation: Arc<Vec<NavNode>>,
}
