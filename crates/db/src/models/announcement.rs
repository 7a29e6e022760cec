//! Announcement model.

use portal_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// `announcements.source` for notices published by a completed approval.
pub const SOURCE_APPROVAL: &str = "approval";

/// A row from the `announcements` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Announcement {
    pub id: DbId,
    pub title: String,
    pub body: String,
    pub visibility: String,
    pub author: String,
    pub source: String,
    pub source_id: Option<DbId>,
    pub created_at: Timestamp,
}

/// DTO for publishing an announcement.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAnnouncement {
    pub title: String,
    pub body: String,
    pub visibility: String,
    pub author: String,
    pub source: String,
    pub source_id: Option<DbId>,
}
