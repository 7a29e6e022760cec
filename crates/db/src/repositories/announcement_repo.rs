//! Repository for the `announcements` table.

use sqlx::PgPool;

use crate::models::announcement::{Announcement, CreateAnnouncement};
use crate::Tx;

const COLUMNS: &str = "id, title, body, visibility, author, source, source_id, created_at";

/// Completion notices and other portal announcements.
pub struct AnnouncementRepo;

impl AnnouncementRepo {
    /// Publish an announcement inside the caller's transaction.
    pub async fn create(
        tx: &mut Tx<'_>,
        input: &CreateAnnouncement,
    ) -> Result<Announcement, sqlx::Error> {
        let query = format!(
            "INSERT INTO announcements (title, body, visibility, author, source, source_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Announcement>(&query)
            .bind(&input.title)
            .bind(&input.body)
            .bind(&input.visibility)
            .bind(&input.author)
            .bind(&input.source)
            .bind(input.source_id)
            .fetch_one(&mut **tx)
            .await
    }

    /// Newest-first announcements a caller may read.
    ///
    /// With `author_keys = None` every row is returned (admin view); otherwise
    /// `org` rows plus rows whose folded author is one of the keys.
    pub async fn list_visible(
        pool: &PgPool,
        author_keys: Option<&[String]>,
        limit: i64,
    ) -> Result<Vec<Announcement>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM announcements
             WHERE $1::text[] IS NULL
                OR visibility = 'org'
                OR LOWER(REGEXP_REPLACE(TRIM(author), '\\s+', ' ', 'g')) = ANY($1)
             ORDER BY created_at DESC, id DESC
             LIMIT $2"
        );
        sqlx::query_as::<_, Announcement>(&query)
            .bind(author_keys)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
