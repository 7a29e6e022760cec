//! Local filesystem store for approval attachments.
//!
//! Files live at `<root>/<approval_id>/<uuid><ext>`. Only the stored name is
//! ever joined onto the root; original filenames stay in the database.

use std::path::{Path, PathBuf};

use portal_core::attachment::{sanitize_filename, stored_extension};
use portal_core::types::DbId;
use tokio::fs::File;
use uuid::Uuid;

/// Error type for attachment store operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored name that could escape the approval directory.
    #[error("Invalid stored filename: {0}")]
    InvalidName(String),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

/// A file written by [`AttachmentStore::save`].
#[derive(Debug, Clone)]
pub struct StoredFile {
    /// Sanitized original filename, for display and download.
    pub original_filename: String,
    /// Name inside the approval's directory.
    pub stored_filename: String,
    pub size_bytes: i64,
}

/// Attachment files rooted at a configured directory.
#[derive(Debug, Clone)]
pub struct AttachmentStore {
    root: PathBuf,
}

impl AttachmentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, approval_id: DbId, stored_name: &str) -> Result<PathBuf, StorageError> {
        if stored_name.is_empty()
            || stored_name.contains(['/', '\\'])
            || stored_name.starts_with('.')
        {
            return Err(StorageError::InvalidName(stored_name.to_string()));
        }
        Ok(self.root.join(approval_id.to_string()).join(stored_name))
    }

    /// Write `bytes` under a fresh name that keeps the original's last extension.
    pub async fn save(
        &self,
        approval_id: DbId,
        filename: &str,
        bytes: &[u8],
    ) -> Result<StoredFile, StorageError> {
        let original_filename = sanitize_filename(filename);
        let stored_filename = format!("{}{}", Uuid::new_v4(), stored_extension(&original_filename));

        let dir = self.root.join(approval_id.to_string());
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&stored_filename), bytes).await?;

        tracing::debug!(approval_id, stored = %stored_filename, size = bytes.len(), "Attachment saved");
        Ok(StoredFile {
            original_filename,
            stored_filename,
            size_bytes: bytes.len() as i64,
        })
    }

    /// Open a stored file for streaming.
    pub async fn open(&self, approval_id: DbId, stored_name: &str) -> Result<File, StorageError> {
        let path = self.path_for(approval_id, stored_name)?;
        Ok(File::open(path).await?)
    }

    /// Remove a stored file. A file that is already gone is not an error.
    pub async fn delete(&self, approval_id: DbId, stored_name: &str) -> Result<(), StorageError> {
        let path = self.path_for(approval_id, stored_name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(approval_id, stored = stored_name, "Attachment file already missing");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
