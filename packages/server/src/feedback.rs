//! Append-only feedback log.
//!
//! Each submission becomes one JSON line. Writers are serialised through a
//! mutex so concurrent requests never interleave lines.

use std::path::{Path, PathBuf};

use chrono::Utc;
use incident_lens_server_models::FeedbackEntry;
use tokio::io::AsyncWriteExt as _;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Errors that can occur while recording feedback.
#[derive(Debug, thiserror::Error)]
pub enum FeedbackError {
    /// The log could not be written.
    #[error("Failed to write feedback log: {0}")]
    Io(#[from] std::io::Error),

    /// The entry could not be serialised.
    #[error("Failed to serialise feedback: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Handle to the feedback file.
#[derive(Debug)]
pub struct FeedbackLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FeedbackLog {
    /// Logs to `path`; the file and its directory are created on first
    /// write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Location of the log.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one entry and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`FeedbackError`] if the entry cannot be written.
    pub async fn append(&self, feedback: &str) -> Result<FeedbackEntry, FeedbackError> {
        let entry = FeedbackEntry {
            id: Uuid::new_v4(),
            received_at: Utc::now(),
            feedback: feedback.to_owned(),
        };

        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');

        let _guard = self.lock.lock().await;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        Ok(entry)
    }
}
