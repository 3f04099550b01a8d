//! File-based Session Store Adapter
//!
//! Stores one JSON file per session under a base directory. Suitable for
//! single-node deployments and local development; any durable keyed store
//! satisfies the same port.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::warn;

use crate::domain::foundation::{SessionId, Timestamp};
use crate::domain::session::Session;
use crate::ports::{SessionStore, SessionStoreError};

/// File-backed storage for session records.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    base_path: PathBuf,
}

impl FileSessionStore {
    /// Creates a file store rooted at a base directory.
    ///
    /// # Example
    /// ```ignore
    /// let store = FileSessionStore::new("./data/sessions");
    /// ```
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    /// Session ids are caller-supplied; anything outside a conservative
    /// character set is mapped to '_' before touching the filesystem.
    fn file_path(&self, id: &SessionId) -> PathBuf {
        let sanitized: String = id
            .as_str()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.base_path.join(format!("{}.json", sanitized))
    }

    async fn ensure_dir(&self) -> Result<(), SessionStoreError> {
        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| SessionStoreError::Io(e.to_string()))
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self, id: &SessionId) -> Result<Option<Session>, SessionStoreError> {
        let path = self.file_path(id);
        if !path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(&path)
            .await
            .map_err(|e| SessionStoreError::Io(e.to_string()))?;

        match serde_json::from_str(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(err) => {
                warn!(session_id = %id, error = %err, "stored session failed to decode");
                Err(SessionStoreError::Undecodable(id.clone()))
            }
        }
    }

    async fn upsert(&self, session: &Session) -> Result<(), SessionStoreError> {
        self.ensure_dir().await?;

        let raw = serde_json::to_string_pretty(session)
            .map_err(|e| SessionStoreError::SerializationFailed(e.to_string()))?;

        fs::write(self.file_path(&session.session_id), raw)
            .await
            .map_err(|e| SessionStoreError::Io(e.to_string()))
    }

    async fn remove(&self, id: &SessionId) -> Result<(), SessionStoreError> {
        let path = self.file_path(id);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionStoreError::Io(e.to_string())),
        }
    }

    async fn purge_expired(&self, cutoff: Timestamp) -> Result<usize, SessionStoreError> {
        if !self.base_path.exists() {
            return Ok(0);
        }

        let mut removed = 0;
        let mut entries = fs::read_dir(&self.base_path)
            .await
            .map_err(|e| SessionStoreError::Io(e.to_string()))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| SessionStoreError::Io(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }

            let expired = match fs::read_to_string(&path).await {
                Ok(raw) => serde_json::from_str::<Session>(&raw)
                    .map(|session| session.last_updated.is_before(&cutoff))
                    // Undecodable records are purged along with the expired.
                    .unwrap_or(true),
                Err(_) => true,
            };

            if expired && fs::remove_file(&path).await.is_ok() {
                removed += 1;
            }
        }

        Ok(removed)
    }
}
