//! In-Memory Session Store Adapter
//!
//! Stores serialized session records in memory. Useful for testing and
//! development. Records are kept as JSON strings, matching what a durable
//! keyed store would hold, so decode failures behave exactly like the
//! file-backed adapter.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

use crate::domain::foundation::{SessionId, Timestamp};
use crate::domain::session::Session;
use crate::ports::{SessionStore, SessionStoreError};

/// In-memory storage for session records.
#[derive(Debug, Clone)]
pub struct InMemorySessionStore {
    records: Arc<RwLock<HashMap<SessionId, String>>>,
}

impl InMemorySessionStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Clears all stored records (useful for tests).
    pub async fn clear(&self) {
        self.records.write().await.clear();
    }

    /// Returns the number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns true if no records are stored.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Inserts raw bytes for an id, bypassing serialization (useful for
    /// corrupt-record tests).
    pub async fn insert_raw(&self, id: SessionId, raw: impl Into<String>) {
        self.records.write().await.insert(id, raw.into());
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, id: &SessionId) -> Result<Option<Session>, SessionStoreError> {
        let records = self.records.read().await;
        let Some(raw) = records.get(id) else {
            return Ok(None);
        };

        match serde_json::from_str(raw) {
            Ok(session) => Ok(Some(session)),
            Err(err) => {
                warn!(session_id = %id, error = %err, "stored session failed to decode");
                Err(SessionStoreError::Undecodable(id.clone()))
            }
        }
    }

    async fn upsert(&self, session: &Session) -> Result<(), SessionStoreError> {
        let raw = serde_json::to_string(session)
            .map_err(|e| SessionStoreError::SerializationFailed(e.to_string()))?;

        self.records
            .write()
            .await
            .insert(session.session_id.clone(), raw);
        Ok(())
    }

    async fn remove(&self, id: &SessionId) -> Result<(), SessionStoreError> {
        self.records.write().await.remove(id);
        Ok(())
    }

    async fn purge_expired(&self, cutoff: Timestamp) -> Result<usize, SessionStoreError> {
        let mut records = self.records.write().await;
        let before = records.len();

        records.retain(|_, raw| {
            serde_json::from_str::<Session>(raw)
                .map(|session| !session.last_updated.is_before(&cutoff))
                // Undecodable records are purged along with the expired.
                .unwrap_or(false)
        });

        Ok(before - records.len())
    }
}
