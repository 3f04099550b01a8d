//! Session Store Port - Interface for persisting session records.
//!
//! The store is a durable mapping from session id to session record. The
//! contract the router relies on: atomic upsert-by-key and read-your-writes
//! consistency for a single key. No cross-session transactions are needed.

use async_trait::async_trait;

use crate::domain::foundation::{SessionId, Timestamp};
use crate::domain::session::Session;

/// Errors that can occur during session storage operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    /// A stored record exists but cannot be decoded (corrupt bytes, unknown
    /// stage value, removed fields). Recoverable: the router resets the
    /// session rather than failing the turn.
    #[error("session record for '{0}' could not be decoded")]
    Undecodable(SessionId),

    /// Failed to serialize a session for writing.
    #[error("failed to serialize session: {0}")]
    SerializationFailed(String),

    /// IO error from the backing store.
    #[error("IO error: {0}")]
    Io(String),

    /// Backend-specific failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Port for persisting and loading sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads a session by id.
    ///
    /// Returns `Ok(None)` when no record exists. Returns
    /// [`SessionStoreError::Undecodable`] when a record exists but cannot
    /// be decoded.
    async fn load(&self, id: &SessionId) -> Result<Option<Session>, SessionStoreError>;

    /// Writes a session, replacing any previous record for its id.
    async fn upsert(&self, session: &Session) -> Result<(), SessionStoreError>;

    /// Deletes a session record. Deleting a missing record is not an error.
    async fn remove(&self, id: &SessionId) -> Result<(), SessionStoreError>;

    /// Deletes every record last updated before the cutoff, returning how
    /// many were removed. Records that cannot be decoded are removed too.
    async fn purge_expired(&self, cutoff: Timestamp) -> Result<usize, SessionStoreError>;
}
