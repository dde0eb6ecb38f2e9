//! Session storage trait.
//!
//! Defines the interface for persisting whole-session snapshots.

use async_trait::async_trait;

use crate::session::Session;

use super::error::StorageResult;

/// Storage interface for session persistence.
///
/// Each session id addresses exactly one record holding the full session,
/// overwritten wholesale on every save.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// List all session IDs that have a stored snapshot.
    async fn list(&self) -> StorageResult<Vec<String>>;

    /// Load the stored session.
    ///
    /// Returns `Ok(None)` if nothing has been saved under this id.
    async fn load(&self, session_id: &str) -> StorageResult<Option<Session>>;

    /// Save the full session, replacing any previous snapshot.
    ///
    /// Must be durable before returning, and atomic: either the new snapshot
    /// is fully in place or the old one is untouched.
    async fn save(&self, session_id: &str, session: &Session) -> StorageResult<()>;
}
