//! Session snapshot schema.
//!
//! A snapshot is the durable form of a session: the complete `Session`
//! plus a schema version and the time it was written.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::model::Session;

/// A point-in-time copy of a session, as written to storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Schema version for forward compatibility.
    pub schema_version: String,
    /// When this snapshot was taken.
    pub snapshot_at: DateTime<Utc>,
    /// The full session state.
    pub session: Session,
}

impl SessionSnapshot {
    /// Current schema version.
    pub const SCHEMA_VERSION: &'static str = "1";

    #[must_use]
    pub fn new(session: Session) -> Self {
        Self {
            schema_version: Self::SCHEMA_VERSION.to_string(),
            snapshot_at: Utc::now(),
            session,
        }
    }

    /// Check if this snapshot is compatible with the current schema.
    pub fn is_compatible(&self) -> bool {
        self.schema_version == Self::SCHEMA_VERSION
    }
}
