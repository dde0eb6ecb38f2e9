//! Session actor types and protocol.
//!
//! This module defines the command protocol for communicating with session actors,
//! along with configuration and error types.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::oneshot;

use crate::api::{
    AppendThoughtRequest, AppendThoughtResponse, CompleteSessionResponse, SessionSummary,
};
use crate::config::CompletionPolicy;
use crate::store::{SessionStore, StorageError};

use super::analytics::SessionAnalytics;
use super::ledger::LedgerError;
use super::model::Session;

// ============================================================================
// Session Command
// ============================================================================

/// Commands that can be sent to a session actor.
pub enum SessionCommand {
    // Write operations
    AppendThought {
        request: AppendThoughtRequest,
        reply: oneshot::Sender<Result<AppendThoughtResponse, ActorError>>,
    },
    Complete {
        conclusion: String,
        success: bool,
        reply: oneshot::Sender<Result<CompleteSessionResponse, ActorError>>,
    },

    // Read operations
    GetSession {
        reply: oneshot::Sender<Result<Session, ActorError>>,
    },
    GetSummary {
        reply: oneshot::Sender<Result<SessionSummary, ActorError>>,
    },
    Analyze {
        reply: oneshot::Sender<Result<SessionAnalytics, ActorError>>,
    },
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors from session operations.
#[derive(Debug, Error)]
pub enum ActorError {
    /// The actor has shut down, or the registry has been shut down.
    #[error("actor has shut down")]
    ActorShutdown,

    /// Session not found in memory or in the store.
    #[error("session not found: {0}")]
    NotFound(String),

    /// A revision or branch pointed at a thought that does not exist.
    #[error("invalid reference: {0}")]
    InvalidReference(#[from] LedgerError),

    /// The session is completed and the strict completion policy is in force.
    #[error("session already completed: {0}")]
    SessionCompleted(String),

    /// Durable read or write failed. The in-memory session is unchanged.
    #[error("persistence error: {0}")]
    Persistence(#[from] StorageError),
}

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for spawning an actor around an already-persisted session.
pub struct ActorConfig {
    pub session: Session,
    pub store: Arc<dyn SessionStore>,
    pub completion: CompletionPolicy,
}

// ============================================================================
// Constants
// ============================================================================

/// Channel capacity for commands.
///
/// If this fills up, callers will block on send(), causing backpressure.
pub const CHANNEL_CAPACITY: usize = 256;
