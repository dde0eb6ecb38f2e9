//! Session handle for communicating with a session actor.
//!
//! `SessionHandle` is a thin wrapper around an `mpsc::Sender<SessionCommand>`.
//! It provides async methods for all session operations and is cheap to clone.

use tokio::sync::{mpsc, oneshot};

use crate::api::{
    AppendThoughtRequest, AppendThoughtResponse, CompleteSessionResponse, SessionSummary,
};

use super::actor_types::{ActorError, SessionCommand};
use super::analytics::SessionAnalytics;
use super::model::Session;

/// Handle for interacting with a session actor.
///
/// This is cheap to clone (just an `Arc` inside the `mpsc::Sender`).
/// All methods are async and communicate with the actor via message passing.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
    id: String,
}

impl SessionHandle {
    /// Create a new handle from a command sender.
    pub(crate) fn new(tx: mpsc::Sender<SessionCommand>, id: String) -> Self {
        Self { tx, id }
    }

    /// Get the session ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    // ------------------------------------------------------------------------
    // Write Operations
    // ------------------------------------------------------------------------

    /// Append a thought to the ledger.
    ///
    /// Returns once the updated session is durable.
    pub async fn append_thought(
        &self,
        request: AppendThoughtRequest,
    ) -> Result<AppendThoughtResponse, ActorError> {
        self.call(|reply| SessionCommand::AppendThought { request, reply })
            .await
    }

    /// Record the session's conclusion and mark it completed.
    pub async fn complete(
        &self,
        conclusion: String,
        success: bool,
    ) -> Result<CompleteSessionResponse, ActorError> {
        self.call(|reply| SessionCommand::Complete {
            conclusion,
            success,
            reply,
        })
        .await
    }

    // ------------------------------------------------------------------------
    // Read Operations
    // ------------------------------------------------------------------------

    /// Get a copy of the full session.
    pub async fn get_session(&self) -> Result<Session, ActorError> {
        self.call(|reply| SessionCommand::GetSession { reply }).await
    }

    /// Get the list-view summary of the session.
    pub async fn get_summary(&self) -> Result<SessionSummary, ActorError> {
        self.call(|reply| SessionCommand::GetSummary { reply }).await
    }

    /// Compute analytics over the session's current ledger.
    pub async fn analyze(&self) -> Result<SessionAnalytics, ActorError> {
        self.call(|reply| SessionCommand::Analyze { reply }).await
    }

    // ------------------------------------------------------------------------
    // Internal
    // ------------------------------------------------------------------------

    /// Send a command and wait for the actor's reply.
    async fn call<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<Result<T, ActorError>>) -> SessionCommand,
    ) -> Result<T, ActorError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(command(reply_tx))
            .await
            .map_err(|_| ActorError::ActorShutdown)?;

        reply_rx.await.map_err(|_| ActorError::ActorShutdown)?
    }
}
