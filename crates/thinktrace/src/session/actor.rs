//! Per-session actor for serialized state mutations.
//!
//! Each resident session gets a dedicated actor task that:
//! - Serializes every operation on the session via message passing (no locks)
//! - Owns the in-memory session and writes it through to the store
//! - Commits a mutation only after the snapshot is durable
//!
//! Reads are answered by the same task, so they always see a state that was
//! fully committed, never a mutation in flight.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::api::{
    AppendThoughtRequest, AppendThoughtResponse, CompleteSessionResponse, SessionSummary,
};
use crate::config::CompletionPolicy;
use crate::store::SessionStore;

use super::actor_types::{ActorConfig, ActorError, CHANNEL_CAPACITY, SessionCommand};
use super::analytics::{self, SessionAnalytics};
use super::model::Session;

// ============================================================================
// Session Actor
// ============================================================================

/// Per-session actor that owns state and handles mutations.
pub struct SessionActor {
    // State
    session: Session,

    // Policy
    completion: CompletionPolicy,

    // Persistence
    store: Arc<dyn SessionStore>,

    // Communication
    command_rx: mpsc::Receiver<SessionCommand>,
    shutdown_rx: watch::Receiver<bool>,
}

impl SessionActor {
    /// Spawn an actor for a session that is already persisted.
    ///
    /// Returns the command sender and a JoinHandle for the actor task.
    pub fn spawn(
        config: ActorConfig,
        shutdown_rx: watch::Receiver<bool>,
    ) -> (mpsc::Sender<SessionCommand>, tokio::task::JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

        let actor = Self {
            session: config.session,
            completion: config.completion,
            store: config.store,
            command_rx: rx,
            shutdown_rx,
        };

        let handle = tokio::spawn(actor.run());
        (tx, handle)
    }

    /// Main actor loop.
    async fn run(mut self) {
        debug!(session_id = %self.session.id, "Session actor started");

        loop {
            tokio::select! {
                // Check for shutdown signal
                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        debug!(session_id = %self.session.id, "Session actor received shutdown signal");
                        // Answer whatever is already queued before stopping
                        self.drain_commands().await;
                        break;
                    }
                }

                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(command) => self.handle_command(command).await,
                        None => {
                            debug!(session_id = %self.session.id, "All handles dropped, shutting down");
                            break;
                        }
                    }
                }
            }
        }

        debug!(session_id = %self.session.id, "Session actor stopped");
    }

    /// Drain and process all remaining commands in the queue.
    async fn drain_commands(&mut self) {
        while let Ok(cmd) = self.command_rx.try_recv() {
            self.handle_command(cmd).await;
        }
    }

    /// Handle a single command.
    async fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::AppendThought { request, reply } => {
                let result = self.append_thought(request).await;
                let _ = reply.send(result);
            }
            SessionCommand::Complete {
                conclusion,
                success,
                reply,
            } => {
                let result = self.complete(conclusion, success).await;
                let _ = reply.send(result);
            }
            SessionCommand::GetSession { reply } => {
                let _ = reply.send(Ok(self.session.clone()));
            }
            SessionCommand::GetSummary { reply } => {
                let _ = reply.send(Ok(SessionSummary::from(&self.session)));
            }
            SessionCommand::Analyze { reply } => {
                let result: SessionAnalytics = analytics::analyze(&self.session);
                let _ = reply.send(Ok(result));
            }
        }
    }

    // ------------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------------

    async fn append_thought(
        &mut self,
        request: AppendThoughtRequest,
    ) -> Result<AppendThoughtResponse, ActorError> {
        self.ensure_open()?;

        let mut next = self.session.clone();
        let thought = next.append_thought(&request)?;
        self.commit(next).await?;

        debug!(
            session_id = %self.session.id,
            number = thought.number,
            kind = %thought.kind,
            "Thought appended"
        );

        Ok(AppendThoughtResponse {
            session_id: self.session.id.clone(),
            current_step: self.session.current_step,
            estimated_steps: self.session.estimated_steps,
            thought,
        })
    }

    async fn complete(
        &mut self,
        conclusion: String,
        success: bool,
    ) -> Result<CompleteSessionResponse, ActorError> {
        self.ensure_open()?;

        let mut next = self.session.clone();
        let conclusion = next.conclude(conclusion, success).clone();
        self.commit(next).await?;

        debug!(session_id = %self.session.id, success, "Session completed");

        Ok(CompleteSessionResponse {
            session_id: self.session.id.clone(),
            status: self.session.status,
            total_steps: self.session.total_steps(),
            conclusion,
        })
    }

    /// Reject mutations on a completed session when the policy is strict.
    fn ensure_open(&self) -> Result<(), ActorError> {
        if self.completion == CompletionPolicy::Strict && self.session.is_completed() {
            return Err(ActorError::SessionCompleted(self.session.id.clone()));
        }
        Ok(())
    }

    /// Persist `next` and make it the current state.
    ///
    /// On a failed write the current state is left as it was.
    async fn commit(&mut self, next: Session) -> Result<(), ActorError> {
        if let Err(e) = self.store.save(&next.id, &next).await {
            warn!(
                session_id = %next.id,
                error = %e,
                "Failed to persist session, discarding mutation"
            );
            return Err(e.into());
        }
        self.session = next;
        Ok(())
    }
}
