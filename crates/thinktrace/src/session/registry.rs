//! Session registry for managing actor lifecycles.
//!
//! The registry is responsible for:
//! - Starting new sessions (persist first, then spawn the actor)
//! - Looking up resident sessions and loading the rest from the store
//! - Listing every known session
//! - Graceful shutdown of all actors

use std::sync::Arc;

use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use ulid::Ulid;

use crate::api::{
    AppendThoughtRequest, AppendThoughtResponse, CompleteSessionRequest, CompleteSessionResponse,
    SESSION_ID_PREFIX, SessionSummary, StartSessionRequest, StartSessionResponse,
};
use crate::config::{CompletionPolicy, SessionServiceConfig};
use crate::store::SessionStore;
use crate::sync::KeyedLocks;

use super::actor::SessionActor;
use super::actor_types::{ActorConfig, ActorError};
use super::analytics::SessionAnalytics;
use super::handle::SessionHandle;
use super::model::Session;

// ============================================================================
// Session Registry
// ============================================================================

/// Registry for session actors.
///
/// Manages the lifecycle of session actors: creation, lookup, loading, and shutdown.
/// Thread-safe and cheap to clone.
///
/// Single-use: once `shutdown` has run, `start` and cold loads fail with
/// `ActorError::ActorShutdown` and nothing further is written.
#[derive(Clone)]
pub struct SessionRegistry {
    /// Session handles by ID.
    handles: Arc<DashMap<String, SessionHandle>>,
    /// Actor task handles for graceful shutdown.
    task_handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
    /// Session store for persistence.
    store: Arc<dyn SessionStore>,
    /// Serializes cache-miss loads so each id gets at most one actor.
    load_locks: KeyedLocks,
    settings: RegistrySettings,
    /// Shutdown signal sender.
    shutdown_tx: Arc<watch::Sender<bool>>,
    /// Shutdown signal receiver (cloned for each actor).
    shutdown_rx: watch::Receiver<bool>,
}

/// Session defaults and policy applied by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrySettings {
    /// Used when `start` is called without an estimate.
    pub default_estimated_steps: u32,
    pub completion: CompletionPolicy,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self::from(&SessionServiceConfig::default())
    }
}

impl From<&SessionServiceConfig> for RegistrySettings {
    fn from(config: &SessionServiceConfig) -> Self {
        Self {
            default_estimated_steps: config.default_estimated_steps,
            completion: config.completion,
        }
    }
}

// ============================================================================
// Constants
// ============================================================================

/// Maximum concurrent summary fetches for `list()`.
const LIST_CONCURRENCY: usize = 32;

// ============================================================================
// Implementation
// ============================================================================

impl SessionRegistry {
    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Create a new session registry.
    pub fn new(store: Arc<dyn SessionStore>, settings: RegistrySettings) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            handles: Arc::new(DashMap::new()),
            task_handles: Arc::new(Mutex::new(Vec::new())),
            store,
            load_locks: KeyedLocks::new(),
            settings,
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
        }
    }

    /// Gracefully shutdown all session actors.
    ///
    /// Every mutation is already durable, so actors only answer what is
    /// queued and stop.
    pub async fn shutdown(&self) {
        info!("Shutting down session registry");

        if self.shutdown_tx.send(true).is_err() {
            warn!("Failed to send shutdown signal");
            return;
        }

        let task_handles = {
            let mut handles = self.task_handles.lock().await;
            std::mem::take(&mut *handles)
        };

        for task_handle in task_handles {
            if let Err(e) = task_handle.await {
                warn!(error = ?e, "Actor task panicked during shutdown");
            }
        }

        self.handles.clear();
        info!("Session registry shutdown complete");
    }

    // ------------------------------------------------------------------------
    // Core API
    // ------------------------------------------------------------------------

    /// Start a new session seeded with its initial thought.
    ///
    /// The session is persisted before an actor exists for it, so a failed
    /// write leaves nothing behind in memory.
    pub async fn start(
        &self,
        request: StartSessionRequest,
    ) -> Result<StartSessionResponse, ActorError> {
        self.ensure_running()?;

        let id = format!("{}{}", SESSION_ID_PREFIX, Ulid::new());
        let estimated_steps = request
            .estimated_steps
            .unwrap_or(self.settings.default_estimated_steps);

        let session = Session::new(
            id.clone(),
            request.initial_thought,
            request.context.unwrap_or_default(),
            estimated_steps,
            request.metadata.unwrap_or_default(),
        );

        if let Err(e) = self.store.save(&id, &session).await {
            warn!(session_id = %id, error = %e, "Failed to persist new session");
            return Err(e.into());
        }

        let response = StartSessionResponse {
            session_id: id.clone(),
            step: session.current_step,
            estimated_steps: session.estimated_steps,
            thought: session.thoughts[0].clone(),
        };

        self.spawn_actor(session).await;
        debug!(session_id = %id, "Session started");

        Ok(response)
    }

    /// Append a thought to a session.
    pub async fn append_thought(
        &self,
        id: &str,
        request: AppendThoughtRequest,
    ) -> Result<AppendThoughtResponse, ActorError> {
        self.handle(id).await?.append_thought(request).await
    }

    /// Record a session's conclusion. `success` defaults to true.
    pub async fn complete(
        &self,
        id: &str,
        request: CompleteSessionRequest,
    ) -> Result<CompleteSessionResponse, ActorError> {
        self.handle(id)
            .await?
            .complete(request.conclusion, request.success.unwrap_or(true))
            .await
    }

    /// Get a copy of a session.
    pub async fn get_session(&self, id: &str) -> Result<Session, ActorError> {
        self.handle(id).await?.get_session().await
    }

    /// Compute analytics for a session.
    pub async fn analyze(&self, id: &str) -> Result<SessionAnalytics, ActorError> {
        self.handle(id).await?.analyze().await
    }

    /// Get a handle to a session, loading it from the store on a cache miss.
    pub async fn handle(&self, id: &str) -> Result<SessionHandle, ActorError> {
        if let Some(handle) = self.get(id) {
            return Ok(handle);
        }

        let result = {
            let lock = self.load_locks.get(id);
            let _guard = lock.lock().await;
            // Another caller may have loaded it while we waited.
            match self.get(id) {
                Some(handle) => Ok(handle),
                None => self.load(id).await,
            }
        };
        self.load_locks.release(id);

        result
    }

    /// Get a resident session handle by ID.
    pub fn get(&self, id: &str) -> Option<SessionHandle> {
        self.handles.get(id).map(|r| r.clone())
    }

    /// Check if a session is resident.
    pub fn contains(&self, id: &str) -> bool {
        self.handles.contains_key(id)
    }

    /// List every known session, oldest first.
    ///
    /// Resident sessions are summarized by their actor; the rest are read
    /// from the store without being made resident.
    pub async fn list(&self) -> Result<Vec<SessionSummary>, ActorError> {
        let mut ids = self.store.list().await?;
        for entry in self.handles.iter() {
            if !ids.contains(entry.key()) {
                ids.push(entry.key().clone());
            }
        }

        let mut summaries: Vec<SessionSummary> = stream::iter(ids)
            .map(|id| async move { self.summarize(&id).await })
            .buffer_unordered(LIST_CONCURRENCY)
            .filter_map(|result| async move { result })
            .collect()
            .await;

        summaries.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        Ok(summaries)
    }

    /// Get a reference to the session store.
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Get the number of resident sessions.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Check if no session is resident.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    // ------------------------------------------------------------------------
    // Internal
    // ------------------------------------------------------------------------

    /// Load a session from the store and spawn its actor.
    async fn load(&self, id: &str) -> Result<SessionHandle, ActorError> {
        self.ensure_running()?;

        let session = match self.store.load(id).await {
            Ok(Some(session)) => session,
            Ok(None) => return Err(ActorError::NotFound(id.to_string())),
            Err(e) => {
                warn!(session_id = %id, error = %e, "Failed to load session");
                return Err(e.into());
            }
        };

        debug!(session_id = %id, thoughts = session.thoughts.len(), "Session loaded from store");
        Ok(self.spawn_actor(session).await)
    }

    fn ensure_running(&self) -> Result<(), ActorError> {
        if *self.shutdown_rx.borrow() {
            return Err(ActorError::ActorShutdown);
        }
        Ok(())
    }

    /// Spawn an actor for a persisted session and make it resident.
    async fn spawn_actor(&self, session: Session) -> SessionHandle {
        let id = session.id.clone();
        let config = ActorConfig {
            session,
            store: self.store.clone(),
            completion: self.settings.completion,
        };

        let (tx, task_handle) = SessionActor::spawn(config, self.shutdown_rx.clone());
        let handle = SessionHandle::new(tx, id.clone());
        self.handles.insert(id, handle.clone());

        let mut guard = self.task_handles.lock().await;
        guard.retain(|h| !h.is_finished());
        guard.push(task_handle);

        handle
    }

    /// Summary for one session, or `None` if it cannot be read.
    async fn summarize(&self, id: &str) -> Option<SessionSummary> {
        if let Some(handle) = self.get(id) {
            return handle.get_summary().await.ok();
        }

        match self.store.load(id).await {
            Ok(session) => session.as_ref().map(SessionSummary::from),
            Err(e) => {
                warn!(session_id = %id, error = %e, "Skipping unreadable session");
                None
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SessionStatus;
    use crate::session::ThoughtKind;
    use crate::store::file::FileSessionStore;
    use tempfile::TempDir;

    fn create_registry(temp_dir: &TempDir) -> SessionRegistry {
        let store = Arc::new(FileSessionStore::new(temp_dir.path().join("sessions")));
        SessionRegistry::new(store, RegistrySettings::default())
    }

    fn start_request(content: &str) -> StartSessionRequest {
        StartSessionRequest {
            initial_thought: content.to_string(),
            ..StartSessionRequest::default()
        }
    }

    #[tokio::test]
    async fn start_persists_and_registers() {
        let temp_dir = TempDir::new().unwrap();
        let registry = create_registry(&temp_dir);

        let started = registry.start(start_request("first")).await.unwrap();

        assert!(started.session_id.starts_with(SESSION_ID_PREFIX));
        assert_eq!(started.step, 1);
        assert_eq!(started.thought.kind, ThoughtKind::Initial);
        assert_eq!(started.estimated_steps, 5);
        assert!(registry.contains(&started.session_id));
        assert!(
            registry
                .store()
                .load(&started.session_id)
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn start_uses_configured_default_estimate() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(FileSessionStore::new(temp_dir.path().join("sessions")));
        let registry = SessionRegistry::new(
            store,
            RegistrySettings {
                default_estimated_steps: 12,
                completion: CompletionPolicy::Open,
            },
        );

        let started = registry.start(start_request("x")).await.unwrap();
        assert_eq!(started.estimated_steps, 12);
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let registry = create_registry(&temp_dir);

        let err = registry.get_session("session_missing").await.unwrap_err();
        assert!(matches!(err, ActorError::NotFound(id) if id == "session_missing"));

        let err = registry
            .append_thought("session_missing", AppendThoughtRequest::sequential("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ActorError::NotFound(_)));
        assert!(registry.is_empty());
        assert!(registry.load_locks.is_empty());
    }

    #[tokio::test]
    async fn complete_defaults_to_success() {
        let temp_dir = TempDir::new().unwrap();
        let registry = create_registry(&temp_dir);
        let id = registry.start(start_request("x")).await.unwrap().session_id;

        let completed = registry
            .complete(
                &id,
                CompleteSessionRequest {
                    conclusion: "done".to_string(),
                    success: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(completed.status, SessionStatus::Completed);
        assert!(completed.conclusion.success);
        assert_eq!(completed.total_steps, 1);
    }

    #[tokio::test]
    async fn list_includes_stored_and_resident_sessions() {
        let temp_dir = TempDir::new().unwrap();
        let registry = create_registry(&temp_dir);
        let a = registry.start(start_request("a")).await.unwrap().session_id;
        let b = registry.start(start_request("b")).await.unwrap().session_id;
        registry
            .append_thought(&b, AppendThoughtRequest::sequential("b2"))
            .await
            .unwrap();

        // A second registry over the same directory has nothing resident.
        let cold = create_registry(&temp_dir);
        let summaries = cold.list().await.unwrap();

        let ids: Vec<_> = summaries.iter().map(|s| s.session_id.clone()).collect();
        assert_eq!(ids, vec![a, b]);
        assert_eq!(summaries[1].thought_count, 2);
        assert!(cold.is_empty());
    }

    #[tokio::test]
    async fn shutdown_stops_actors() {
        let temp_dir = TempDir::new().unwrap();
        let registry = create_registry(&temp_dir);
        let id = registry.start(start_request("x")).await.unwrap().session_id;
        let handle = registry.get(&id).unwrap();
        assert_eq!(handle.id(), id);

        registry.shutdown().await;

        assert!(registry.is_empty());
        assert!(matches!(
            handle.get_session().await.unwrap_err(),
            ActorError::ActorShutdown
        ));
    }

    #[tokio::test]
    async fn shutdown_registry_refuses_new_work() {
        let temp_dir = TempDir::new().unwrap();
        let registry = create_registry(&temp_dir);
        let id = registry.start(start_request("x")).await.unwrap().session_id;

        registry.shutdown().await;

        let err = registry.start(start_request("late")).await.unwrap_err();
        assert!(matches!(err, ActorError::ActorShutdown));
        assert_eq!(registry.store().list().await.unwrap(), vec![id.clone()]);

        // Stored sessions are not revived behind a dead actor either.
        let err = registry.get_session(&id).await.unwrap_err();
        assert!(matches!(err, ActorError::ActorShutdown));
        assert!(registry.is_empty());
        assert!(registry.load_locks.is_empty());
    }
}
