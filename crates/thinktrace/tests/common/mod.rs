//! Common test utilities.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tempfile::TempDir;

use thinktrace::api::StartSessionRequest;
use thinktrace::config::CompletionPolicy;
use thinktrace::session::{RegistrySettings, Session, SessionRegistry};
use thinktrace::store::file::FileSessionStore;
use thinktrace::store::{SessionStore, StorageError, StorageResult};

/// Create a file store rooted in `temp_dir`.
pub fn file_store(temp_dir: &TempDir) -> Arc<FileSessionStore> {
    Arc::new(FileSessionStore::new(temp_dir.path().join("sessions")))
}

/// Create a registry with default settings over a file store in `temp_dir`.
pub fn test_registry(temp_dir: &TempDir) -> SessionRegistry {
    SessionRegistry::new(file_store(temp_dir), RegistrySettings::default())
}

/// Create a registry that treats completion as terminal.
pub fn strict_registry(temp_dir: &TempDir) -> SessionRegistry {
    SessionRegistry::new(
        file_store(temp_dir),
        RegistrySettings {
            completion: CompletionPolicy::Strict,
            ..RegistrySettings::default()
        },
    )
}

pub fn start_request(content: &str, estimated_steps: u32) -> StartSessionRequest {
    StartSessionRequest {
        initial_thought: content.to_string(),
        estimated_steps: Some(estimated_steps),
        ..StartSessionRequest::default()
    }
}

/// Store wrapper whose saves can be switched to fail on demand.
pub struct FlakyStore {
    inner: FileSessionStore,
    fail_saves: AtomicBool,
}

impl FlakyStore {
    pub fn new(temp_dir: &TempDir) -> Arc<Self> {
        Arc::new(Self {
            inner: FileSessionStore::new(temp_dir.path().join("sessions")),
            fail_saves: AtomicBool::new(false),
        })
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_saves.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl SessionStore for FlakyStore {
    async fn list(&self) -> StorageResult<Vec<String>> {
        self.inner.list().await
    }

    async fn load(&self, session_id: &str) -> StorageResult<Option<Session>> {
        self.inner.load(session_id).await
    }

    async fn save(&self, session_id: &str, session: &Session) -> StorageResult<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StorageError::file_io(
                "/unwritable/state.json",
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "disk says no"),
            ));
        }
        self.inner.save(session_id, session).await
    }
}
