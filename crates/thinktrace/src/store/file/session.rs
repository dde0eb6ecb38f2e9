//! File-based session storage implementation.
//!
//! Directory structure:
//! ```text
//! {sessions_dir}/
//!   {session_id}/
//!     state.json         # Atomic full-session snapshot
//! ```

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

use crate::session::{Session, SessionSnapshot};
use crate::store::error::{StorageError, StorageResult};
use crate::store::session::SessionStore;

const SNAPSHOT_FILE: &str = "state.json";
const SNAPSHOT_TEMP_FILE: &str = "state.json.tmp";

/// File-based implementation of `SessionStore`.
///
/// Each session lives in its own subdirectory of `sessions_dir`, holding a
/// single `state.json` snapshot that is replaced on every save.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    sessions_dir: PathBuf,
}

impl FileSessionStore {
    /// Create a new file session store.
    ///
    /// The sessions directory will be created when the first session is stored.
    pub fn new(sessions_dir: impl Into<PathBuf>) -> Self {
        Self {
            sessions_dir: sessions_dir.into(),
        }
    }

    /// Get the directory path for a session.
    fn session_dir(&self, session_id: &str) -> PathBuf {
        self.sessions_dir.join(session_id)
    }

    /// Get the snapshot file path for a session.
    fn snapshot_path(&self, session_id: &str) -> PathBuf {
        self.session_dir(session_id).join(SNAPSHOT_FILE)
    }

    /// Ensure the session directory exists.
    async fn ensure_session_dir(&self, session_id: &str) -> StorageResult<()> {
        let dir = self.session_dir(session_id);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| StorageError::file_io(&dir, e))
    }
}

/// Session ids become directory names, so they must be a single plain path component.
fn is_valid_session_id(session_id: &str) -> bool {
    !session_id.is_empty()
        && session_id != "."
        && session_id != ".."
        && !session_id.contains(['/', '\\', '\0'])
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn list(&self) -> StorageResult<Vec<String>> {
        let mut sessions = Vec::new();

        let mut entries = match fs::read_dir(&self.sessions_dir).await {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::file_io(&self.sessions_dir, e)),
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::file_io(&self.sessions_dir, e))?
        {
            let path = entry.path();
            if path.is_dir()
                && path.join(SNAPSHOT_FILE).exists()
                && let Some(name) = path.file_name()
            {
                sessions.push(name.to_string_lossy().to_string());
            }
        }

        Ok(sessions)
    }

    async fn load(&self, session_id: &str) -> StorageResult<Option<Session>> {
        if !is_valid_session_id(session_id) {
            return Ok(None);
        }
        let path = self.snapshot_path(session_id);

        let contents = match fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::file_io(&path, e)),
        };

        let snapshot: SessionSnapshot = serde_json::from_str(&contents)
            .map_err(|e| StorageError::FileDeserialization {
                path: path.clone(),
                message: e.to_string(),
            })?;

        if !snapshot.is_compatible() {
            return Err(StorageError::FileIncompatibleSchema {
                path,
                expected: SessionSnapshot::SCHEMA_VERSION,
                found: snapshot.schema_version,
            });
        }

        // Snapshot copied under another directory name.
        if snapshot.session.id != session_id {
            return Err(StorageError::SessionIdMismatch {
                path,
                expected: session_id.to_string(),
                found: snapshot.session.id,
            });
        }

        Ok(Some(snapshot.session))
    }

    async fn save(&self, session_id: &str, session: &Session) -> StorageResult<()> {
        if !is_valid_session_id(session_id) {
            return Err(StorageError::InvalidSessionId(session_id.to_string()));
        }
        self.ensure_session_dir(session_id).await?;

        let final_path = self.snapshot_path(session_id);
        let temp_path = self.session_dir(session_id).join(SNAPSHOT_TEMP_FILE);

        let json = serde_json::to_string_pretty(&SessionSnapshot::new(session.clone()))?;

        // Write to temp file first
        let mut file = File::create(&temp_path)
            .await
            .map_err(|e| StorageError::file_io(&temp_path, e))?;
        file.write_all(json.as_bytes())
            .await
            .map_err(|e| StorageError::file_io(&temp_path, e))?;
        // fsync for durability
        file.sync_all()
            .await
            .map_err(|e| StorageError::file_io(&temp_path, e))?;
        drop(file);

        // Atomic rename
        fs::rename(&temp_path, &final_path)
            .await
            .map_err(|e| StorageError::file_io(&final_path, e))?;

        Ok(())
    }
}
