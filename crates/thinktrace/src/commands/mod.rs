//! CLI command implementations.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

use thinktrace::config::Config;
use thinktrace::session::{RegistrySettings, SessionRegistry};
use thinktrace::store::SessionStore;
use thinktrace::store::file::FileSessionStore;

pub mod complete;
pub mod inspect;
pub mod start;
pub mod think;

/// Load the config and build a registry over the file-backed session store.
pub async fn open_registry(
    config_path: &str,
    sessions_dir_override: Option<&Path>,
) -> Result<SessionRegistry> {
    let config = Config::load(config_path)
        .await
        .with_context(|| format!("loading config from '{config_path}'"))?;

    // CLI overrides config
    let sessions_path = match sessions_dir_override {
        Some(dir) => dir.to_path_buf(),
        None => config.sessions_path(Path::new(config_path)),
    };
    debug!(path = %sessions_path.display(), "Using sessions directory");

    let store: Arc<dyn SessionStore> = Arc::new(FileSessionStore::new(&sessions_path));
    Ok(SessionRegistry::new(
        store,
        RegistrySettings::from(&config.services.session),
    ))
}

/// Print a response as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
