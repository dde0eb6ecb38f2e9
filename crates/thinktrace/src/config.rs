use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;

use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// Config (root)
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub workspace: Option<PathBuf>,
    #[serde(default)]
    pub services: ServicesConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_saphyr::Error),

    #[error("environment variable '{0}' is not set")]
    MissingEnvVar(String),

    #[error("unclosed variable reference '${{' (missing '}}')")]
    UnclosedVarReference,
}

impl Config {
    /// Load the config file, falling back to defaults when it does not exist.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::Io(e)),
        };
        let expanded = expand_env_vars(&contents)?;
        Ok(serde_saphyr::from_str(&expanded)?)
    }

    /// Directory holding session snapshots.
    ///
    /// `services.session.path` wins when set; otherwise `<workspace>/sessions`.
    /// Relative paths are resolved against the config file's directory.
    pub fn sessions_path(&self, config_path: &Path) -> PathBuf {
        let workspace_raw = self
            .workspace
            .as_deref()
            .unwrap_or(Path::new(DEFAULT_WORKSPACE));
        let workspace = resolve_path(config_path, workspace_raw);

        self.services
            .session
            .path
            .as_ref()
            .map(|p| resolve_path(config_path, p))
            .unwrap_or_else(|| workspace.join(DEFAULT_SESSIONS_DIR))
    }
}

/// Resolve a path relative to the config file directory.
///
/// If the path is absolute, it is returned as-is.
/// If the path is relative, it is joined with the config file's parent directory.
pub fn resolve_path(config_path: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }

    let config_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    config_dir.join(path)
}

// ============================================================================
// Default Paths
// ============================================================================

/// Default config file name.
pub const DEFAULT_CONFIG_FILE: &str = "thinktrace.yaml";
/// Default workspace directory (relative to config file).
pub const DEFAULT_WORKSPACE: &str = ".thinktrace";
/// Default sessions directory (relative to workspace).
pub const DEFAULT_SESSIONS_DIR: &str = "sessions";

// ============================================================================
// Private Helpers (Serde Defaults)
// ============================================================================

fn default_estimated_steps() -> u32 {
    5
}

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand environment variables in a string.
///
/// - `${VAR}` - Required variable, errors if not set
/// - `${VAR:-default}` - Optional variable with default value
/// - `$$` - Escaped `$`
///
/// A `$` not followed by `{` or `$` is kept literally. Nested references are
/// not supported.
fn expand_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        result.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(tail) = after.strip_prefix('$') {
            result.push('$');
            rest = tail;
        } else if let Some(tail) = after.strip_prefix('{') {
            let end = tail.find('}').ok_or(ConfigError::UnclosedVarReference)?;
            result.push_str(&lookup_var(&tail[..end])?);
            rest = &tail[end + 1..];
        } else {
            result.push('$');
            rest = after;
        }
    }

    result.push_str(rest);
    Ok(result)
}

/// Resolve the body of a `${...}` reference.
fn lookup_var(reference: &str) -> Result<String, ConfigError> {
    let (name, default) = match reference.split_once(":-") {
        Some((name, default)) => (name, Some(default)),
        None => (reference, None),
    };

    match (std::env::var(name), default) {
        (Ok(value), _) => Ok(value),
        (Err(_), Some(default)) => Ok(default.to_string()),
        (Err(_), None) => Err(ConfigError::MissingEnvVar(name.to_string())),
    }
}

// ============================================================================
// ServicesConfig
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ServicesConfig {
    #[serde(default)]
    pub session: SessionServiceConfig,
}

// ============================================================================
// SessionServiceConfig
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SessionServiceConfig {
    /// Snapshot directory. Defaults to `<workspace>/sessions`.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Step estimate used when `start` is called without one.
    #[serde(default = "default_estimated_steps")]
    pub default_estimated_steps: u32,
    #[serde(default)]
    pub completion: CompletionPolicy,
}

impl Default for SessionServiceConfig {
    fn default() -> Self {
        Self {
            path: None,
            default_estimated_steps: default_estimated_steps(),
            completion: CompletionPolicy::default(),
        }
    }
}

/// What a completed session still accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionPolicy {
    /// Appends and repeated completes are accepted; a new conclusion
    /// replaces the old one.
    #[default]
    Open,
    /// Completed is terminal: appends and further completes are rejected.
    Strict,
}

// ============================================================================
// Tests
// ============================================================================
