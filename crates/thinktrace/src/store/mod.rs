//! Storage abstraction layer for Thinktrace.
//!
//! The session store trait lives here, with a file-based implementation in
//! the `file` submodule.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │        SessionRegistry / SessionActor         │
//! └──────────────────────┬───────────────────────┘
//!                        │ uses trait
//!                        ▼
//! ┌──────────────────────────────────────────────┐
//! │        store/ (trait): SessionStore           │
//! └──────────────────────┬───────────────────────┘
//!                        │ implementation
//!                        ▼
//! ┌──────────────────────────────────────────────┐
//! │        store/file/: FileSessionStore          │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! # Naming Conventions
//!
//! - `list` - enumerate all entities
//! - `load` - read a single entity, returns `Option` if not found
//! - `save` - create or overwrite (must be atomic)

pub mod error;

mod session;

pub mod file;

pub use error::{StorageError, StorageResult};
pub use session::SessionStore;
