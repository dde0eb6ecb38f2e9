//! File-based storage implementations.
//!
//! Session snapshots are pretty-printed JSON documents, one directory per
//! session. All writes go to a temp file that is then renamed into place.

mod session;

pub use session::FileSessionStore;
