//! Reasoning session tracking.
//!
//! # Architecture
//!
//! ```text
//!  ┌─────────────────┐        ┌───────────────┐
//!  │ SessionRegistry │──owns──▶ SessionActor  │  (one per resident session, tokio task)
//!  │  (ID → Handle)  │        │  owns Session,│
//!  └────────┬────────┘        │  serializes   │
//!           │                 │  operations   │
//!           │ clone           └───────▲───────┘
//!           ▼                         │ mpsc messages
//!  ┌─────────────────┐                │
//!  │  SessionHandle  │────────────────┘  (cheap cloneable sender)
//!  └─────────────────┘
//! ```
//!
//! - **SessionRegistry**: starts sessions, maps IDs to handles, loads
//!   non-resident sessions from the store on demand, shuts actors down.
//! - **SessionActor**: owns one `Session`; runs the ledger on a working copy,
//!   writes it through the store, and only then commits it.
//! - **SessionHandle**: cloneable reference that sends messages to an actor.
//! - **Ledger** (`Session::append_thought`): numbering, revision and branch
//!   validation, branch bookkeeping.
//! - **Analytics**: pure derivations over a session.

mod actor;
mod actor_types;
mod analytics;
mod handle;
mod ledger;
mod model;
mod registry;
mod snapshot;

// Types and errors
pub use actor_types::ActorError;
pub use ledger::{ESTIMATE_LOOKAHEAD, LedgerError};
pub use model::{Branch, Conclusion, Metadata, Session, Thought, ThoughtKind};
pub use snapshot::SessionSnapshot;

// Actors
pub use handle::SessionHandle;
pub use registry::{RegistrySettings, SessionRegistry};

// Analytics
pub use analytics::{
    BranchSummary, KindCounts, ProgressSummary, SessionAnalytics, TimelineEntry, analyze, progress,
};
