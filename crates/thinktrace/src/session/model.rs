//! Session data model.
//!
//! A session owns a flat, append-only ledger of thoughts. Revisions and
//! branches point back into that ledger by thought number, never by
//! reference, so a `Session` is plain owned data that serializes as-is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::SessionStatus;

/// Opaque caller-supplied key/value metadata.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

// ============================================================================
// Session
// ============================================================================

/// One tracked reasoning trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub status: SessionStatus,
    /// Number of the most recently appended thought.
    pub current_step: u32,
    /// Advisory progress target. Never enforced.
    pub estimated_steps: u32,
    pub thoughts: Vec<Thought>,
    #[serde(default)]
    pub branches: Vec<Branch>,
    #[serde(default)]
    pub context: serde_json::Value,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conclusion: Option<Conclusion>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Look up a thought by its ledger number.
    pub fn thought(&self, number: u32) -> Option<&Thought> {
        // Numbers are gapless from 1, so the number is the index plus one.
        let index = usize::try_from(number).ok()?.checked_sub(1)?;
        self.thoughts.get(index)
    }

    /// Look up a branch by id.
    pub fn branch(&self, branch_id: &str) -> Option<&Branch> {
        self.branches.iter().find(|b| b.id == branch_id)
    }

    /// Total number of thoughts in the ledger.
    pub fn total_steps(&self) -> usize {
        self.thoughts.len()
    }

    pub fn is_completed(&self) -> bool {
        self.status == SessionStatus::Completed
    }

    /// Record a conclusion and mark the session completed.
    ///
    /// Overwrites any earlier conclusion.
    pub fn conclude(&mut self, content: String, success: bool) -> &Conclusion {
        let now = Utc::now();
        self.status = SessionStatus::Completed;
        self.updated_at = now;
        self.conclusion.insert(Conclusion {
            content,
            success,
            timestamp: now,
        })
    }
}

// ============================================================================
// Thought
// ============================================================================

/// Role a thought plays in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThoughtKind {
    /// Thought #1, seeded when the session starts.
    Initial,
    /// A forward continuation.
    Sequential,
    /// Reconsiders an earlier thought (see `revises_thought`).
    Revision,
}

impl std::fmt::Display for ThoughtKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThoughtKind::Initial => write!(f, "initial"),
            ThoughtKind::Sequential => write!(f, "sequential"),
            ThoughtKind::Revision => write!(f, "revision"),
        }
    }
}

/// One numbered entry in a session's ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thought {
    pub number: u32,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub kind: ThoughtKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revises_thought: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_from_thought: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<String>,
}

// ============================================================================
// Branch
// ============================================================================

/// A named fork grouping the thoughts appended under one `branch_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub id: String,
    pub from_thought: u32,
    /// Thought numbers in append order.
    pub thoughts: Vec<u32>,
}

// ============================================================================
// Conclusion
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conclusion {
    pub content: String,
    pub success: bool,
    pub timestamp: DateTime<Utc>,
}
