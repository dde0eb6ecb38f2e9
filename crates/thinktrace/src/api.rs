//! Shared request and response types for tracker operations.
//!
//! These types define the contract between the tracker and whatever carries
//! its operations (the bundled CLI, or any RPC framing a host chooses).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::{Conclusion, Metadata, Session, Thought};

// ============================================================================
// ID Prefixes
// ============================================================================

/// ID prefix for sessions.
pub const SESSION_ID_PREFIX: &str = "session_";

// ============================================================================
// Session Status
// ============================================================================

/// Session status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Session is accepting thoughts.
    Active,
    /// A conclusion has been recorded.
    Completed,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Active => write!(f, "active"),
            SessionStatus::Completed => write!(f, "completed"),
        }
    }
}

// ============================================================================
// Start
// ============================================================================

/// Request to start a new reasoning session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartSessionRequest {
    /// Content of thought #1.
    pub initial_thought: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_steps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

/// Response for session creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartSessionResponse {
    pub session_id: String,
    pub step: u32,
    pub estimated_steps: u32,
    pub thought: Thought,
}

// ============================================================================
// Append
// ============================================================================

/// Request to append a thought to a session's ledger.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppendThoughtRequest {
    pub content: String,
    #[serde(default)]
    pub is_revision: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revises_thought: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_from_thought: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<String>,
    /// Push the advisory step estimate ahead of current progress.
    #[serde(default)]
    pub needs_more_thoughts: bool,
}

impl AppendThoughtRequest {
    /// A plain sequential continuation.
    pub fn sequential(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// A revision of an earlier thought.
    pub fn revision(content: impl Into<String>, revises_thought: u32) -> Self {
        Self {
            content: content.into(),
            is_revision: true,
            revises_thought: Some(revises_thought),
            ..Self::default()
        }
    }

    /// A thought on a named branch forked from `from_thought`.
    pub fn branch(
        content: impl Into<String>,
        from_thought: u32,
        branch_id: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            branch_from_thought: Some(from_thought),
            branch_id: Some(branch_id.into()),
            ..Self::default()
        }
    }
}

/// Response from appending a thought.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendThoughtResponse {
    pub session_id: String,
    pub current_step: u32,
    pub estimated_steps: u32,
    pub thought: Thought,
}

// ============================================================================
// Complete
// ============================================================================

/// Request to record a session's conclusion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteSessionRequest {
    pub conclusion: String,
    /// Defaults to `true` when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
}

/// Response from completing a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteSessionResponse {
    pub session_id: String,
    pub status: SessionStatus,
    pub total_steps: usize,
    pub conclusion: Conclusion,
}

// ============================================================================
// List
// ============================================================================

/// Summary of a session in list responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub status: SessionStatus,
    pub current_step: u32,
    pub estimated_steps: u32,
    pub thought_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Session> for SessionSummary {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.id.clone(),
            status: session.status,
            current_step: session.current_step,
            estimated_steps: session.estimated_steps,
            thought_count: session.thoughts.len(),
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

/// Response for listing sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListSessionsResponse {
    pub sessions: Vec<SessionSummary>,
}
