//! Read-only analytics over a session's ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::SessionStatus;

use super::model::{Session, ThoughtKind};

// ============================================================================
// Analytics Types
// ============================================================================

/// Derived statistics for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionAnalytics {
    pub session_id: String,
    pub status: SessionStatus,
    pub total_steps: usize,
    pub revision_count: usize,
    pub branch_count: usize,
    /// Mean gap between consecutive thoughts in ledger order, in milliseconds.
    pub average_interval_ms: f64,
    pub counts_by_kind: KindCounts,
    pub branch_summaries: Vec<BranchSummary>,
    pub timeline: Vec<TimelineEntry>,
    pub progress: ProgressSummary,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindCounts {
    pub initial: usize,
    pub sequential: usize,
    pub revision: usize,
}

impl KindCounts {
    fn record(&mut self, kind: ThoughtKind) {
        match kind {
            ThoughtKind::Initial => self.initial += 1,
            ThoughtKind::Sequential => self.sequential += 1,
            ThoughtKind::Revision => self.revision += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchSummary {
    pub branch_id: String,
    pub thought_count: usize,
    pub from_thought: u32,
    pub thoughts: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub number: u32,
    pub timestamp: DateTime<Utc>,
    pub kind: ThoughtKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<String>,
}

/// How far the session has come against its advisory estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSummary {
    pub current_step: u32,
    pub estimated_steps: u32,
    /// Capped at 100, one decimal place.
    pub percentage: f64,
    pub status: SessionStatus,
}

// ============================================================================
// Derivation
// ============================================================================

/// Compute analytics for a session. Pure; reads nothing but `session`.
pub fn analyze(session: &Session) -> SessionAnalytics {
    let mut counts_by_kind = KindCounts::default();
    for thought in &session.thoughts {
        counts_by_kind.record(thought.kind);
    }

    let branch_summaries = session
        .branches
        .iter()
        .map(|b| BranchSummary {
            branch_id: b.id.clone(),
            thought_count: b.thoughts.len(),
            from_thought: b.from_thought,
            thoughts: b.thoughts.clone(),
        })
        .collect();

    let timeline = session
        .thoughts
        .iter()
        .map(|t| TimelineEntry {
            number: t.number,
            timestamp: t.timestamp,
            kind: t.kind,
            branch_id: t.branch_id.clone(),
        })
        .collect();

    SessionAnalytics {
        session_id: session.id.clone(),
        status: session.status,
        total_steps: session.total_steps(),
        revision_count: counts_by_kind.revision,
        branch_count: session.branches.len(),
        average_interval_ms: average_interval_ms(session),
        counts_by_kind,
        branch_summaries,
        timeline,
        progress: progress(session),
    }
}

/// Progress of a session against its step estimate.
pub fn progress(session: &Session) -> ProgressSummary {
    let estimated = session.estimated_steps.max(1);
    let ratio = f64::from(session.current_step) / f64::from(estimated) * 100.0;
    let percentage = (ratio.min(100.0) * 10.0).round() / 10.0;

    ProgressSummary {
        current_step: session.current_step,
        estimated_steps: session.estimated_steps,
        percentage,
        status: session.status,
    }
}

fn average_interval_ms(session: &Session) -> f64 {
    if session.thoughts.len() < 2 {
        return 0.0;
    }

    let total_ms: i64 = session
        .thoughts
        .windows(2)
        .map(|pair| (pair[1].timestamp - pair[0].timestamp).num_milliseconds())
        .sum();

    total_ms as f64 / (session.thoughts.len() - 1) as f64
}

// ============================================================================
// Tests
// ============================================================================
