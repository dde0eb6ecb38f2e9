//! The thought ledger: numbering, linkage validation and branch bookkeeping.
//!
//! The ledger is append-only. A revision is a new entry pointing back at an
//! older number; nothing already in `thoughts` is ever edited or removed.

use chrono::Utc;
use thiserror::Error;

use crate::api::{AppendThoughtRequest, SessionStatus};

use super::model::{Branch, Metadata, Session, Thought, ThoughtKind};

/// Lookahead added to the step estimate when a caller asks for more thoughts.
pub const ESTIMATE_LOOKAHEAD: u32 = 3;

// ============================================================================
// Errors
// ============================================================================

/// A thought pointed at a ledger entry that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("revises_thought {0} does not exist in the ledger")]
    UnknownRevisionTarget(u32),

    #[error("branch_from_thought {0} does not exist in the ledger")]
    UnknownBranchOrigin(u32),

    #[error("revision is missing revises_thought")]
    MissingRevisionTarget,
}

// ============================================================================
// Ledger Operations
// ============================================================================

impl Session {
    /// Create an active session whose ledger holds the initial thought.
    pub fn new(
        id: String,
        initial_thought: String,
        context: serde_json::Value,
        estimated_steps: u32,
        metadata: Metadata,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            status: SessionStatus::Active,
            current_step: 1,
            estimated_steps: estimated_steps.max(1),
            thoughts: vec![Thought {
                number: 1,
                content: initial_thought,
                timestamp: now,
                kind: ThoughtKind::Initial,
                revises_thought: None,
                branch_from_thought: None,
                branch_id: None,
            }],
            branches: Vec::new(),
            context,
            metadata,
            conclusion: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a thought, returning the stored record.
    ///
    /// All references are validated before anything is touched, so an error
    /// leaves the session exactly as it was.
    pub fn append_thought(&mut self, req: &AppendThoughtRequest) -> Result<Thought, LedgerError> {
        let kind = if req.is_revision {
            ThoughtKind::Revision
        } else {
            ThoughtKind::Sequential
        };

        if kind == ThoughtKind::Revision && req.revises_thought.is_none() {
            return Err(LedgerError::MissingRevisionTarget);
        }
        if let Some(target) = req.revises_thought
            && self.thought(target).is_none()
        {
            return Err(LedgerError::UnknownRevisionTarget(target));
        }
        if let Some(origin) = req.branch_from_thought
            && self.thought(origin).is_none()
        {
            return Err(LedgerError::UnknownBranchOrigin(origin));
        }

        let number = self.next_number();
        let now = Utc::now();
        let thought = Thought {
            number,
            content: req.content.clone(),
            timestamp: now,
            kind,
            revises_thought: req.revises_thought,
            branch_from_thought: req.branch_from_thought,
            branch_id: req.branch_id.clone(),
        };

        if let Some(branch_id) = &req.branch_id {
            self.record_branch_thought(branch_id, req.branch_from_thought, number);
        }

        if req.needs_more_thoughts {
            self.estimated_steps = self
                .estimated_steps
                .saturating_add(ESTIMATE_LOOKAHEAD)
                .max(number.saturating_add(ESTIMATE_LOOKAHEAD));
        }

        self.thoughts.push(thought.clone());
        self.current_step = number;
        self.updated_at = now;

        Ok(thought)
    }

    fn next_number(&self) -> u32 {
        u32::try_from(self.thoughts.len()).map_or(u32::MAX, |len| len.saturating_add(1))
    }

    /// Find-or-create the branch and append `number` to it.
    ///
    /// A new branch without an explicit origin forks from the preceding thought.
    fn record_branch_thought(&mut self, branch_id: &str, from_thought: Option<u32>, number: u32) {
        match self.branches.iter_mut().find(|b| b.id == branch_id) {
            Some(branch) => branch.thoughts.push(number),
            None => self.branches.push(Branch {
                id: branch_id.to_string(),
                from_thought: from_thought.unwrap_or(number - 1),
                thoughts: vec![number],
            }),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn new_session(estimated_steps: u32) -> Session {
        Session::new(
            "session_test".to_string(),
            "Evaluate options".to_string(),
            serde_json::Value::Null,
            estimated_steps,
            Metadata::new(),
        )
    }

    fn assert_gapless(session: &Session) {
        let numbers: Vec<u32> = session.thoughts.iter().map(|t| t.number).collect();
        let expected: Vec<u32> = (1..=session.thoughts.len() as u32).collect();
        assert_eq!(numbers, expected);
    }

    #[test]
    fn new_session_seeds_initial_thought() {
        let session = new_session(3);

        assert_eq!(session.thoughts.len(), 1);
        assert_eq!(session.thoughts[0].number, 1);
        assert_eq!(session.thoughts[0].kind, ThoughtKind::Initial);
        assert_eq!(session.current_step, 1);
        assert_eq!(session.estimated_steps, 3);
        assert_eq!(session.status, SessionStatus::Active);
        assert!(session.branches.is_empty());
    }

    #[test]
    fn zero_estimate_is_clamped() {
        assert_eq!(new_session(0).estimated_steps, 1);
    }

    #[test]
    fn sequential_appends_are_gapless() {
        let mut session = new_session(3);
        for i in 0..5 {
            let thought = session
                .append_thought(&AppendThoughtRequest::sequential(format!("step {i}")))
                .unwrap();
            assert_eq!(thought.kind, ThoughtKind::Sequential);
            assert_eq!(session.current_step, thought.number);
        }

        assert_eq!(session.thoughts.len(), 6);
        assert_gapless(&session);
    }

    #[test]
    fn revision_of_existing_thought() {
        let mut session = new_session(3);
        let thought = session
            .append_thought(&AppendThoughtRequest::revision("Reconsider", 1))
            .unwrap();

        assert_eq!(thought.number, 2);
        assert_eq!(thought.kind, ThoughtKind::Revision);
        assert_eq!(thought.revises_thought, Some(1));
        // The revised thought is untouched.
        assert_eq!(session.thoughts[0].content, "Evaluate options");
        assert_eq!(session.thoughts[0].kind, ThoughtKind::Initial);
    }

    #[test]
    fn revision_of_future_thought_is_rejected() {
        let mut session = new_session(3);
        let before = session.clone();

        let err = session
            .append_thought(&AppendThoughtRequest::revision("Too early", 2))
            .unwrap_err();

        assert_eq!(err, LedgerError::UnknownRevisionTarget(2));
        assert_eq!(session, before);
    }

    #[test]
    fn revision_of_thought_zero_is_rejected() {
        let mut session = new_session(3);
        let err = session
            .append_thought(&AppendThoughtRequest::revision("Zero", 0))
            .unwrap_err();
        assert_eq!(err, LedgerError::UnknownRevisionTarget(0));
        assert_eq!(session.thoughts.len(), 1);
    }

    #[test]
    fn revision_without_target_is_rejected() {
        let mut session = new_session(3);
        let req = AppendThoughtRequest {
            content: "Revise what?".to_string(),
            is_revision: true,
            ..AppendThoughtRequest::default()
        };

        assert_eq!(
            session.append_thought(&req).unwrap_err(),
            LedgerError::MissingRevisionTarget
        );
        assert_eq!(session.thoughts.len(), 1);
    }

    #[test]
    fn unknown_branch_origin_is_rejected_without_creating_branch() {
        let mut session = new_session(3);
        let before = session.clone();

        let err = session
            .append_thought(&AppendThoughtRequest::branch("Fork", 7, "b1"))
            .unwrap_err();

        assert_eq!(err, LedgerError::UnknownBranchOrigin(7));
        assert_eq!(session, before);
    }

    #[test]
    fn branch_thoughts_accumulate_in_append_order() {
        let mut session = new_session(3);

        session
            .append_thought(&AppendThoughtRequest::branch("A1", 1, "a"))
            .unwrap();
        session
            .append_thought(&AppendThoughtRequest::sequential("main"))
            .unwrap();
        session
            .append_thought(&AppendThoughtRequest::branch("A2", 1, "a"))
            .unwrap();
        session
            .append_thought(&AppendThoughtRequest::branch("B1", 3, "b"))
            .unwrap();
        session
            .append_thought(&AppendThoughtRequest::branch("A3", 1, "a"))
            .unwrap();

        assert_eq!(session.branches.len(), 2);
        let a = session.branch("a").unwrap();
        assert_eq!(a.from_thought, 1);
        assert_eq!(a.thoughts, vec![2, 4, 6]);
        let b = session.branch("b").unwrap();
        assert_eq!(b.from_thought, 3);
        assert_eq!(b.thoughts, vec![5]);
        assert_gapless(&session);
    }

    #[test]
    fn branch_origin_is_fixed_at_first_sighting() {
        let mut session = new_session(3);
        session
            .append_thought(&AppendThoughtRequest::branch("A1", 1, "a"))
            .unwrap();
        session
            .append_thought(&AppendThoughtRequest::branch("A2", 2, "a"))
            .unwrap();

        assert_eq!(session.branch("a").unwrap().from_thought, 1);
    }

    #[test]
    fn branch_without_origin_forks_from_previous_thought() {
        let mut session = new_session(3);
        session
            .append_thought(&AppendThoughtRequest::sequential("two"))
            .unwrap();
        let req = AppendThoughtRequest {
            content: "three".to_string(),
            branch_id: Some("loose".to_string()),
            ..AppendThoughtRequest::default()
        };
        session.append_thought(&req).unwrap();

        let branch = session.branch("loose").unwrap();
        assert_eq!(branch.from_thought, 2);
        assert_eq!(branch.thoughts, vec![3]);
    }

    #[test]
    fn needs_more_thoughts_grows_estimate() {
        let mut session = new_session(3);
        let req = AppendThoughtRequest {
            content: "more".to_string(),
            needs_more_thoughts: true,
            ..AppendThoughtRequest::default()
        };

        session.append_thought(&req).unwrap();
        // max(3 + 3, 2 + 3)
        assert_eq!(session.estimated_steps, 6);

        session.append_thought(&req).unwrap();
        // max(6 + 3, 3 + 3)
        assert_eq!(session.estimated_steps, 9);
    }

    #[test]
    fn estimate_never_decreases() {
        let mut session = new_session(2);
        let mut last = session.estimated_steps;

        for i in 0..20 {
            let req = AppendThoughtRequest {
                content: format!("t{i}"),
                needs_more_thoughts: i % 3 == 0,
                ..AppendThoughtRequest::default()
            };
            session.append_thought(&req).unwrap();
            assert!(session.estimated_steps >= last);
            last = session.estimated_steps;
        }
    }

    #[test]
    fn appends_beyond_estimate_are_accepted() {
        let mut session = new_session(1);
        for i in 0..4 {
            session
                .append_thought(&AppendThoughtRequest::sequential(format!("t{i}")))
                .unwrap();
        }
        assert_eq!(session.current_step, 5);
        assert_eq!(session.estimated_steps, 1);
    }

    #[test]
    fn conclude_overwrites_previous_conclusion() {
        let mut session = new_session(3);
        session.conclude("first".to_string(), false);
        session.conclude("second".to_string(), true);

        assert!(session.is_completed());
        let conclusion = session.conclusion.as_ref().unwrap();
        assert_eq!(conclusion.content, "second");
        assert!(conclusion.success);
    }
}
