use std::time::Instant;

use thiserror::Error;
use uuid::Uuid;

use crate::dao::models::QuizStatus;

/// Organizer-driven events that can be applied to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Begin the session from `draft`, or resume it from `paused`.
    Start,
    /// Suspend answering while keeping the current question.
    Pause,
    /// Move to the next question; the current one is graded first.
    Advance,
    /// Finish the session and grade the current question.
    End,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while {from:?}")]
pub struct InvalidTransition {
    /// The status the session was in when the invalid event was received.
    pub from: QuizStatus,
    /// The event that cannot be applied from this status.
    pub event: SessionEvent,
}

/// Errors that can occur when planning a session transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// A transition is already pending and must be applied or aborted.
    AlreadyPending,
    /// The requested transition is not valid from the current status.
    InvalidTransition(InvalidTransition),
}

/// Errors that can occur when applying a planned session transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
    /// Session status changed since the plan was created.
    StatusMismatch {
        /// Status when the plan was created.
        expected: QuizStatus,
        /// Current status.
        actual: QuizStatus,
    },
    /// Session version changed since the plan was created.
    VersionMismatch {
        /// Version when the plan was created.
        expected: usize,
        /// Current version.
        actual: usize,
    },
}

/// Errors that can occur when aborting a planned session transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
}

/// Unique identifier for a planned session transition.
pub type PlanId = Uuid;

/// A session transition that has been validated but not yet committed.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Unique identifier for this plan.
    pub id: PlanId,
    /// Status the session is currently in.
    pub from: QuizStatus,
    /// Status the session will transition to.
    pub to: QuizStatus,
    /// Event that triggered this transition.
    pub event: SessionEvent,
    /// Version number after applying this transition.
    pub version_next: usize,
    /// Timestamp when this plan was created.
    pub pending_since: Instant,
}

/// Per-session state machine enforcing `draft → active ⇄ paused → completed`.
///
/// It is the single writer of a session's status: a transition is first
/// *planned* (validated against the transition table), its side effects run,
/// then the plan is *applied* under a compare-and-swap on status and version,
/// or *aborted* when the side effects fail. `completed` is terminal.
#[derive(Debug, Clone)]
pub struct SessionStateMachine {
    status: QuizStatus,
    version: usize,
    pending: Option<Plan>,
}

impl SessionStateMachine {
    /// Create a state machine hydrated with the session's persisted status.
    pub fn new(status: QuizStatus) -> Self {
        Self {
            status,
            version: 0,
            pending: None,
        }
    }

    /// Inspect the current status.
    pub fn status(&self) -> QuizStatus {
        self.status
    }

    /// Plan a transition by validating that the event can be applied from the
    /// current status. Returns a Plan that can later be applied or aborted.
    pub fn plan(&mut self, event: SessionEvent) -> Result<Plan, PlanError> {
        if self.pending.is_some() {
            return Err(PlanError::AlreadyPending);
        }

        let next = self
            .compute_transition(event)
            .map_err(PlanError::InvalidTransition)?;

        let plan = Plan {
            id: Uuid::new_v4(),
            from: self.status,
            to: next,
            event,
            version_next: self.version + 1,
            pending_since: Instant::now(),
        };

        self.pending = Some(plan.clone());

        Ok(plan)
    }

    /// Apply a planned transition, moving the session to the next status.
    /// Returns the new status after the transition.
    pub fn apply(&mut self, plan_id: PlanId) -> Result<QuizStatus, ApplyError> {
        let plan = self.pending.take().ok_or(ApplyError::NoPending)?;

        if plan.id != plan_id {
            let expected_plan_id = plan.id;
            self.pending = Some(plan);
            return Err(ApplyError::IdMismatch {
                expected: expected_plan_id,
                got: plan_id,
            });
        }

        if self.status != plan.from {
            return Err(ApplyError::StatusMismatch {
                expected: plan.from,
                actual: self.status,
            });
        }

        if self.version + 1 != plan.version_next {
            return Err(ApplyError::VersionMismatch {
                expected: plan.version_next,
                actual: self.version + 1,
            });
        }

        self.status = plan.to;
        self.version = plan.version_next;
        self.pending = None;

        Ok(self.status)
    }

    /// Abort a planned transition without applying it, leaving the session in
    /// its previous status.
    pub fn abort(&mut self, plan_id: PlanId) -> Result<(), AbortError> {
        let plan = self.pending.as_ref().ok_or(AbortError::NoPending)?;

        if plan.id != plan_id {
            return Err(AbortError::IdMismatch {
                expected: plan.id,
                got: plan_id,
            });
        }

        self.pending = None;
        Ok(())
    }

    /// Compute the target status for an event if the transition is valid.
    fn compute_transition(&self, event: SessionEvent) -> Result<QuizStatus, InvalidTransition> {
        let next = match (self.status, event) {
            (QuizStatus::Draft, SessionEvent::Start) => QuizStatus::Active,
            (QuizStatus::Paused, SessionEvent::Start) => QuizStatus::Active,
            (QuizStatus::Active, SessionEvent::Pause) => QuizStatus::Paused,
            // Advancing keeps the session active; the question pointer moves
            // as a side effect of the transition work.
            (QuizStatus::Active, SessionEvent::Advance) => QuizStatus::Active,
            (QuizStatus::Active, SessionEvent::End) => QuizStatus::Completed,
            (QuizStatus::Paused, SessionEvent::End) => QuizStatus::Completed,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(sm: &mut SessionStateMachine, event: SessionEvent) -> QuizStatus {
        let plan = sm.plan(event).unwrap();
        sm.apply(plan.id).unwrap()
    }

    #[test]
    fn full_happy_path_through_session() {
        let mut sm = SessionStateMachine::new(QuizStatus::Draft);

        assert_eq!(apply(&mut sm, SessionEvent::Start), QuizStatus::Active);
        assert_eq!(apply(&mut sm, SessionEvent::Advance), QuizStatus::Active);
        assert_eq!(apply(&mut sm, SessionEvent::Pause), QuizStatus::Paused);
        assert_eq!(apply(&mut sm, SessionEvent::Start), QuizStatus::Active);
        assert_eq!(apply(&mut sm, SessionEvent::End), QuizStatus::Completed);
    }

    #[test]
    fn draft_rejects_everything_but_start() {
        for event in [SessionEvent::Pause, SessionEvent::Advance, SessionEvent::End] {
            let mut sm = SessionStateMachine::new(QuizStatus::Draft);
            let err = sm.plan(event).unwrap_err();
            match err {
                PlanError::InvalidTransition(invalid) => {
                    assert_eq!(invalid.from, QuizStatus::Draft);
                    assert_eq!(invalid.event, event);
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn completed_is_terminal() {
        for event in [
            SessionEvent::Start,
            SessionEvent::Pause,
            SessionEvent::Advance,
            SessionEvent::End,
        ] {
            let mut sm = SessionStateMachine::new(QuizStatus::Completed);
            assert!(matches!(
                sm.plan(event),
                Err(PlanError::InvalidTransition(_))
            ));
        }
    }

    #[test]
    fn paused_can_resume_or_end_only() {
        let mut sm = SessionStateMachine::new(QuizStatus::Paused);
        assert!(sm.plan(SessionEvent::Advance).is_err());

        let mut sm = SessionStateMachine::new(QuizStatus::Paused);
        assert!(sm.plan(SessionEvent::Pause).is_err());

        let mut sm = SessionStateMachine::new(QuizStatus::Paused);
        assert_eq!(apply(&mut sm, SessionEvent::End), QuizStatus::Completed);
    }

    #[test]
    fn planning_twice_without_apply_fails() {
        let mut sm = SessionStateMachine::new(QuizStatus::Draft);
        sm.plan(SessionEvent::Start).unwrap();
        assert!(matches!(
            sm.plan(SessionEvent::Start),
            Err(PlanError::AlreadyPending)
        ));
    }

    #[test]
    fn abort_clears_pending() {
        let mut sm = SessionStateMachine::new(QuizStatus::Draft);
        let plan = sm.plan(SessionEvent::Start).unwrap();
        sm.abort(plan.id).unwrap();
        assert_eq!(sm.status(), QuizStatus::Draft);
        assert!(sm.plan(SessionEvent::Start).is_ok());
    }

    #[test]
    fn apply_with_wrong_plan_id_keeps_pending() {
        let mut sm = SessionStateMachine::new(QuizStatus::Draft);
        let plan = sm.plan(SessionEvent::Start).unwrap();
        let err = sm.apply(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, ApplyError::IdMismatch { .. }));
        // The original plan is still pending and can be applied.
        assert_eq!(sm.apply(plan.id).unwrap(), QuizStatus::Active);
    }
}
