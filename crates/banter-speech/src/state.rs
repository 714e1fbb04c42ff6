//! Listening state machine with thread-safe transitions.
//!
//! Enforces valid state transitions for the speech capture lifecycle:
//! - Idle -> Listening (session started)
//! - Listening -> Idle (utterance complete, explicit stop, or recognizer error)
//!
//! The state changes only on an explicit toggle or adapter-driven termination,
//! never as a side effect of the turn pipeline.

use std::fmt;
use std::sync::{Arc, Mutex};

use banter_core::error::BanterError;

/// Operational state of the speech capture adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenState {
    /// No capture session in progress. Ready to start.
    Idle,
    /// A recognizer session is active and waiting for an utterance.
    Listening,
}

impl fmt::Display for ListenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenState::Idle => write!(f, "Idle"),
            ListenState::Listening => write!(f, "Listening"),
        }
    }
}

impl ListenState {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &ListenState) -> bool {
        matches!(
            (self, target),
            (ListenState::Idle, ListenState::Listening)
                | (ListenState::Listening, ListenState::Idle)
        )
    }
}

/// Thread-safe state machine for the listening lifecycle.
///
/// Wraps `ListenState` in an `Arc<Mutex<>>` so the capture task and the
/// toggle surface can share it. All transitions are validated before being
/// applied, returning an error if the requested transition is not permitted.
#[derive(Debug, Clone)]
pub struct ListenStateMachine {
    state: Arc<Mutex<ListenState>>,
}

impl Default for ListenStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl ListenStateMachine {
    /// Create a new state machine initialized to `Idle`.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ListenState::Idle)),
        }
    }

    /// Returns the current state.
    pub fn current(&self) -> ListenState {
        *self.state.lock().expect("state mutex poisoned")
    }

    /// Attempt to transition to the target state.
    ///
    /// Returns `Ok(())` if the transition is valid, or a `BanterError::Capture`
    /// if the transition is not allowed from the current state.
    pub fn transition(&self, target: ListenState) -> Result<(), BanterError> {
        let mut state = self.state.lock().expect("state mutex poisoned");
        if state.can_transition_to(&target) {
            tracing::debug!("Listen state: {} -> {}", *state, target);
            *state = target;
            Ok(())
        } else {
            Err(BanterError::Capture(format!(
                "Invalid state transition: {} -> {}",
                *state, target
            )))
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_display() {
        assert_eq!(ListenState::Idle.to_string(), "Idle");
        assert_eq!(ListenState::Listening.to_string(), "Listening");
    }

    #[test]
    fn test_valid_transitions() {
        assert!(ListenState::Idle.can_transition_to(&ListenState::Listening));
        assert!(ListenState::Listening.can_transition_to(&ListenState::Idle));
    }

    #[test]
    fn test_invalid_transitions() {
        // Cannot transition to self
        assert!(!ListenState::Idle.can_transition_to(&ListenState::Idle));
        assert!(!ListenState::Listening.can_transition_to(&ListenState::Listening));
    }

    #[test]
    fn test_state_machine_round_trip() {
        let sm = ListenStateMachine::new();
        assert_eq!(sm.current(), ListenState::Idle);

        sm.transition(ListenState::Listening).unwrap();
        assert_eq!(sm.current(), ListenState::Listening);

        sm.transition(ListenState::Idle).unwrap();
        assert_eq!(sm.current(), ListenState::Idle);
    }

    #[test]
    fn test_state_machine_double_start_rejected() {
        let sm = ListenStateMachine::new();
        sm.transition(ListenState::Listening).unwrap();
        let result = sm.transition(ListenState::Listening);
        assert!(result.is_err());
        assert_eq!(sm.current(), ListenState::Listening);
    }

    #[test]
    fn test_state_machine_stop_while_idle_rejected() {
        let sm = ListenStateMachine::new();
        let result = sm.transition(ListenState::Idle);
        assert!(result.is_err());
        assert_eq!(sm.current(), ListenState::Idle);
    }

    #[test]
    fn test_state_machine_clone_is_shared() {
        let sm1 = ListenStateMachine::new();
        let sm2 = sm1.clone();

        sm1.transition(ListenState::Listening).unwrap();
        assert_eq!(sm2.current(), ListenState::Listening);
    }

    #[test]
    fn test_state_machine_transition_error_message() {
        let sm = ListenStateMachine::new();
        let result = sm.transition(ListenState::Idle);
        match result {
            Err(BanterError::Capture(msg)) => {
                assert!(msg.contains("Idle"));
            }
            _ => panic!("Expected Capture error variant"),
        }
    }
}
