//! Turn phase machine.
//!
//! Enforces the lifecycle of one conversational turn:
//! - Idle -> Submitting -> Streaming -> Persisting -> Idle (success)
//! - Streaming -> Failed -> Idle (stream open/mid-stream failure or timeout)
//! - Persisting -> Failed -> Idle (save or reload failure)
//!
//! At most one turn is in flight per machine. A submission attempted outside
//! Idle fails its Idle -> Submitting transition and is rejected upstream.

use std::fmt;
use std::sync::{Arc, Mutex};

use banter_core::error::BanterError;

/// Phase of the turn currently owned by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnPhase {
    /// No turn in flight. Submissions are accepted.
    Idle,
    /// A submission was accepted and the question is being recorded.
    Submitting,
    /// The answer stream is open and fragments are accumulating.
    Streaming,
    /// The stream ended; the turn is being saved and the cache reloaded.
    Persisting,
    /// The turn failed after dispatch. Transient: the machine moves back to
    /// Idle once the alert has been raised, leaving partial content in place.
    Failed,
}

impl fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnPhase::Idle => write!(f, "Idle"),
            TurnPhase::Submitting => write!(f, "Submitting"),
            TurnPhase::Streaming => write!(f, "Streaming"),
            TurnPhase::Persisting => write!(f, "Persisting"),
            TurnPhase::Failed => write!(f, "Failed"),
        }
    }
}

impl TurnPhase {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &TurnPhase) -> bool {
        matches!(
            (self, target),
            (TurnPhase::Idle, TurnPhase::Submitting)
                | (TurnPhase::Submitting, TurnPhase::Streaming)
                | (TurnPhase::Streaming, TurnPhase::Persisting)
                | (TurnPhase::Streaming, TurnPhase::Failed)
                | (TurnPhase::Persisting, TurnPhase::Idle)
                | (TurnPhase::Persisting, TurnPhase::Failed)
                | (TurnPhase::Failed, TurnPhase::Idle)
        )
    }
}

/// Thread-safe phase machine for the turn lifecycle.
///
/// Wraps `TurnPhase` in an `Arc<Mutex<>>` so the orchestrator and the submit
/// surfaces can share it. All transitions are validated before being applied.
#[derive(Debug, Clone)]
pub struct PhaseMachine {
    phase: Arc<Mutex<TurnPhase>>,
}

impl Default for PhaseMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseMachine {
    /// Create a new phase machine initialized to `Idle`.
    pub fn new() -> Self {
        Self {
            phase: Arc::new(Mutex::new(TurnPhase::Idle)),
        }
    }

    /// Returns the current phase.
    pub fn current(&self) -> TurnPhase {
        *self.phase.lock().expect("phase mutex poisoned")
    }

    pub fn is_idle(&self) -> bool {
        self.current() == TurnPhase::Idle
    }

    /// Attempt to transition to the target phase.
    ///
    /// Returns `Ok(())` if the transition is valid, or a `BanterError::Turn`
    /// if the transition is not allowed from the current phase.
    pub fn transition(&self, target: TurnPhase) -> Result<(), BanterError> {
        let mut phase = self.phase.lock().expect("phase mutex poisoned");
        if phase.can_transition_to(&target) {
            tracing::debug!("Turn phase: {} -> {}", *phase, target);
            *phase = target;
            Ok(())
        } else {
            Err(BanterError::Turn(format!(
                "Invalid phase transition: {} -> {}",
                *phase, target
            )))
        }
    }

    /// Force the machine back to `Idle` regardless of the current phase.
    ///
    /// Recovery hatch for abandoning a turn whose normal exit path is
    /// unreachable. Normal flow goes through `transition`.
    pub fn force_idle(&self) {
        let mut phase = self.phase.lock().expect("phase mutex poisoned");
        if *phase != TurnPhase::Idle {
            tracing::warn!("Turn phase forced: {} -> Idle", *phase);
            *phase = TurnPhase::Idle;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
