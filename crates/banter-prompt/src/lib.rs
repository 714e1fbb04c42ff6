//! Turn accumulation and orchestration.
//!
//! One `PromptOrchestrator` per conversation view drives the full turn
//! pipeline: validate and record the question, stream the answer fragment by
//! fragment, persist the completed turn, reload the conversation, reset the
//! prompt. The phase machine guarantees at most one turn in flight.

pub mod draft;
pub mod orchestrator;
pub mod replay;
pub mod state;

pub use draft::InFlightTurn;
pub use orchestrator::{PromptOrchestrator, EMPTY_QUESTION_ALERT, TURN_FAILED_ALERT};
pub use replay::ReplayLedger;
pub use state::{PhaseMachine, TurnPhase};
