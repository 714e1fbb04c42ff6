pub mod engine;
pub mod recognizer;
pub mod slot;
pub mod state;

pub use engine::{CaptureSession, SpeechEngine};
pub use recognizer::{Recognizer, SubmitSink};
pub use slot::InputSlot;
pub use state::{ListenState, ListenStateMachine};
