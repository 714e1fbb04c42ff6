pub mod gemini;
pub mod model;
pub mod session;

pub use gemini::GeminiClient;
pub use model::{FragmentRx, HistoryTurn, StreamModel, TurnPart};
pub use session::ChatSession;
