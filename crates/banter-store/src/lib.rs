//! Conversation persistence over the chat service's REST API.

pub mod cache;
pub mod gateway;
pub mod http;

pub use cache::{conversation_key, ConversationCache};
pub use gateway::{TurnRecord, TurnStore};
pub use http::HttpTurnStore;
