//! Model seam and message shapes for streamed exchanges.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use banter_core::types::{ModelImage, Role};
use banter_core::Result;

/// One element of an outgoing user turn.
///
/// A dispatch with an attached image sends the image descriptor first and the
/// question text after it, in the same request.
#[derive(Clone, Debug, PartialEq)]
pub enum TurnPart {
    Text(String),
    InlineImage(ModelImage),
}

impl TurnPart {
    pub fn text(t: impl Into<String>) -> Self {
        TurnPart::Text(t.into())
    }

    /// The text content, when this part carries text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            TurnPart::Text(t) => Some(t),
            TurnPart::InlineImage(_) => None,
        }
    }
}

/// One normalized prior turn: role plus the first text part only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub role: Role,
    pub text: String,
}

impl HistoryTurn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }
}

/// Receiver of answer fragments for one streamed exchange.
///
/// Lazy, finite, forward-only: fragments arrive in order, a mid-stream
/// failure arrives in-band as an `Err` item, and channel close marks the end
/// of the sequence. The sequence is not restartable; the consumer drains it
/// fully before considering the exchange complete.
pub type FragmentRx = mpsc::Receiver<Result<String>>;

/// A model capable of streaming one exchange.
#[async_trait]
pub trait StreamModel: Send + Sync {
    /// Open a streaming exchange for the given prior history and outgoing
    /// user parts.
    ///
    /// Transport and open failures surface here as `Stream` errors; failures
    /// after the stream opens arrive in-band on the returned receiver.
    async fn open_stream(&self, history: &[HistoryTurn], parts: &[TurnPart]) -> Result<FragmentRx>;

    /// Model identifier for logs.
    fn model_name(&self) -> &str;
}

// =============================================================================
// Tests
// =============================================================================
