//! Chat session seeded from persisted history.

use std::sync::Arc;

use tracing::debug;

use banter_core::types::{Conversation, Role};
use banter_core::Result;

use crate::model::{FragmentRx, HistoryTurn, StreamModel, TurnPart};

/// One model-facing conversation, seeded once from the stored document.
///
/// Each stored turn is normalized to its first text part. An empty history is
/// seeded with a single empty user turn so the model always sees a user
/// message before the first reply.
pub struct ChatSession {
    model: Arc<dyn StreamModel>,
    history: Vec<HistoryTurn>,
}

impl ChatSession {
    pub fn new(model: Arc<dyn StreamModel>, conversation: &Conversation) -> Self {
        let mut history: Vec<HistoryTurn> = conversation
            .history
            .iter()
            .map(|turn| HistoryTurn::new(turn.role, turn.first_text()))
            .collect();

        if history.is_empty() {
            history.push(HistoryTurn::new(Role::User, ""));
        }

        debug!(
            conversation_id = %conversation.id,
            turns = history.len(),
            "Seeded chat session"
        );

        Self { model, history }
    }

    pub fn history(&self) -> &[HistoryTurn] {
        &self.history
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Open a streamed exchange against the current history.
    ///
    /// History is unchanged until the exchange is recorded, so a failed
    /// stream leaves no half-written turn behind.
    pub async fn send_streaming(&self, parts: &[TurnPart]) -> Result<FragmentRx> {
        self.model.open_stream(&self.history, parts).await
    }

    /// Record a completed exchange: the user question followed by the full
    /// accumulated reply.
    pub fn record_exchange(&mut self, question: &str, reply: &str) {
        self.history.push(HistoryTurn::new(Role::User, question));
        self.history.push(HistoryTurn::new(Role::Model, reply));
    }
}

// =============================================================================
// Tests
// =============================================================================
