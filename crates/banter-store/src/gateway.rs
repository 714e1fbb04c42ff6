//! Persistence seam for completed turns.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use banter_core::types::{Conversation, ConversationId};
use banter_core::Result;

/// Body of one turn update.
///
/// `question` is absent for a replayed opening message, `img` is absent when
/// no image was attached. Absent fields are omitted from the wire entirely
/// rather than sent as null.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img: Option<String>,
}

impl TurnRecord {
    pub fn new(question: Option<String>, answer: impl Into<String>) -> Self {
        Self {
            question,
            answer: answer.into(),
            img: None,
        }
    }

    pub fn with_image(mut self, img: Option<String>) -> Self {
        self.img = img;
        self
    }
}

/// Store for conversation documents and completed turns.
#[async_trait]
pub trait TurnStore: Send + Sync {
    /// Persist one completed turn against the conversation.
    async fn save_turn(&self, id: &ConversationId, record: &TurnRecord) -> Result<()>;

    /// Fetch the current conversation document.
    async fn fetch_conversation(&self, id: &ConversationId) -> Result<Conversation>;
}

// =============================================================================
// Tests
// =============================================================================
