use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::ConversationId;

/// Events emitted by the turn pipeline for the view layer.
///
/// Events are published on a `tokio::sync::broadcast` channel after state
/// changes and consumed by:
/// - The transcript renderer (question bubbles, incremental answer text)
/// - The alert surface (one message per failed turn)
/// - The event log (for debugging)
#[derive(Clone, Debug, Serialize, Deserialize)]
#[non_exhaustive]
pub enum PromptEvent {
    /// A speech capture session began.
    ListeningStarted { timestamp: DateTime<Utc> },

    /// The speech capture session ended, whether by a completed utterance,
    /// an explicit stop, or a recognizer error.
    ListeningStopped { timestamp: DateTime<Utc> },

    /// A new user question became visible in the transcript.
    QuestionPosted {
        text: String,
        timestamp: DateTime<Utc>,
    },

    /// A fragment was appended to the streaming answer buffer.
    AnswerAppended {
        delta: String,
        /// Cumulative buffer length after the append.
        answer_len: usize,
        timestamp: DateTime<Utc>,
    },

    /// The finished turn was written to the store and the cached conversation
    /// reloaded.
    TurnPersisted {
        conversation_id: ConversationId,
        timestamp: DateTime<Utc>,
    },

    /// The in-flight turn and the input control were cleared.
    PromptReset { timestamp: DateTime<Utc> },

    /// A user-visible alert was raised.
    AlertRaised {
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl PromptEvent {
    /// Returns the timestamp of the event.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            PromptEvent::ListeningStarted { timestamp }
            | PromptEvent::ListeningStopped { timestamp }
            | PromptEvent::QuestionPosted { timestamp, .. }
            | PromptEvent::AnswerAppended { timestamp, .. }
            | PromptEvent::TurnPersisted { timestamp, .. }
            | PromptEvent::PromptReset { timestamp }
            | PromptEvent::AlertRaised { timestamp, .. } => *timestamp,
        }
    }

    /// Returns a human-readable event name for logging.
    pub fn event_name(&self) -> &'static str {
        match self {
            PromptEvent::ListeningStarted { .. } => "listening_started",
            PromptEvent::ListeningStopped { .. } => "listening_stopped",
            PromptEvent::QuestionPosted { .. } => "question_posted",
            PromptEvent::AnswerAppended { .. } => "answer_appended",
            PromptEvent::TurnPersisted { .. } => "turn_persisted",
            PromptEvent::PromptReset { .. } => "prompt_reset",
            PromptEvent::AlertRaised { .. } => "alert_raised",
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
