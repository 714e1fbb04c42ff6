//! Seams between the speech engine and its collaborators.

use async_trait::async_trait;

use banter_core::Result;

/// A speech-to-text recognizer running single-utterance sessions.
///
/// One call is one session: non-continuous, fixed locale, final results only.
/// The call resolves with the final transcript, `None` for an utterance that
/// produced no text, or a `Capture` error. Exactly one of the three outcomes
/// occurs per session.
#[async_trait]
pub trait Recognizer: Send + Sync {
    async fn recognize(&self, locale: &str) -> Result<Option<String>>;
}

/// Receiver of completed speech submissions.
///
/// When an utterance completes with text, the engine writes the transcript to
/// the input slot and calls `submit_input` directly. This is the same entry
/// point the submit control invokes, so spoken input takes the typed path.
/// Implementations handle their own rejections; nothing bubbles back to the
/// capture session.
#[async_trait]
pub trait SubmitSink: Send + Sync {
    async fn submit_input(&self);
}
