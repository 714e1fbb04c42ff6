//! In-flight turn draft.
//!
//! Holds the question, the append-only answer buffer, and the image
//! attachment for the turn currently moving through the pipeline. Cleared
//! only by a full reset after persistence succeeds; a failed turn keeps its
//! partial content so the user can see what failed.

use std::sync::{Arc, Mutex};

use banter_core::types::ImageState;

/// Mutable state of the current turn. Clones share the same underlying turn.
#[derive(Debug, Clone, Default)]
pub struct InFlightTurn {
    inner: Arc<Mutex<TurnDraft>>,
}

#[derive(Debug, Clone, Default)]
struct TurnDraft {
    question: String,
    answer: String,
    image: ImageState,
}

impl InFlightTurn {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the question for this turn.
    pub fn set_question(&self, text: &str) {
        let mut draft = self.inner.lock().expect("draft mutex poisoned");
        draft.question = text.to_string();
    }

    /// Begin a new turn: record the question and drop any partial answer
    /// left behind by an abandoned turn. The image attachment carries over.
    pub fn begin_turn(&self, question: &str) {
        let mut draft = self.inner.lock().expect("draft mutex poisoned");
        draft.question = question.to_string();
        draft.answer.clear();
    }

    pub fn question(&self) -> String {
        self.inner
            .lock()
            .expect("draft mutex poisoned")
            .question
            .clone()
    }

    /// Append one streamed fragment to the answer buffer.
    ///
    /// The buffer only ever grows until the next reset; empty fragments
    /// leave it unchanged. Returns the cumulative buffer length after the
    /// append.
    pub fn append_fragment(&self, delta: &str) -> usize {
        let mut draft = self.inner.lock().expect("draft mutex poisoned");
        draft.answer.push_str(delta);
        draft.answer.len()
    }

    pub fn answer(&self) -> String {
        self.inner
            .lock()
            .expect("draft mutex poisoned")
            .answer
            .clone()
    }

    /// Replace the image attachment state.
    pub fn attach_image(&self, image: ImageState) {
        let mut draft = self.inner.lock().expect("draft mutex poisoned");
        draft.image = image;
    }

    pub fn image(&self) -> ImageState {
        self.inner
            .lock()
            .expect("draft mutex poisoned")
            .image
            .clone()
    }

    /// Clear the question, the answer buffer, and the image. Idempotent.
    pub fn reset(&self) {
        let mut draft = self.inner.lock().expect("draft mutex poisoned");
        *draft = TurnDraft::default();
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use banter_core::types::StoredImage;

    #[test]
    fn test_draft_starts_empty() {
        let draft = InFlightTurn::new();
        assert_eq!(draft.question(), "");
        assert_eq!(draft.answer(), "");
        assert_eq!(draft.image(), ImageState::empty());
    }

    #[test]
    fn test_set_question() {
        let draft = InFlightTurn::new();
        draft.set_question("What is AI");
        assert_eq!(draft.question(), "What is AI");
    }

    #[test]
    fn test_append_fragment_accumulates_in_order() {
        let draft = InFlightTurn::new();
        assert_eq!(draft.append_fragment("Hi"), 2);
        assert_eq!(draft.append_fragment(" there"), 8);
        assert_eq!(draft.answer(), "Hi there");
    }

    #[test]
    fn test_append_empty_fragment_is_noop_on_content() {
        let draft = InFlightTurn::new();
        draft.append_fragment("Hi");
        assert_eq!(draft.append_fragment(""), 2);
        assert_eq!(draft.answer(), "Hi");
    }

    #[test]
    fn test_attach_image_replaces_state() {
        let draft = InFlightTurn::new();
        draft.attach_image(ImageState::loading());
        assert!(draft.image().loading);

        draft.attach_image(ImageState::uploaded(StoredImage::new("uploads/a.png"), None));
        let image = draft.image();
        assert!(!image.loading);
        assert_eq!(image.storage_path(), Some("uploads/a.png"));
    }

    #[test]
    fn test_reset_clears_everything() {
        let draft = InFlightTurn::new();
        draft.set_question("Hello");
        draft.append_fragment("Hi there");
        draft.attach_image(ImageState::uploaded(StoredImage::new("uploads/a.png"), None));

        draft.reset();
        assert_eq!(draft.question(), "");
        assert_eq!(draft.answer(), "");
        assert_eq!(draft.image(), ImageState::empty());
    }

    #[test]
    fn test_begin_turn_drops_stale_answer_keeps_image() {
        let draft = InFlightTurn::new();
        draft.set_question("first try");
        draft.append_fragment("Partial");
        draft.attach_image(ImageState::uploaded(StoredImage::new("uploads/a.png"), None));

        draft.begin_turn("second try");
        assert_eq!(draft.question(), "second try");
        assert_eq!(draft.answer(), "");
        assert_eq!(draft.image().storage_path(), Some("uploads/a.png"));
    }

    #[test]
    fn test_reset_is_idempotent() {
        let draft = InFlightTurn::new();
        draft.set_question("Hello");
        draft.reset();
        draft.reset();
        assert_eq!(draft.question(), "");
        assert_eq!(draft.answer(), "");
    }

    #[test]
    fn test_clones_share_state() {
        let draft = InFlightTurn::new();
        let other = draft.clone();
        draft.append_fragment("shared");
        assert_eq!(other.answer(), "shared");
    }
}
