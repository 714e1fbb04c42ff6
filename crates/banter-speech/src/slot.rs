//! Shared text-input slot.
//!
//! Typed and spoken input converge here. The speech engine writes final
//! transcripts into the slot before triggering submission, so the submit path
//! always reads ordinary text and cannot tell voice input from typing.

use std::sync::{Arc, Mutex};

/// Cheaply clonable handle to the single text-input field of the prompt view.
///
/// Clones share the same underlying string. On a successful turn the
/// orchestrator clears the slot; on failure the text is left in place.
#[derive(Debug, Clone, Default)]
pub struct InputSlot {
    text: Arc<Mutex<String>>,
}

impl InputSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the slot content.
    pub fn set(&self, text: &str) {
        let mut slot = self.text.lock().expect("input slot mutex poisoned");
        *slot = text.to_string();
    }

    /// Returns a copy of the slot content without consuming it.
    pub fn peek(&self) -> String {
        self.text.lock().expect("input slot mutex poisoned").clone()
    }

    /// Clear the slot.
    pub fn clear(&self) {
        self.text.lock().expect("input slot mutex poisoned").clear();
    }

    pub fn is_empty(&self) -> bool {
        self.text
            .lock()
            .expect("input slot mutex poisoned")
            .is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_starts_empty() {
        let slot = InputSlot::new();
        assert!(slot.is_empty());
        assert_eq!(slot.peek(), "");
    }

    #[test]
    fn test_slot_set_and_peek() {
        let slot = InputSlot::new();
        slot.set("What is AI");
        assert_eq!(slot.peek(), "What is AI");
        // Peek does not consume
        assert_eq!(slot.peek(), "What is AI");
        assert!(!slot.is_empty());
    }

    #[test]
    fn test_slot_set_replaces() {
        let slot = InputSlot::new();
        slot.set("first");
        slot.set("second");
        assert_eq!(slot.peek(), "second");
    }

    #[test]
    fn test_slot_clear() {
        let slot = InputSlot::new();
        slot.set("something");
        slot.clear();
        assert!(slot.is_empty());
    }

    #[test]
    fn test_slot_clones_share_state() {
        let slot = InputSlot::new();
        let other = slot.clone();
        slot.set("shared text");
        assert_eq!(other.peek(), "shared text");
        other.clear();
        assert!(slot.is_empty());
    }
}
