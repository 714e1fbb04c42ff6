//! Replay ledger for stored opening messages.
//!
//! A freshly created conversation holds only the user's opening message; on
//! first render the orchestrator dispatches that stored text as the first
//! turn. The ledger records which conversation ids have already replayed so
//! re-opening or re-rendering the same conversation never triggers it twice.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use banter_core::types::ConversationId;

/// Process-wide record of conversations whose opening message has replayed.
///
/// Clones share the same underlying set, so every orchestrator in the
/// process consults one ledger.
#[derive(Debug, Clone, Default)]
pub struct ReplayLedger {
    visited: Arc<Mutex<HashSet<String>>>,
}

impl ReplayLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the conversation visited. Returns true only on the first visit.
    pub fn first_visit(&self, id: &ConversationId) -> bool {
        self.visited
            .lock()
            .expect("replay ledger mutex poisoned")
            .insert(id.as_str().to_string())
    }

    pub fn has_visited(&self, id: &ConversationId) -> bool {
        self.visited
            .lock()
            .expect("replay ledger mutex poisoned")
            .contains(id.as_str())
    }

    /// Forget every visit. Called when the conversation list reloads.
    pub fn clear(&self) {
        self.visited
            .lock()
            .expect("replay ledger mutex poisoned")
            .clear();
    }
}

// =============================================================================
// Tests
// =============================================================================
