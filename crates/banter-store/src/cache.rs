//! In-memory cache of conversation documents.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use banter_core::types::{Conversation, ConversationId};
use banter_core::Result;

use crate::gateway::TurnStore;

/// Cache key for one conversation document.
pub fn conversation_key(id: &ConversationId) -> String {
    format!("chat:{}", id)
}

/// Conversation cache in front of a [`TurnStore`].
///
/// After a successful save the entry is invalidated and reloaded from the
/// store, so readers always observe the persisted turn rather than a locally
/// patched document.
pub struct ConversationCache {
    store: Arc<dyn TurnStore>,
    entries: Mutex<HashMap<String, Conversation>>,
}

impl ConversationCache {
    pub fn new(store: Arc<dyn TurnStore>) -> Self {
        Self {
            store,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The cached document, when present.
    pub async fn get(&self, id: &ConversationId) -> Option<Conversation> {
        self.entries.lock().await.get(&conversation_key(id)).cloned()
    }

    /// Load a conversation through the cache, fetching on miss.
    pub async fn load(&self, id: &ConversationId) -> Result<Conversation> {
        if let Some(conversation) = self.get(id).await {
            return Ok(conversation);
        }

        let conversation = self.store.fetch_conversation(id).await?;
        self.entries
            .lock()
            .await
            .insert(conversation_key(id), conversation.clone());
        Ok(conversation)
    }

    /// Drop the cached entry and fetch a fresh document from the store.
    pub async fn invalidate_and_reload(&self, id: &ConversationId) -> Result<Conversation> {
        let key = conversation_key(id);
        self.entries.lock().await.remove(&key);

        let conversation = self.store.fetch_conversation(id).await?;
        self.entries.lock().await.insert(key, conversation.clone());

        debug!(
            conversation_id = %id,
            turns = conversation.history.len(),
            "Reloaded conversation"
        );
        Ok(conversation)
    }
}

// =============================================================================
// Tests
// =============================================================================
