//! HTTP-backed turn store.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::COOKIE;
use reqwest::Client;
use tracing::debug;

use banter_core::config::StoreConfig;
use banter_core::types::{Conversation, ConversationId};
use banter_core::{BanterError, Result};

use crate::gateway::{TurnRecord, TurnStore};

/// Turn store backed by the chat service's REST API.
///
/// Every request carries the configured session cookie when one is set, and
/// the cookie jar keeps anything the service sets across calls.
pub struct HttpTurnStore {
    client: Client,
    base_url: String,
    auth_cookie: Option<String>,
}

impl HttpTurnStore {
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .cookie_store(true)
            .build()
            .map_err(|e| BanterError::Persistence(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_cookie: config.auth_cookie.clone(),
        })
    }

    fn chat_url(&self, id: &ConversationId) -> String {
        format!("{}/api/chats/{}", self.base_url, id)
    }

    fn with_auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_cookie {
            Some(cookie) => builder.header(COOKIE, cookie),
            None => builder,
        }
    }
}

#[async_trait]
impl TurnStore for HttpTurnStore {
    async fn save_turn(&self, id: &ConversationId, record: &TurnRecord) -> Result<()> {
        let response = self
            .with_auth(self.client.put(self.chat_url(id)))
            .json(record)
            .send()
            .await
            .map_err(|e| BanterError::Persistence(format!("Failed to save turn: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(BanterError::Persistence(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        debug!(conversation_id = %id, "Saved turn");
        Ok(())
    }

    async fn fetch_conversation(&self, id: &ConversationId) -> Result<Conversation> {
        let response = self
            .with_auth(self.client.get(self.chat_url(id)))
            .send()
            .await
            .map_err(|e| BanterError::Persistence(format!("Failed to fetch conversation: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(BanterError::Persistence(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        response
            .json::<Conversation>()
            .await
            .map_err(|e| BanterError::Persistence(format!("Invalid conversation document: {}", e)))
    }
}

// =============================================================================
// Tests
// =============================================================================
