//! Gemini streaming client.
//!
//! Speaks the streamGenerateContent SSE endpoint: one POST per exchange,
//! answer fragments parsed out of `data:` lines and forwarded over a bounded
//! channel as they arrive.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

use banter_core::config::LlmConfig;
use banter_core::types::Role;
use banter_core::{BanterError, Result};

use crate::model::{FragmentRx, HistoryTurn, StreamModel, TurnPart};

const CONNECT_TIMEOUT_SECS: u64 = 10;
const FRAGMENT_CHANNEL_CAPACITY: usize = 32;

/// Streaming client for the Gemini generateContent API.
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    /// Create a client from config, resolving the API key from config or the
    /// `GEMINI_API_KEY` environment variable.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config.resolve_api_key();
        Self::with_key(config, api_key)
    }

    /// Create a client with an explicit API key.
    pub fn with_key(config: &LlmConfig, api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(BanterError::Config(
                "Gemini API key not set. Set llm.api_key or GEMINI_API_KEY.".to_string(),
            ));
        }

        // Connect timeout only. A total request timeout would cut off
        // long-lived answer streams; stalls are handled per fragment by the
        // consumer instead.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| BanterError::Stream(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    fn stream_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.endpoint, self.model
        )
    }

    /// Convert prior history plus the outgoing parts into wire contents.
    ///
    /// The outgoing turn keeps part order, so an attached image precedes the
    /// question text in the same user content.
    fn build_contents(history: &[HistoryTurn], parts: &[TurnPart]) -> Vec<GeminiContent> {
        let mut contents: Vec<GeminiContent> = history
            .iter()
            .map(|turn| GeminiContent {
                role: turn.role.as_str().to_string(),
                parts: vec![GeminiPart::text(&turn.text)],
            })
            .collect();

        contents.push(GeminiContent {
            role: Role::User.as_str().to_string(),
            parts: parts.iter().map(GeminiPart::from_turn_part).collect(),
        });

        contents
    }
}

#[async_trait]
impl StreamModel for GeminiClient {
    async fn open_stream(&self, history: &[HistoryTurn], parts: &[TurnPart]) -> Result<FragmentRx> {
        let request = GeminiRequest {
            contents: Self::build_contents(history, parts),
        };

        debug!(
            model = %self.model,
            contents = request.contents.len(),
            "Opening answer stream"
        );

        let response = self
            .client
            .post(self.stream_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| BanterError::Stream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(BanterError::Stream(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let (tx, rx) = mpsc::channel(FRAGMENT_CHANNEL_CAPACITY);

        // Process the SSE body in the background. All failures after this
        // point travel in-band so the consumer sees them while draining.
        tokio::spawn(async move {
            use futures::StreamExt;
            let mut stream = response.bytes_stream();
            let mut buffer = String::new();

            while let Some(chunk) = stream.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        let _ = tx.send(Err(BanterError::Stream(e.to_string()))).await;
                        return;
                    }
                };
                buffer.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(line_end) = buffer.find('\n') {
                    let line = buffer[..line_end].trim().to_string();
                    buffer = buffer[line_end + 1..].to_string();

                    if line.is_empty() {
                        continue;
                    }

                    if let Some(json_str) = line.strip_prefix("data: ") {
                        if json_str == "[DONE]" {
                            continue;
                        }

                        match parse_chunk(json_str) {
                            Ok(Some(text)) => {
                                if tx.send(Ok(text)).await.is_err() {
                                    return;
                                }
                            }
                            Ok(None) => {}
                            Err(e) => {
                                let _ = tx.send(Err(e)).await;
                                return;
                            }
                        }
                    }
                }
            }
        });

        Ok(rx)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Extract the text of one SSE chunk.
///
/// `None` means a chunk with no candidates (keep-alive or safety metadata),
/// which the stream loop skips without forwarding.
fn parse_chunk(json_str: &str) -> Result<Option<String>> {
    let response: GeminiResponse = serde_json::from_str(json_str)
        .map_err(|e| BanterError::Stream(format!("Malformed stream chunk: {}", e)))?;

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Ok(None);
    };

    let text = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<String>()
        })
        .unwrap_or_default();

    Ok(Some(text))
}

// =============================================================================
// Gemini API Types
// =============================================================================

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    role: String,
    // Terminal chunks may carry content with no parts at all.
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<GeminiInlineData>,
}

impl GeminiPart {
    fn text(t: &str) -> Self {
        Self {
            text: Some(t.to_string()),
            inline_data: None,
        }
    }

    fn from_turn_part(part: &TurnPart) -> Self {
        match part {
            TurnPart::Text(text) => Self::text(text),
            TurnPart::InlineImage(image) => Self {
                text: None,
                inline_data: Some(GeminiInlineData {
                    mime_type: image.mime_type.clone(),
                    data: image.data.clone(),
                }),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use banter_core::types::ModelImage;

    fn config() -> LlmConfig {
        LlmConfig {
            api_key: "test-key".to_string(),
            ..LlmConfig::default()
        }
    }

    #[test]
    fn test_with_key_rejects_empty_key() {
        let result = GeminiClient::with_key(&config(), "");
        assert!(matches!(result, Err(BanterError::Config(_))));
    }

    #[test]
    fn test_stream_url() {
        let client = GeminiClient::with_key(&config(), "test-key").unwrap();
        assert_eq!(
            client.stream_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:streamGenerateContent?alt=sse"
        );
    }

    #[test]
    fn test_stream_url_trims_trailing_slash() {
        let cfg = LlmConfig {
            endpoint: "http://localhost:8080/".to_string(),
            ..config()
        };
        let client = GeminiClient::with_key(&cfg, "test-key").unwrap();
        assert_eq!(
            client.stream_url(),
            "http://localhost:8080/v1beta/models/gemini-1.5-flash:streamGenerateContent?alt=sse"
        );
    }

    #[test]
    fn test_build_contents_appends_outgoing_user_turn() {
        let history = vec![
            HistoryTurn::new(Role::User, "earlier"),
            HistoryTurn::new(Role::Model, "reply"),
        ];
        let parts = vec![TurnPart::text("Hello")];

        let contents = GeminiClient::build_contents(&history, &parts);
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0].role, "user");
        assert_eq!(contents[1].role, "model");
        assert_eq!(contents[2].role, "user");
        assert_eq!(contents[2].parts[0].text.as_deref(), Some("Hello"));
    }

    #[test]
    fn test_build_contents_keeps_image_before_text() {
        let parts = vec![
            TurnPart::InlineImage(ModelImage::new("image/png", "ZGF0YQ==")),
            TurnPart::text("What is this"),
        ];

        let contents = GeminiClient::build_contents(&[], &parts);
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0].parts.len(), 2);
        assert!(contents[0].parts[0].inline_data.is_some());
        assert_eq!(contents[0].parts[1].text.as_deref(), Some("What is this"));
    }

    #[test]
    fn test_request_serialization_uses_camel_case() {
        let request = GeminiRequest {
            contents: GeminiClient::build_contents(
                &[],
                &[
                    TurnPart::InlineImage(ModelImage::new("image/png", "ZGF0YQ==")),
                    TurnPart::text("Hello"),
                ],
            ),
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"inlineData\""));
        assert!(json.contains("\"mimeType\""));
        assert!(!json.contains("\"text\":null"));
    }

    #[test]
    fn test_parse_chunk_extracts_text() {
        let json = r#"{
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": "Hi there"}]}}
            ]
        }"#;

        assert_eq!(parse_chunk(json).unwrap(), Some("Hi there".to_string()));
    }

    #[test]
    fn test_parse_chunk_concatenates_parts() {
        let json = r#"{
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": "Hi"}, {"text": " there"}]}}
            ]
        }"#;

        assert_eq!(parse_chunk(json).unwrap(), Some("Hi there".to_string()));
    }

    #[test]
    fn test_parse_chunk_no_candidates_is_skipped() {
        assert_eq!(parse_chunk(r#"{"candidates": []}"#).unwrap(), None);
        assert_eq!(parse_chunk(r#"{}"#).unwrap(), None);
    }

    #[test]
    fn test_parse_chunk_candidate_without_content_is_empty() {
        let json = r#"{"candidates": [{"finishReason": "STOP"}]}"#;
        assert_eq!(parse_chunk(json).unwrap(), Some(String::new()));
    }

    #[test]
    fn test_parse_chunk_content_without_parts_is_empty() {
        let json = r#"{"candidates": [{"content": {"role": "model"}, "finishReason": "SAFETY"}]}"#;
        assert_eq!(parse_chunk(json).unwrap(), Some(String::new()));
    }

    #[test]
    fn test_parse_chunk_malformed_is_stream_error() {
        let result = parse_chunk("not json");
        assert!(matches!(result, Err(BanterError::Stream(_))));
    }
}
