use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Identifiers
// =============================================================================

/// Opaque identifier of a stored conversation.
///
/// Minted by the conversation store; the core never creates conversations,
/// it only addresses them.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Stored conversation shapes
// =============================================================================

/// Author of a conversation turn.
///
/// `Model` is the store's and model API's name for the assistant side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One text fragment of a stored turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPart {
    pub text: String,
}

impl StoredPart {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// One persisted conversation turn. Immutable once stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredTurn {
    pub role: Role,
    pub parts: Vec<StoredPart>,
    /// Storage path of an attached image, if one was persisted with the turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img: Option<String>,
}

impl StoredTurn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![StoredPart::new(text)],
            img: None,
        }
    }

    /// The text of the first part, or an empty string when none exists.
    ///
    /// Only the first text part of a stored turn survives history
    /// normalization for the model session.
    pub fn first_text(&self) -> &str {
        self.parts.first().map(|p| p.text.as_str()).unwrap_or("")
    }
}

/// A stored conversation and its ordered turn history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    #[serde(rename = "_id")]
    pub id: ConversationId,
    #[serde(default)]
    pub history: Vec<StoredTurn>,
}

impl Conversation {
    pub fn new(id: ConversationId) -> Self {
        Self {
            id,
            history: Vec::new(),
        }
    }
}

// =============================================================================
// Image attachment state
// =============================================================================

/// Descriptor of an image persisted by the upload widget.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredImage {
    /// Path of the stored file; this is what gets persisted with the turn.
    pub file_path: String,
    /// Opaque delivery URL, when the widget reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl StoredImage {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            url: None,
        }
    }
}

/// Inline image payload forwarded to the model alongside the question.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelImage {
    pub mime_type: String,
    /// Base64-encoded image bytes.
    pub data: String,
}

impl ModelImage {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }
}

/// Lifecycle of an optional image attachment on the in-flight turn.
///
/// Invariant: while `loading` is true both descriptors are absent. A present
/// `stored` descriptor means the upload succeeded and its path is safe to
/// persist; `model`, when present, is the payload sent to the model and may
/// differ in shape from what was stored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageState {
    pub loading: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored: Option<StoredImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelImage>,
}

impl ImageState {
    /// No attachment.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Upload in progress.
    pub fn loading() -> Self {
        Self {
            loading: true,
            ..Self::default()
        }
    }

    /// Upload complete. The inline model payload may lag behind or be absent.
    pub fn uploaded(stored: StoredImage, model: Option<ModelImage>) -> Self {
        Self {
            loading: false,
            error: None,
            stored: Some(stored),
            model,
        }
    }

    /// Upload failed.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            loading: false,
            error: Some(message.into()),
            stored: None,
            model: None,
        }
    }

    /// Whether an uploaded image is attached and ready to persist.
    pub fn is_ready(&self) -> bool {
        !self.loading && self.stored.is_some()
    }

    /// Inline payload for the model request, when one exists.
    pub fn model_payload(&self) -> Option<&ModelImage> {
        self.model.as_ref()
    }

    /// Storage path for persistence, when the upload succeeded.
    pub fn storage_path(&self) -> Option<&str> {
        self.stored.as_ref().map(|s| s.file_path.as_str())
    }

    /// Checks the loading/descriptor invariant.
    pub fn is_consistent(&self) -> bool {
        !(self.loading && (self.stored.is_some() || self.model.is_some()))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_id_display() {
        let id = ConversationId::new("665f1c2e9b1d");
        assert_eq!(id.to_string(), "665f1c2e9b1d");
        assert_eq!(id.as_str(), "665f1c2e9b1d");
    }

    #[test]
    fn test_conversation_id_serde_transparent() {
        let id = ConversationId::new("abc123");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"abc123\"");
        let back: ConversationId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(serde_json::to_string(&Role::Model).unwrap(), "\"model\"");
        let role: Role = serde_json::from_str("\"model\"").unwrap();
        assert_eq!(role, Role::Model);
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(Role::Model.to_string(), "model");
    }

    #[test]
    fn test_stored_turn_new() {
        let turn = StoredTurn::new(Role::User, "What is AI");
        assert_eq!(turn.role, Role::User);
        assert_eq!(turn.parts.len(), 1);
        assert_eq!(turn.first_text(), "What is AI");
        assert!(turn.img.is_none());
    }

    #[test]
    fn test_stored_turn_first_text_empty_parts() {
        let turn = StoredTurn {
            role: Role::Model,
            parts: vec![],
            img: None,
        };
        assert_eq!(turn.first_text(), "");
    }

    #[test]
    fn test_stored_turn_serialization_skips_missing_img() {
        let turn = StoredTurn::new(Role::User, "hello");
        let json = serde_json::to_string(&turn).unwrap();
        assert!(!json.contains("img"));

        let mut with_img = StoredTurn::new(Role::User, "look at this");
        with_img.img = Some("uploads/cat.png".to_string());
        let json = serde_json::to_string(&with_img).unwrap();
        assert!(json.contains("uploads/cat.png"));
    }

    #[test]
    fn test_conversation_deserialization_from_store_document() {
        let json = r#"{
            "_id": "665f1c2e9b1d",
            "history": [
                {"role": "user", "parts": [{"text": "What is AI"}]},
                {"role": "model", "parts": [{"text": "AI is..."}]}
            ]
        }"#;
        let conv: Conversation = serde_json::from_str(json).unwrap();
        assert_eq!(conv.id.as_str(), "665f1c2e9b1d");
        assert_eq!(conv.history.len(), 2);
        assert_eq!(conv.history[0].role, Role::User);
        assert_eq!(conv.history[1].first_text(), "AI is...");
    }

    #[test]
    fn test_conversation_missing_history_defaults_empty() {
        let json = r#"{"_id": "abc"}"#;
        let conv: Conversation = serde_json::from_str(json).unwrap();
        assert!(conv.history.is_empty());
    }

    #[test]
    fn test_stored_image_camel_case_fields() {
        let json = r#"{"filePath": "uploads/dog.png", "url": "https://ik.example/dog.png"}"#;
        let img: StoredImage = serde_json::from_str(json).unwrap();
        assert_eq!(img.file_path, "uploads/dog.png");
        assert_eq!(img.url.as_deref(), Some("https://ik.example/dog.png"));
    }

    #[test]
    fn test_model_image_camel_case_fields() {
        let json = r#"{"mimeType": "image/png", "data": "aGVsbG8="}"#;
        let img: ModelImage = serde_json::from_str(json).unwrap();
        assert_eq!(img.mime_type, "image/png");
        assert_eq!(img.data, "aGVsbG8=");
    }

    #[test]
    fn test_image_state_empty() {
        let state = ImageState::empty();
        assert!(!state.loading);
        assert!(state.error.is_none());
        assert!(!state.is_ready());
        assert!(state.is_consistent());
    }

    #[test]
    fn test_image_state_loading() {
        let state = ImageState::loading();
        assert!(state.loading);
        assert!(state.stored.is_none());
        assert!(state.model.is_none());
        assert!(!state.is_ready());
        assert!(state.is_consistent());
    }

    #[test]
    fn test_image_state_uploaded() {
        let state = ImageState::uploaded(
            StoredImage::new("uploads/cat.png"),
            Some(ModelImage::new("image/png", "ZGF0YQ==")),
        );
        assert!(state.is_ready());
        assert_eq!(state.storage_path(), Some("uploads/cat.png"));
        assert_eq!(state.model_payload().unwrap().mime_type, "image/png");
        assert!(state.is_consistent());
    }

    #[test]
    fn test_image_state_uploaded_without_model_payload() {
        let state = ImageState::uploaded(StoredImage::new("uploads/cat.png"), None);
        assert!(state.is_ready());
        assert!(state.model_payload().is_none());
    }

    #[test]
    fn test_image_state_failed() {
        let state = ImageState::failed("upload rejected");
        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some("upload rejected"));
        assert!(!state.is_ready());
        assert!(state.storage_path().is_none());
        assert!(state.is_consistent());
    }

    #[test]
    fn test_image_state_inconsistent_detected() {
        let state = ImageState {
            loading: true,
            error: None,
            stored: Some(StoredImage::new("x")),
            model: None,
        };
        assert!(!state.is_consistent());
    }
}
