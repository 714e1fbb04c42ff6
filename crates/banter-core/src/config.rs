use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{BanterError, Result};

/// Top-level configuration for the Banter application.
///
/// Loaded from `~/.banter/config.toml` by default. Each section corresponds
/// to one component of the turn pipeline or a cross-cutting concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BanterConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

impl Default for BanterConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            speech: SpeechConfig::default(),
            llm: LlmConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl BanterConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: BanterConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| BanterError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Speech capture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Whether the speech capture adapter is enabled.
    pub enabled: bool,
    /// Recognizer language tag. Sessions are single-language.
    pub locale: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            locale: "en-US".to_string(),
        }
    }
}

/// Streaming model configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API endpoint base URL.
    pub endpoint: String,
    /// Model identifier.
    pub model: String,
    /// API key. When empty, `GEMINI_API_KEY` is consulted at startup.
    pub api_key: String,
    /// Maximum seconds to wait for each streamed fragment.
    pub fragment_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-1.5-flash".to_string(),
            api_key: String::new(),
            fragment_timeout_secs: 60,
        }
    }
}

impl LlmConfig {
    /// Returns the configured API key, falling back to the `GEMINI_API_KEY`
    /// environment variable when the config value is empty.
    pub fn resolve_api_key(&self) -> String {
        if self.api_key.is_empty() {
            std::env::var("GEMINI_API_KEY").unwrap_or_default()
        } else {
            self.api_key.clone()
        }
    }
}

/// Conversation store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Base URL of the conversation API.
    pub base_url: String,
    /// Session cookie sent with every store request, when set.
    pub auth_cookie: Option<String>,
    /// Maximum seconds to wait for each store request.
    pub request_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            auth_cookie: None,
            request_timeout_secs: 30,
        }
    }
}
