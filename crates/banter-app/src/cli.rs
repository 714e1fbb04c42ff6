//! CLI argument definitions for the Banter application.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Banter — a voice-enabled conversational prompt over a streaming model.
#[derive(Parser, Debug)]
#[command(name = "banter", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Identifier of the conversation to open.
    #[arg(long = "chat-id")]
    pub chat_id: Option<String>,

    /// Base URL of the conversation store API.
    #[arg(long = "base-url")]
    pub base_url: Option<String>,

    /// Recognizer language tag (e.g. en-US).
    #[arg(long = "locale")]
    pub locale: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > BANTER_CONFIG env var > platform default
    /// (~/.banter/config.toml).
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("BANTER_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the conversation identifier.
    ///
    /// Priority: --chat-id flag > BANTER_CHAT_ID env var.
    /// Returns `None` when neither is provided; the binary refuses to start
    /// without one.
    pub fn resolve_chat_id(&self) -> Option<String> {
        if let Some(ref id) = self.chat_id {
            return Some(id.clone());
        }
        std::env::var("BANTER_CHAT_ID").ok()
    }

    /// Resolve the conversation store base URL.
    ///
    /// Priority: --base-url flag > BANTER_STORE_URL env var > config file value.
    pub fn resolve_base_url(&self, config_url: &str) -> String {
        if let Some(ref url) = self.base_url {
            return url.clone();
        }
        if let Ok(url) = std::env::var("BANTER_STORE_URL") {
            return url;
        }
        config_url.to_string()
    }

    /// Resolve the recognizer locale.
    ///
    /// Priority: --locale flag > config file value.
    pub fn resolve_locale(&self, config_locale: &str) -> String {
        self.locale
            .clone()
            .unwrap_or_else(|| config_locale.to_string())
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    /// Returns `None` if not overridden.
    pub fn resolve_log_level(&self) -> Option<String> {
        self.log_level.clone()
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".banter").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".banter").join("config.toml");
    }
    PathBuf::from("config.toml")
}
