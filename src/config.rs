//! Configuration types for the conversational front end.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// AI gateway connection settings.
    pub gateway: GatewayConfig,
    /// Speech-to-text dictation settings.
    pub dictation: DictationConfig,
    /// Text-to-speech playback settings.
    pub playback: PlaybackConfig,
    /// Session actor channel sizing.
    pub session: SessionConfig,
}

/// AI gateway connection settings.
///
/// Generation parameters are deliberately absent: they are fixed constants
/// in [`crate::gateway::GenerationConfig`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Base URL of the generative-language API.
    pub base_url: String,
    /// Model identifier used in the request path.
    pub model: String,
    /// API key. When `None`, the key is read from `api_key_env`.
    pub api_key: Option<String>,
    /// Environment variable consulted when `api_key` is unset.
    pub api_key_env: String,
    /// Whole-request timeout in seconds. A timeout is a transport failure.
    pub request_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_owned(),
            model: "gemini-2.0-flash-exp".to_owned(),
            api_key: None,
            api_key_env: "GEMINI_API_KEY".to_owned(),
            request_timeout_secs: 120,
        }
    }
}

impl GatewayConfig {
    /// Resolve the API key from config or the configured environment variable.
    ///
    /// Returns an empty string when neither is set; the gateway will then
    /// answer with a non-success status, which surfaces as a normal error turn.
    pub fn resolved_api_key(&self) -> String {
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            return key.to_owned();
        }
        std::env::var(&self.api_key_env).unwrap_or_default()
    }
}

/// Dictation (speech-to-text) settings passed to the recognizer backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DictationConfig {
    /// BCP-47 language tag for recognition.
    pub language: String,
    /// Whether the backend should report interim (non-final) segments.
    pub interim_results: bool,
    /// Keep listening across pauses until toggled off.
    pub continuous: bool,
}

impl Default for DictationConfig {
    fn default() -> Self {
        Self {
            language: "en-US".to_owned(),
            interim_results: true,
            continuous: true,
        }
    }
}

/// Playback (text-to-speech) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// BCP-47 language tag for synthesis.
    pub language: String,
    /// Speaking rate multiplier (1.0 = normal).
    pub rate: f32,
    /// Pitch multiplier (1.0 = normal).
    pub pitch: f32,
    /// Preferred voice name (None = backend default).
    pub voice: Option<String>,
    /// Phrase spoken in place of a fenced code block.
    pub code_block_phrase: String,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            language: "en-US".to_owned(),
            rate: 1.0,
            pitch: 1.0,
            voice: None,
            code_block_phrase: "code block".to_owned(),
        }
    }
}

/// Session actor channel sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Capacity of the command channel into the session owner.
    pub request_capacity: usize,
    /// Capacity of the broadcast channel carrying session events.
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            request_capacity: 64,
            event_capacity: 256,
        }
    }
}

impl ChatConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::error::ChatError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::ChatError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `~/.config/confab/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("confab").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("confab")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/confab-config/config.toml")
        }
    }
}
