//! Versioned host command/event envelopes.

use serde::{Deserialize, Serialize};

/// Contract version for host command/event envelopes.
pub const EVENT_VERSION: u32 = 1;

/// Command set accepted by the host bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandName {
    #[serde(rename = "host.ping")]
    HostPing,
    #[serde(rename = "draft.set")]
    DraftSet,
    #[serde(rename = "conversation.send")]
    ConversationSend,
    #[serde(rename = "conversation.snapshot")]
    ConversationSnapshot,
    #[serde(rename = "attachment.stage")]
    AttachmentStage,
    #[serde(rename = "attachment.remove")]
    AttachmentRemove,
    #[serde(rename = "attachment.preview")]
    AttachmentPreview,
    #[serde(rename = "dictation.toggle")]
    DictationToggle,
    #[serde(rename = "dictation.event")]
    DictationEvent,
    #[serde(rename = "playback.toggle")]
    PlaybackToggle,
    #[serde(rename = "playback.event")]
    PlaybackEvent,
    #[serde(rename = "runtime.stop")]
    RuntimeStop,
}

impl CommandName {
    /// Render command name to wire format.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HostPing => "host.ping",
            Self::DraftSet => "draft.set",
            Self::ConversationSend => "conversation.send",
            Self::ConversationSnapshot => "conversation.snapshot",
            Self::AttachmentStage => "attachment.stage",
            Self::AttachmentRemove => "attachment.remove",
            Self::AttachmentPreview => "attachment.preview",
            Self::DictationToggle => "dictation.toggle",
            Self::DictationEvent => "dictation.event",
            Self::PlaybackToggle => "playback.toggle",
            Self::PlaybackEvent => "playback.event",
            Self::RuntimeStop => "runtime.stop",
        }
    }
}

/// A versioned response envelope from backend host -> frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub v: u32,
    pub request_id: String,
    pub ok: bool,
    pub payload: serde_json::Value,
    pub error: Option<String>,
}

impl ResponseEnvelope {
    #[must_use]
    pub fn ok(request_id: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            v: EVENT_VERSION,
            request_id: request_id.into(),
            ok: true,
            payload,
            error: None,
        }
    }

    #[must_use]
    pub fn error(request_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            v: EVENT_VERSION,
            request_id: request_id.into(),
            ok: false,
            payload: serde_json::Value::Null,
            error: Some(message.into()),
        }
    }
}

/// A versioned command envelope from frontend -> backend host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    pub v: u32,
    pub request_id: String,
    pub command: CommandName,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl CommandEnvelope {
    #[must_use]
    pub fn new(
        request_id: impl Into<String>,
        command: CommandName,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            v: EVENT_VERSION,
            request_id: request_id.into(),
            command,
            payload,
        }
    }

    /// Validate envelope version and required identifiers.
    ///
    /// # Errors
    ///
    /// Returns a [`ContractError`] for a foreign version or an empty id.
    pub fn validate(&self) -> Result<(), ContractError> {
        if self.v != EVENT_VERSION {
            return Err(ContractError::UnsupportedVersion {
                found: self.v,
                expected: EVENT_VERSION,
            });
        }
        if self.request_id.trim().is_empty() {
            return Err(ContractError::InvalidEnvelope(
                "request_id cannot be empty".to_owned(),
            ));
        }
        Ok(())
    }
}

/// A versioned event envelope from backend host -> frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub v: u32,
    pub event_id: String,
    pub event: String,
    pub payload: serde_json::Value,
}

impl EventEnvelope {
    #[must_use]
    pub fn new(
        event_id: impl Into<String>,
        event: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            v: EVENT_VERSION,
            event_id: event_id.into(),
            event: event.into(),
            payload,
        }
    }
}

/// Envelope or payload rejected by the bridge.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractError {
    #[error("unsupported contract version {found}; expected {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("invalid envelope: {0}")]
    InvalidEnvelope(String),

    #[error("invalid payload for {command}: {message}")]
    InvalidPayload {
        command: &'static str,
        message: String,
    },
}
