//! Routes host command envelopes onto a session.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::attachment::{FileSelection, PreviewRef};
use crate::conversation::{MessageId, SendOutcome, SessionClient, SessionEvent};
use crate::error::{ChatError, Result};
use crate::host::contract::{
    CommandEnvelope, CommandName, ContractError, EVENT_VERSION, EventEnvelope, ResponseEnvelope,
};
use crate::speech::{DictationEvent, PlaybackEvent};

#[derive(Deserialize)]
struct DraftPayload {
    text: String,
}

#[derive(Deserialize, Default)]
struct SendPayload {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct StagePayload {
    files: Vec<FileSelection>,
}

#[derive(Deserialize)]
struct PreviewPayload {
    preview: String,
}

#[derive(Deserialize)]
struct PlaybackPayload {
    message_id: u64,
}

/// Stateless adapter between the wire contract and a [`SessionClient`].
#[derive(Clone)]
pub struct HostRouter {
    session: SessionClient,
}

impl HostRouter {
    #[must_use]
    pub fn new(session: SessionClient) -> Self {
        Self { session }
    }

    #[must_use]
    pub fn session(&self) -> &SessionClient {
        &self.session
    }

    /// Dispatch one envelope. Failures become error responses.
    pub async fn route(&self, envelope: &CommandEnvelope) -> ResponseEnvelope {
        let request_id = envelope.request_id.clone();
        match self.dispatch(envelope).await {
            Ok(payload) => ResponseEnvelope::ok(request_id, payload),
            Err(e) => {
                tracing::warn!(command = envelope.command.as_str(), error = %e, "host command failed");
                ResponseEnvelope::error(request_id, e.to_string())
            }
        }
    }

    async fn dispatch(&self, envelope: &CommandEnvelope) -> Result<serde_json::Value> {
        envelope.validate()?;
        let command = envelope.command;
        let payload = &envelope.payload;

        match command {
            CommandName::HostPing => Ok(json!({
                "pong": true,
                "contract_version": EVENT_VERSION,
            })),
            CommandName::DraftSet => {
                let DraftPayload { text } = parse_payload(command, payload)?;
                self.session.set_draft(text).await?;
                Ok(json!({ "accepted": true }))
            }
            CommandName::ConversationSend => {
                let SendPayload { text } = if payload.is_null() {
                    SendPayload::default()
                } else {
                    parse_payload(command, payload)?
                };
                if let Some(text) = text {
                    self.session.set_draft(text).await?;
                }
                match self.session.send().await? {
                    SendOutcome::Started(turn) => Ok(json!({ "status": "started", "turn": turn })),
                    SendOutcome::Refused(reason) => {
                        Ok(json!({ "status": "refused", "reason": reason }))
                    }
                }
            }
            CommandName::ConversationSnapshot => to_value(self.session.snapshot().await?),
            CommandName::AttachmentStage => {
                let StagePayload { files } = parse_payload(command, payload)?;
                let requested = files.len();
                let queued = self.session.stage_files(files).await?;
                Ok(json!({ "requested": requested, "queued": queued }))
            }
            CommandName::AttachmentRemove => {
                let preview = parse_preview(command, payload)?;
                let removed = self.session.remove_attachment(preview).await?;
                Ok(json!({ "removed": removed }))
            }
            CommandName::AttachmentPreview => {
                let preview = parse_preview(command, payload)?;
                let source = self.session.resolve_preview(preview).await?;
                Ok(json!({ "source": source }))
            }
            CommandName::DictationToggle => to_value(self.session.toggle_dictation().await?),
            CommandName::DictationEvent => {
                let event: DictationEvent = parse_payload(command, payload)?;
                to_value(self.session.dictation_event(event).await?)
            }
            CommandName::PlaybackToggle => {
                let PlaybackPayload { message_id } = parse_payload(command, payload)?;
                let status = self
                    .session
                    .toggle_playback(MessageId(message_id))
                    .await?
                    .ok_or_else(|| invalid(command, format!("unknown message {message_id}")))?;
                to_value(status)
            }
            CommandName::PlaybackEvent => {
                let event: PlaybackEvent = parse_payload(command, payload)?;
                to_value(self.session.playback_event(event).await?)
            }
            CommandName::RuntimeStop => Ok(json!({ "stopping": true })),
        }
    }
}

/// Wrap a session event for the wire.
#[must_use]
pub fn event_envelope(event: &SessionEvent) -> EventEnvelope {
    let payload = serde_json::to_value(event).unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to serialize session event");
        serde_json::Value::Null
    });
    EventEnvelope::new(uuid::Uuid::new_v4().to_string(), event.name(), payload)
}

fn parse_payload<T: DeserializeOwned>(
    command: CommandName,
    payload: &serde_json::Value,
) -> Result<T> {
    serde_json::from_value(payload.clone()).map_err(|e| invalid(command, e.to_string()))
}

fn parse_preview(command: CommandName, payload: &serde_json::Value) -> Result<PreviewRef> {
    let PreviewPayload { preview } = parse_payload(command, payload)?;
    PreviewRef::parse(&preview)
        .ok_or_else(|| invalid(command, format!("not a preview reference: {preview}")))
}

fn invalid(command: CommandName, message: String) -> ChatError {
    ContractError::InvalidPayload {
        command: command.as_str(),
        message,
    }
    .into()
}

fn to_value<T: serde::Serialize>(value: T) -> Result<serde_json::Value> {
    serde_json::to_value(value)
        .map_err(|e| ChatError::Channel(format!("failed to serialize response: {e}")))
}
