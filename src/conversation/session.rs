//! Single-owner session actor.
//!
//! [`SessionServer`] owns the [`Conversation`], the [`SpeechBridge`] and the
//! [`PreviewRegistry`]. Clients talk to it over an mpsc channel with oneshot
//! replies; file reads and gateway calls run as spawned tasks whose single
//! completion re-enters the server loop, so all state is mutated from one
//! task in a well-defined order. Observers receive [`SessionEvent`]s on a
//! broadcast channel.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

use super::message::{Message, MessageId};
use super::outcome::TurnOutcome;
use super::state::{
    Conversation, ConversationSnapshot, SendRefusal, StageSlot, TurnId, UiCommand,
};
use crate::attachment::{
    Attachment, AttachmentError, EncodedFile, FileSelection, PreviewRef, PreviewRegistry,
    PreviewSource, encoder, mime,
};
use crate::config::ChatConfig;
use crate::error::{ChatError, Result};
use crate::gateway::{AiGateway, GatewayError};
use crate::speech::{
    DictationEvent, PlaybackEvent, SpeechBridge, SpeechRecognizer, SpeechStatus,
    SpeechSynthesizer,
};

/// Result of a send trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum SendOutcome {
    Started(TurnId),
    Refused(SendRefusal),
}

/// Everything an observer can see at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub conversation: ConversationSnapshot,
    pub speech: SpeechStatus,
    /// Previews allocated and not yet released.
    pub live_previews: usize,
}

/// Broadcast notification of a state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    MessageAppended { message: Message },
    TurnStarted { turn: TurnId },
    TurnCompleted { turn: TurnId, outcome: TurnOutcome },
    AttachmentStaged { attachment: Attachment, index: usize },
    AttachmentRemoved { preview: PreviewRef },
    DraftChanged { draft: String },
    Ui { commands: Vec<UiCommand> },
    Speech { status: SpeechStatus },
}

impl SessionEvent {
    /// Dotted name used on the host wire.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MessageAppended { .. } => "conversation.message_appended",
            Self::TurnStarted { .. } => "conversation.turn_started",
            Self::TurnCompleted { .. } => "conversation.turn_completed",
            Self::AttachmentStaged { .. } => "attachment.staged",
            Self::AttachmentRemoved { .. } => "attachment.removed",
            Self::DraftChanged { .. } => "draft.changed",
            Self::Ui { .. } => "ui.commands",
            Self::Speech { .. } => "speech.status",
        }
    }
}

enum SessionRequest {
    SetDraft(String, oneshot::Sender<()>),
    Send(oneshot::Sender<SendOutcome>),
    StageFiles(Vec<FileSelection>, oneshot::Sender<usize>),
    RemoveAttachment(PreviewRef, oneshot::Sender<bool>),
    ResolvePreview(PreviewRef, oneshot::Sender<Option<PreviewSource>>),
    ToggleDictation(oneshot::Sender<SpeechStatus>),
    Dictation(DictationEvent, oneshot::Sender<SpeechStatus>),
    TogglePlayback(MessageId, oneshot::Sender<Option<SpeechStatus>>),
    Playback(PlaybackEvent, oneshot::Sender<SpeechStatus>),
    Snapshot(oneshot::Sender<SessionSnapshot>),
}

enum Completion {
    File {
        slot: StageSlot,
        result: std::result::Result<EncodedFile, AttachmentError>,
    },
    Turn {
        turn: TurnId,
        outcome: TurnOutcome,
    },
}

/// Cloneable handle to a running session.
#[derive(Clone)]
pub struct SessionClient {
    request_tx: mpsc::Sender<SessionRequest>,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl SessionClient {
    async fn call<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> SessionRequest,
    ) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.request_tx
            .send(build(reply_tx))
            .await
            .map_err(|e| ChatError::Channel(format!("session closed: {e}")))?;
        reply_rx
            .await
            .map_err(|e| ChatError::Channel(format!("session reply dropped: {e}")))
    }

    /// Replace the input buffer.
    pub async fn set_draft(&self, text: impl Into<String>) -> Result<()> {
        let text = text.into();
        self.call(|tx| SessionRequest::SetDraft(text, tx)).await
    }

    /// Trigger a send of the current draft and staged attachments.
    pub async fn send(&self) -> Result<SendOutcome> {
        self.call(SessionRequest::Send).await
    }

    /// Queue files for encoding. Off-list mime types are dropped immediately;
    /// returns how many files were queued.
    pub async fn stage_files(&self, files: Vec<FileSelection>) -> Result<usize> {
        self.call(|tx| SessionRequest::StageFiles(files, tx)).await
    }

    /// Remove a staged attachment. Returns `false` if it was not staged.
    pub async fn remove_attachment(&self, preview: PreviewRef) -> Result<bool> {
        self.call(|tx| SessionRequest::RemoveAttachment(preview, tx))
            .await
    }

    /// Look up what a live preview reference points at. Released or unknown
    /// references resolve to `None`.
    pub async fn resolve_preview(&self, preview: PreviewRef) -> Result<Option<PreviewSource>> {
        self.call(|tx| SessionRequest::ResolvePreview(preview, tx))
            .await
    }

    pub async fn toggle_dictation(&self) -> Result<SpeechStatus> {
        self.call(SessionRequest::ToggleDictation).await
    }

    /// Deliver a recognizer event.
    pub async fn dictation_event(&self, event: DictationEvent) -> Result<SpeechStatus> {
        self.call(|tx| SessionRequest::Dictation(event, tx)).await
    }

    /// Toggle playback of a message. Returns `None` for an unknown id.
    pub async fn toggle_playback(&self, message: MessageId) -> Result<Option<SpeechStatus>> {
        self.call(|tx| SessionRequest::TogglePlayback(message, tx))
            .await
    }

    /// Deliver a synthesizer event.
    pub async fn playback_event(&self, event: PlaybackEvent) -> Result<SpeechStatus> {
        self.call(|tx| SessionRequest::Playback(event, tx)).await
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        self.call(SessionRequest::Snapshot).await
    }

    #[must_use]
    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }
}

/// The session owner. Drive it with [`SessionServer::run`].
pub struct SessionServer {
    request_rx: mpsc::Receiver<SessionRequest>,
    completion_tx: mpsc::UnboundedSender<Completion>,
    completion_rx: mpsc::UnboundedReceiver<Completion>,
    event_tx: broadcast::Sender<SessionEvent>,
    gateway: Arc<dyn AiGateway>,
    conversation: Conversation,
    speech: SpeechBridge,
    previews: PreviewRegistry,
}

/// Create a connected client/server pair.
#[must_use]
pub fn session_channel(
    config: &ChatConfig,
    gateway: Arc<dyn AiGateway>,
    recognizer: Box<dyn SpeechRecognizer>,
    synthesizer: Box<dyn SpeechSynthesizer>,
) -> (SessionClient, SessionServer) {
    let (request_tx, request_rx) = mpsc::channel(config.session.request_capacity.max(1));
    let (event_tx, _event_rx) = broadcast::channel(config.session.event_capacity.max(1));
    let (completion_tx, completion_rx) = mpsc::unbounded_channel();

    let speech = SpeechBridge::new(
        recognizer,
        synthesizer,
        config.dictation.clone(),
        config.playback.clone(),
    );

    (
        SessionClient {
            request_tx,
            event_tx: event_tx.clone(),
        },
        SessionServer {
            request_rx,
            completion_tx,
            completion_rx,
            event_tx,
            gateway,
            conversation: Conversation::new(),
            speech,
            previews: PreviewRegistry::new(),
        },
    )
}

impl SessionServer {
    /// Process requests until every client has been dropped.
    pub async fn run(mut self) {
        info!(gateway = self.gateway.name(), "session started");
        loop {
            tokio::select! {
                request = self.request_rx.recv() => match request {
                    Some(request) => self.handle_request(request),
                    None => break,
                },
                Some(completion) = self.completion_rx.recv() => {
                    self.handle_completion(completion);
                }
            }
        }
        info!("session stopped");
    }

    fn handle_request(&mut self, request: SessionRequest) {
        match request {
            SessionRequest::SetDraft(text, reply) => {
                self.conversation.set_draft(text);
                self.emit_draft();
                let _ = reply.send(());
            }
            SessionRequest::Send(reply) => {
                let _ = reply.send(self.start_turn());
            }
            SessionRequest::StageFiles(files, reply) => {
                let _ = reply.send(self.stage_files(files));
            }
            SessionRequest::RemoveAttachment(preview, reply) => {
                let _ = reply.send(self.remove_attachment(&preview));
            }
            SessionRequest::ResolvePreview(preview, reply) => {
                let _ = reply.send(self.previews.resolve(&preview).cloned());
            }
            SessionRequest::ToggleDictation(reply) => {
                let status = self.speech.toggle_dictation();
                self.emit(SessionEvent::Speech {
                    status: status.clone(),
                });
                let _ = reply.send(status);
            }
            SessionRequest::Dictation(event, reply) => {
                let before = self.conversation.draft().len();
                let changed = self
                    .speech
                    .dictation_event(event, self.conversation.draft_mut());
                if self.conversation.draft().len() != before {
                    self.emit_draft();
                }
                let status = self.speech.status();
                if changed {
                    self.emit(SessionEvent::Speech {
                        status: status.clone(),
                    });
                }
                let _ = reply.send(status);
            }
            SessionRequest::TogglePlayback(id, reply) => {
                let status = self.toggle_playback(id);
                let _ = reply.send(status);
            }
            SessionRequest::Playback(event, reply) => {
                if self.speech.playback_event(&event) {
                    self.emit(SessionEvent::Speech {
                        status: self.speech.status(),
                    });
                }
                let _ = reply.send(self.speech.status());
            }
            SessionRequest::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::File { slot, result } => match result {
                Ok(file) => {
                    let attachment = Attachment::stage(file, &mut self.previews);
                    let index = self.conversation.stage(slot, attachment.clone());
                    debug!(name = %attachment.display_name, index, "attachment staged");
                    self.emit(SessionEvent::AttachmentStaged { attachment, index });
                }
                Err(AttachmentError::Unsupported(mime)) => {
                    debug!(%mime, "attachment rejected");
                }
                Err(e) => warn!(error = %e, "attachment dropped"),
            },
            Completion::Turn { turn, outcome } => self.finish_turn(turn, outcome),
        }
    }

    fn start_turn(&mut self) -> SendOutcome {
        let started = match self.conversation.begin_send() {
            Ok(started) => started,
            Err(refusal) => return SendOutcome::Refused(refusal),
        };
        info!(
            turn = started.turn.0,
            attachments = started.request.attachments.len(),
            "turn started"
        );

        if let Some(message) = self.conversation.message(started.message).cloned() {
            self.emit(SessionEvent::MessageAppended { message });
        }
        self.emit(SessionEvent::TurnStarted { turn: started.turn });
        self.apply_commands(started.commands);

        let gateway = Arc::clone(&self.gateway);
        let completion_tx = self.completion_tx.clone();
        let turn = started.turn;
        let request = started.request;
        // The call runs in its own task so a panicking gateway still
        // completes the turn.
        let call = tokio::spawn(async move { gateway.generate(&request).await });
        tokio::spawn(async move {
            let result = call.await.unwrap_or_else(|e| {
                warn!(turn = turn.0, error = %e, "gateway task aborted");
                Err(GatewayError::Transport(format!("gateway task aborted: {e}")))
            });
            let outcome = TurnOutcome::classify(result);
            let _ = completion_tx.send(Completion::Turn { turn, outcome });
        });

        SendOutcome::Started(turn)
    }

    fn finish_turn(&mut self, turn: TurnId, outcome: TurnOutcome) {
        let text = outcome.assistant_text().to_owned();
        let Some(completed) = self.conversation.complete_turn(turn, text) else {
            return;
        };
        info!(turn = turn.0, error = outcome.is_error(), "turn completed");

        if let Some(message) = self.conversation.message(completed.message).cloned() {
            self.emit(SessionEvent::MessageAppended { message });
        }
        self.emit(SessionEvent::TurnCompleted { turn, outcome });
        self.apply_commands(completed.commands);
    }

    fn stage_files(&mut self, files: Vec<FileSelection>) -> usize {
        let mut queued = 0;
        for selection in files {
            if !mime::is_supported(&selection.mime_type) {
                debug!(mime = %selection.mime_type, "attachment rejected");
                continue;
            }
            let slot = self.conversation.reserve_slot();
            let completion_tx = self.completion_tx.clone();
            tokio::spawn(async move {
                let result = encoder::encode(&selection).await;
                let _ = completion_tx.send(Completion::File { slot, result });
            });
            queued += 1;
        }
        queued
    }

    fn remove_attachment(&mut self, preview: &PreviewRef) -> bool {
        let Some((_, commands)) = self.conversation.remove_staged(preview) else {
            return false;
        };
        self.emit(SessionEvent::AttachmentRemoved {
            preview: preview.clone(),
        });
        self.apply_commands(commands);
        true
    }

    fn toggle_playback(&mut self, id: MessageId) -> Option<SpeechStatus> {
        let text = self.conversation.message(id)?.content().to_owned();
        let status = self.speech.toggle_playback(id, &text);
        self.emit(SessionEvent::Speech {
            status: status.clone(),
        });
        Some(status)
    }

    /// Release previews the commands ask for, then forward them to the UI.
    fn apply_commands(&mut self, commands: Vec<UiCommand>) {
        for command in &commands {
            if let UiCommand::ReleasePreview(preview) = command {
                self.previews.release(preview);
            }
        }
        self.emit(SessionEvent::Ui { commands });
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            conversation: self.conversation.snapshot(),
            speech: self.speech.status(),
            live_previews: self.previews.live_count(),
        }
    }

    fn emit_draft(&self) {
        self.emit(SessionEvent::DraftChanged {
            draft: self.conversation.draft().to_owned(),
        });
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.event_tx.send(event);
    }
}
