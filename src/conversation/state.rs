//! The conversation state machine.
//!
//! Pure and synchronous: every transition returns the [`UiCommand`]s the
//! front end must apply, and nothing here performs I/O. The session actor
//! drives it from a single task.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::message::{Message, MessageId, Origin};
use crate::attachment::{Attachment, PreviewRef};
use crate::gateway::TurnRequest;

/// Identifier of one send/reply cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurnId(pub u64);

/// Orchestrator phase. At most one turn is ever in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "turn", rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Sending(TurnId),
}

/// Front-end effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", content = "preview", rename_all = "snake_case")]
pub enum UiCommand {
    ClearInput,
    FocusInput,
    ScrollToLatest,
    ReleasePreview(PreviewRef),
}

/// Why a send did not start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum SendRefusal {
    #[error("nothing to send")]
    Empty,
    #[error("a request is already in flight")]
    Busy,
}

/// Position reserved for a file at selection time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageSlot(pub u64);

/// A turn that has just started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedTurn {
    pub turn: TurnId,
    pub message: MessageId,
    pub request: TurnRequest,
    pub commands: Vec<UiCommand>,
}

/// A turn that has just completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedTurn {
    pub turn: TurnId,
    pub message: MessageId,
    pub commands: Vec<UiCommand>,
}

/// Read-only view of the conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSnapshot {
    pub messages: Vec<Message>,
    pub draft: String,
    pub staged: Vec<Attachment>,
    pub phase: Phase,
}

/// Messages, staging area, draft text and the in-flight flag.
#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    draft: String,
    staged: Vec<(StageSlot, Attachment)>,
    phase: Phase,
    next_message: u64,
    next_turn: u64,
    next_slot: u64,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn message(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id() == id)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_sending(&self) -> bool {
        matches!(self.phase, Phase::Sending(_))
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Mutable input buffer, used by dictation to append final segments.
    pub fn draft_mut(&mut self) -> &mut String {
        &mut self.draft
    }

    pub fn staged(&self) -> impl Iterator<Item = &Attachment> {
        self.staged.iter().map(|(_, attachment)| attachment)
    }

    pub fn staged_count(&self) -> usize {
        self.staged.len()
    }

    /// Reserve a staging position. Call once per file in selection order,
    /// before its read starts.
    pub fn reserve_slot(&mut self) -> StageSlot {
        self.next_slot += 1;
        StageSlot(self.next_slot)
    }

    /// Stage a finished attachment at its reserved position.
    ///
    /// Returns the index it landed at in the staged list.
    pub fn stage(&mut self, slot: StageSlot, attachment: Attachment) -> usize {
        let index = self.staged.partition_point(|(s, _)| *s < slot);
        self.staged.insert(index, (slot, attachment));
        index
    }

    /// Remove a staged attachment before sending.
    pub fn remove_staged(&mut self, preview: &PreviewRef) -> Option<(Attachment, Vec<UiCommand>)> {
        let index = self.staged.iter().position(|(_, a)| &a.preview == preview)?;
        let (_, attachment) = self.staged.remove(index);
        let commands = vec![UiCommand::ReleasePreview(attachment.preview.clone())];
        Some((attachment, commands))
    }

    /// `Idle → Sending`.
    ///
    /// Snapshots draft and staged attachments into a user message, clears
    /// staging and moves to `Sending`. Refused with no state change if a turn
    /// is in flight or there is nothing to send.
    pub fn begin_send(&mut self) -> Result<StartedTurn, SendRefusal> {
        if self.is_sending() {
            debug!(reason = "busy", "send refused");
            return Err(SendRefusal::Busy);
        }
        let text = self.draft.trim().to_owned();
        if text.is_empty() && self.staged.is_empty() {
            debug!(reason = "empty", "send refused");
            return Err(SendRefusal::Empty);
        }

        let attachments: Vec<Attachment> =
            std::mem::take(&mut self.staged).into_iter().map(|(_, a)| a).collect();
        let request = TurnRequest {
            message_content: (!text.is_empty()).then(|| text.clone()),
            attachments: attachments.iter().map(Attachment::inline_data).collect(),
        };

        let mut commands = vec![UiCommand::ClearInput, UiCommand::ScrollToLatest];
        commands.extend(
            attachments
                .iter()
                .map(|a| UiCommand::ReleasePreview(a.preview.clone())),
        );

        let id = self.allocate_message_id();
        let message = Message::new(id, Origin::User, text, attachments).map_err(|e| {
            debug!(error = %e, "send refused");
            SendRefusal::Empty
        })?;
        self.messages.push(message);
        self.draft.clear();

        self.next_turn += 1;
        let turn = TurnId(self.next_turn);
        self.phase = Phase::Sending(turn);

        Ok(StartedTurn {
            turn,
            message: id,
            request,
            commands,
        })
    }

    /// `Sending → Idle`, appending the assistant reply (or error text).
    ///
    /// Returns `None` if `turn` is not the one in flight.
    pub fn complete_turn(&mut self, turn: TurnId, text: String) -> Option<CompletedTurn> {
        if self.phase != Phase::Sending(turn) {
            debug!(turn = turn.0, "ignoring completion for unknown turn");
            return None;
        }
        self.phase = Phase::Idle;

        let id = self.allocate_message_id();
        // Outcome text is never empty; guard anyway so the turn still ends.
        let message = Message::new(id, Origin::Assistant, text, Vec::new()).ok()?;
        self.messages.push(message);

        Some(CompletedTurn {
            turn,
            message: id,
            commands: vec![UiCommand::ScrollToLatest, UiCommand::FocusInput],
        })
    }

    pub fn snapshot(&self) -> ConversationSnapshot {
        ConversationSnapshot {
            messages: self.messages.clone(),
            draft: self.draft.clone(),
            staged: self.staged().cloned().collect(),
            phase: self.phase,
        }
    }

    fn allocate_message_id(&mut self) -> MessageId {
        self.next_message += 1;
        MessageId(self.next_message)
    }
}
