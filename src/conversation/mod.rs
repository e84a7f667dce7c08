//! Conversation orchestrator.
//!
//! [`state`] is the pure `Idle`/`Sending` machine, [`outcome`] turns gateway
//! results into assistant text, and [`session`] runs both inside a single
//! owning task.

pub mod message;
pub mod outcome;
pub mod session;
pub mod state;

pub use message::{Message, MessageId, Origin};
pub use outcome::{FALLBACK_REPLY, GENERIC_FAILURE_REPLY, QUOTA_EXCEEDED_REPLY, TurnOutcome};
pub use session::{
    SendOutcome, SessionClient, SessionEvent, SessionServer, SessionSnapshot, session_channel,
};
pub use state::{
    CompletedTurn, Conversation, ConversationSnapshot, Phase, SendRefusal, StageSlot, StartedTurn,
    TurnId, UiCommand,
};
