//! Error types for the confab message pipeline.

use crate::attachment::AttachmentError;
use crate::gateway::GatewayError;
use crate::host::contract::ContractError;

/// Top-level error type for the conversational front end.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// Attachment validation or encoding error.
    #[error("attachment error: {0}")]
    Attachment(#[from] AttachmentError),

    /// AI gateway call or reply parsing error.
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Dictation or playback fault.
    #[error("speech error: {0}")]
    Speech(String),

    /// A message violated its content invariant.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Host envelope or payload rejected.
    #[error("host contract error: {0}")]
    Contract(#[from] ContractError),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Channel send/receive error.
    #[error("channel error: {0}")]
    Channel(String),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, ChatError>;
