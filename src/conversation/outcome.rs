//! Classification of gateway results into assistant text.
//!
//! Every result, good or bad, becomes a normal assistant message. Nothing
//! here fails.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::gateway::{GatewayError, GatewayReply};

/// Shown when a reply carries no candidate text.
pub const FALLBACK_REPLY: &str = "Sorry, I could not process your request.";

/// Shown when the backend reports rate limiting.
pub const QUOTA_EXCEEDED_REPLY: &str = "API quota exceeded. Please wait and try again later.";

/// Shown for every other failure.
pub const GENERIC_FAILURE_REPLY: &str =
    "Sorry, something went wrong while contacting the AI. Please try again.";

/// How a turn ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum TurnOutcome {
    Replied(String),
    Fallback,
    QuotaExceeded,
    Failed,
}

impl TurnOutcome {
    pub fn classify(result: Result<GatewayReply, GatewayError>) -> Self {
        match result {
            Ok(reply) => match reply.first_candidate_text() {
                Some(text) => Self::Replied(text.to_owned()),
                None => Self::Fallback,
            },
            Err(GatewayError::MalformedResponse(detail)) => {
                warn!(error = %detail, "undecodable gateway reply");
                Self::Fallback
            }
            Err(GatewayError::QuotaExceeded(detail)) => {
                warn!(error = %detail, "gateway quota exceeded");
                Self::QuotaExceeded
            }
            Err(err) => {
                warn!(error = %err, "gateway call failed");
                Self::Failed
            }
        }
    }

    /// Text of the assistant message for this outcome.
    pub fn assistant_text(&self) -> &str {
        match self {
            Self::Replied(text) => text,
            Self::Fallback => FALLBACK_REPLY,
            Self::QuotaExceeded => QUOTA_EXCEEDED_REPLY,
            Self::Failed => GENERIC_FAILURE_REPLY,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::QuotaExceeded | Self::Failed)
    }
}
