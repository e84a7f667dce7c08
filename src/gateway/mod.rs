//! AI gateway seam.
//!
//! The generative backend is a black box called once per turn. Everything
//! the orchestrator needs from it is captured by [`AiGateway`]: one request
//! in, one [`GatewayReply`] or classified [`GatewayError`] out.

pub mod gemini;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use gemini::GeminiGateway;

/// Fixed sampling parameters sent with every turn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

pub const GENERATION_CONFIG: GenerationConfig = GenerationConfig {
    temperature: 0.7,
    top_k: 40,
    top_p: 0.95,
    max_output_tokens: 2048,
};

/// A binary part: mime type plus standard base64 payload, no data-URL header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

/// One turn's payload, built from the staged input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRequest {
    /// Trimmed text; absent when only attachments are sent.
    pub message_content: Option<String>,
    pub attachments: Vec<InlineData>,
}

/// Successful gateway payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayReply {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ReplyPart>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyPart {
    #[serde(default)]
    pub text: Option<String>,
}

impl GatewayReply {
    /// Reply with a single text candidate.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            candidates: vec![Candidate {
                content: Some(CandidateContent {
                    parts: vec![ReplyPart {
                        text: Some(text.into()),
                    }],
                }),
            }],
        }
    }

    /// Text of the first part of the first candidate, if non-empty.
    pub fn first_candidate_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .as_deref()
            .filter(|text| !text.is_empty())
    }
}

/// Gateway failure classes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The request never produced an HTTP response.
    #[error("transport failure: {0}")]
    Transport(String),

    /// Rate limit or quota exhaustion (HTTP 429).
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Any other non-success status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// A success status whose body could not be decoded.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// A generative backend.
#[async_trait]
pub trait AiGateway: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Run one turn.
    async fn generate(&self, request: &TurnRequest) -> Result<GatewayReply, GatewayError>;
}
