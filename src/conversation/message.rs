//! Conversation messages.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::attachment::Attachment;
use crate::error::{ChatError, Result};
use crate::markup::{self, RichText};

/// Monotonic message identifier, unique within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    User,
    Assistant,
}

/// An immutable conversation entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    content: String,
    origin: Origin,
    created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<Attachment>,
}

impl Message {
    /// Create a message.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::InvalidMessage`] if `content` is empty and there
    /// are no attachments.
    pub fn new(
        id: MessageId,
        origin: Origin,
        content: impl Into<String>,
        attachments: Vec<Attachment>,
    ) -> Result<Self> {
        let content = content.into();
        if content.is_empty() && attachments.is_empty() {
            return Err(ChatError::InvalidMessage(format!(
                "message {id} has neither content nor attachments"
            )));
        }
        Ok(Self {
            id,
            content,
            origin,
            created_at: Utc::now(),
            attachments,
        })
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn is_user(&self) -> bool {
        self.origin == Origin::User
    }

    /// Structured rendering of the content.
    pub fn rich_text(&self) -> RichText {
        markup::format(&self.content)
    }
}
