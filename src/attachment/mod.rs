//! Attachment encoder.
//!
//! Turns user-selected files into transmittable payloads:
//! allow-list check → file read → base64 (no data-URL header) → staged
//! [`Attachment`] with a preview reference.
//!
//! Unsupported files are rejected with [`AttachmentError::Unsupported`];
//! callers drop them from the batch without surfacing a conversation error.

pub mod encoder;
pub mod mime;
pub mod preview;

use serde::{Deserialize, Serialize};

pub use encoder::{EncodedFile, FileSelection, FileSource};
pub use mime::{AttachmentCategory, SUPPORTED_MIME_TYPES};
pub use preview::{PreviewRef, PreviewRegistry, PreviewSource};

use crate::gateway::InlineData;

/// Attachment encoding errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttachmentError {
    /// Declared mime type is not on the allow-list.
    #[error("unsupported mime type: {0}")]
    Unsupported(String),

    /// The file could not be read.
    #[error("read failed: {0}")]
    Read(String),

    /// A host-supplied payload was not valid base64.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

/// An encoded file staged for sending (or already sent inside a message).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub category: AttachmentCategory,
    pub display_name: String,
    pub preview: PreviewRef,
    /// Standard base64 payload without a data-URL header.
    pub data: String,
    pub mime_type: String,
}

impl Attachment {
    /// Stage an encoded file, allocating its preview in `registry`.
    pub fn stage(file: EncodedFile, registry: &mut PreviewRegistry) -> Self {
        let preview =
            registry.allocate(PreviewSource::for_payload(file.path, &file.mime_type, &file.data));
        Self {
            category: file.category,
            display_name: file.display_name,
            preview,
            data: file.data,
            mime_type: file.mime_type,
        }
    }

    /// Wire form sent to the gateway.
    #[must_use]
    pub fn inline_data(&self) -> InlineData {
        InlineData {
            mime_type: self.mime_type.clone(),
            data: self.data.clone(),
        }
    }

    /// Original file bytes.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentError::InvalidPayload`] if the payload was tampered with.
    pub fn decode(&self) -> Result<Vec<u8>, AttachmentError> {
        encoder::decode_payload(&self.data)
    }
}
