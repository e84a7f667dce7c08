//! Fixed mime-type allow-list for attachments.
//!
//! The list is a contract with the AI gateway and is not configurable.

use serde::{Deserialize, Serialize};

use super::AttachmentError;

/// Every mime essence accepted for upload.
pub const SUPPORTED_MIME_TYPES: &[&str] = &[
    // images
    "image/png",
    "image/jpeg",
    "image/webp",
    "image/heic",
    "image/heif",
    // documents
    "application/pdf",
    // text and source code
    "text/plain",
    "text/html",
    "text/css",
    "text/javascript",
    "application/x-javascript",
    "text/x-typescript",
    "application/x-typescript",
    "text/csv",
    "text/markdown",
    "text/x-python",
    "application/x-python-code",
    "application/json",
    "text/xml",
    "application/rtf",
    "text/rtf",
    // audio
    "audio/wav",
    "audio/mp3",
    "audio/aiff",
    "audio/aac",
    "audio/ogg",
    "audio/flac",
    // video
    "video/mp4",
    "video/mpeg",
    "video/mov",
    "video/avi",
    "video/x-flv",
    "video/mpg",
    "video/webm",
    "video/wmv",
    "video/3gpp",
];

/// Attachment category, derived from the mime type's primary token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentCategory {
    Image,
    Application,
    Text,
    Audio,
    Video,
}

impl AttachmentCategory {
    /// Map a primary mime token (`image`, `text`, ...) to a category.
    #[must_use]
    pub fn from_primary(token: &str) -> Option<Self> {
        match token {
            "image" => Some(Self::Image),
            "application" => Some(Self::Application),
            "text" => Some(Self::Text),
            "audio" => Some(Self::Audio),
            "video" => Some(Self::Video),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Application => "application",
            Self::Text => "text",
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }
}

impl std::fmt::Display for AttachmentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mime type that passed the allow-list check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedMime {
    /// Lowercased `type/subtype` without parameters.
    pub essence: String,
    pub category: AttachmentCategory,
}

/// Lowercased `type/subtype` with any `;` parameters removed.
#[must_use]
pub fn mime_essence(raw: &str) -> String {
    raw.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Whether `raw` names a mime type on the allow-list.
#[must_use]
pub fn is_supported(raw: &str) -> bool {
    let essence = mime_essence(raw);
    SUPPORTED_MIME_TYPES.contains(&essence.as_str())
}

/// Validate a declared mime type against the allow-list.
///
/// # Errors
///
/// Returns [`AttachmentError::Unsupported`] for anything off the list.
pub fn validate(raw: &str) -> Result<SupportedMime, AttachmentError> {
    let essence = mime_essence(raw);
    if !SUPPORTED_MIME_TYPES.contains(&essence.as_str()) {
        return Err(AttachmentError::Unsupported(raw.to_owned()));
    }
    let category = essence
        .split('/')
        .next()
        .and_then(AttachmentCategory::from_primary)
        .ok_or_else(|| AttachmentError::Unsupported(raw.to_owned()))?;
    Ok(SupportedMime { essence, category })
}
