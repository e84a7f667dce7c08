//! Attachment encoding: allow-list validation, file read, base64 payload.

use std::path::{Path, PathBuf};

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::AttachmentError;
use super::mime::{self, AttachmentCategory};

/// Where the bytes of a selected file come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileSource {
    /// A file on the local filesystem.
    Path(PathBuf),
    /// A `data:` URL (or bare base64) already produced by the host.
    DataUrl(String),
}

/// A user-selected file together with its declared mime type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSelection {
    pub source: FileSource,
    /// Declared mime type, checked against the allow-list before any read.
    pub mime_type: String,
    /// Display name. Defaults to the file name for path sources.
    #[serde(default)]
    pub display_name: Option<String>,
}

impl FileSelection {
    #[must_use]
    pub fn from_path(path: impl Into<PathBuf>, mime_type: impl Into<String>) -> Self {
        Self {
            source: FileSource::Path(path.into()),
            mime_type: mime_type.into(),
            display_name: None,
        }
    }

    #[must_use]
    pub fn from_data_url(
        display_name: impl Into<String>,
        mime_type: impl Into<String>,
        data_url: impl Into<String>,
    ) -> Self {
        Self {
            source: FileSource::DataUrl(data_url.into()),
            mime_type: mime_type.into(),
            display_name: Some(display_name.into()),
        }
    }

    fn resolved_display_name(&self) -> String {
        if let Some(name) = &self.display_name {
            return name.clone();
        }
        match &self.source {
            FileSource::Path(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            FileSource::DataUrl(_) => "attachment".to_owned(),
        }
    }
}

/// A validated, encoded file not yet staged (no preview allocated).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFile {
    pub category: AttachmentCategory,
    pub display_name: String,
    /// Normalized mime essence from the allow-list.
    pub mime_type: String,
    /// Standard base64 without any data-URL header.
    pub data: String,
    /// Source path, when there was one.
    pub path: Option<PathBuf>,
}

/// Remove a leading `data:<mime>;base64,` header, if present.
#[must_use]
pub fn strip_data_url_prefix(payload: &str) -> &str {
    if let Some(rest) = payload.strip_prefix("data:")
        && let Some(comma) = rest.find(',')
        && rest[..comma].ends_with(";base64")
    {
        return &rest[comma + 1..];
    }
    payload
}

/// Base64-encode raw bytes with the standard alphabet and padding.
#[must_use]
pub fn encode_bytes(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Decode a payload produced by [`encode_bytes`].
///
/// # Errors
///
/// Returns [`AttachmentError::InvalidPayload`] if the payload is not valid base64.
pub fn decode_payload(data: &str) -> Result<Vec<u8>, AttachmentError> {
    base64::engine::general_purpose::STANDARD
        .decode(data)
        .map_err(|e| AttachmentError::InvalidPayload(e.to_string()))
}

/// Validate and encode a selected file.
///
/// The mime check happens before any I/O so unsupported files are never read.
///
/// # Errors
///
/// Returns [`AttachmentError::Unsupported`] for off-list mime types,
/// [`AttachmentError::Read`] if the file cannot be read, and
/// [`AttachmentError::InvalidPayload`] if a data URL is not valid base64.
pub async fn encode(selection: &FileSelection) -> Result<EncodedFile, AttachmentError> {
    let supported = mime::validate(&selection.mime_type)?;
    let display_name = selection.resolved_display_name();

    let (data, path) = match &selection.source {
        FileSource::Path(path) => {
            let bytes = read_file(path).await?;
            (encode_bytes(&bytes), Some(path.clone()))
        }
        FileSource::DataUrl(url) => {
            let data = strip_data_url_prefix(url.trim()).to_owned();
            decode_payload(&data)?;
            (data, None)
        }
    };

    debug!(
        name = %display_name,
        mime = %supported.essence,
        encoded_len = data.len(),
        "attachment encoded"
    );

    Ok(EncodedFile {
        category: supported.category,
        display_name,
        mime_type: supported.essence,
        data,
        path,
    })
}

async fn read_file(path: &Path) -> Result<Vec<u8>, AttachmentError> {
    tokio::fs::read(path)
        .await
        .map_err(|e| AttachmentError::Read(format!("{}: {e}", path.display())))
}
