//! Locally-resolvable preview references for staged attachments.
//!
//! A preview is allocated when an attachment is staged and must be released
//! when that attachment is removed or sent. [`PreviewRegistry::live_count`]
//! makes leaks observable.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Opaque handle of the form `preview:<uuid>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreviewRef(String);

impl PreviewRef {
    const SCHEME: &'static str = "preview:";

    fn generate() -> Self {
        Self(format!("{}{}", Self::SCHEME, uuid::Uuid::new_v4()))
    }

    /// Parse a reference received from a host. Returns `None` for other schemes.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let id = raw.strip_prefix(Self::SCHEME)?;
        uuid::Uuid::parse_str(id).ok()?;
        Some(Self(raw.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PreviewRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a preview reference resolves to: something a host can render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PreviewSource {
    /// The original file on disk.
    File { path: PathBuf, mime_type: String },
    /// A self-contained `data:` URL, for sources with no file behind them.
    DataUrl { url: String },
}

impl PreviewSource {
    /// Preview for an encoded payload: the file when there is one, otherwise
    /// a data URL rebuilt from the payload.
    #[must_use]
    pub fn for_payload(path: Option<PathBuf>, mime_type: &str, data: &str) -> Self {
        match path {
            Some(path) => Self::File {
                path,
                mime_type: mime_type.to_owned(),
            },
            None => Self::DataUrl {
                url: format!("data:{mime_type};base64,{data}"),
            },
        }
    }
}

/// Registry of live preview resources.
#[derive(Debug, Default)]
pub struct PreviewRegistry {
    entries: HashMap<PreviewRef, PreviewSource>,
}

impl PreviewRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new preview for `source`.
    pub fn allocate(&mut self, source: PreviewSource) -> PreviewRef {
        let preview = PreviewRef::generate();
        self.entries.insert(preview.clone(), source);
        preview
    }

    #[must_use]
    pub fn resolve(&self, preview: &PreviewRef) -> Option<&PreviewSource> {
        self.entries.get(preview)
    }

    /// Release a preview. Returns `false` if it was already released.
    pub fn release(&mut self, preview: &PreviewRef) -> bool {
        self.entries.remove(preview).is_some()
    }

    /// Number of previews allocated and not yet released.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.entries.len()
    }
}
