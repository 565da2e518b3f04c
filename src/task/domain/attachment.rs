//! Opaque references to files stored by the transport.

use super::ParseBlobKindError;
use serde::{Deserialize, Serialize};

/// Media category of an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlobKind {
    /// Still image.
    Photo,
    /// Arbitrary document.
    Document,
    /// Video clip.
    Video,
    /// Audio or voice note.
    Audio,
    /// Anything else.
    Other,
}

impl BlobKind {
    /// Returns the canonical representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Document => "document",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Other => "other",
        }
    }
}

impl TryFrom<&str> for BlobKind {
    type Error = ParseBlobKindError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "photo" => Ok(Self::Photo),
            "document" => Ok(Self::Document),
            "video" => Ok(Self::Video),
            "audio" | "voice" => Ok(Self::Audio),
            "other" => Ok(Self::Other),
            _ => Err(ParseBlobKindError(value.to_owned())),
        }
    }
}

/// Reference to a file held by the transport's blob storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobRef {
    kind: BlobKind,
    external_id: String,
    filename: Option<String>,
}

impl BlobRef {
    /// Creates a blob reference.
    #[must_use]
    pub fn new(kind: BlobKind, external_id: impl Into<String>) -> Self {
        Self {
            kind,
            external_id: external_id.into(),
            filename: None,
        }
    }

    /// Sets the original filename.
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Returns the media category.
    #[must_use]
    pub const fn kind(&self) -> BlobKind {
        self.kind
    }

    /// Returns the transport's identifier for the file.
    #[must_use]
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    /// Returns the original filename, if known.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }
}
