//! Derived media artifacts.

use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Kind of artifact produced for a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Single still frame
    Still,
    /// Short animated clip
    Clip,
    /// Token metadata JSON document
    Metadata,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Still => "still",
            ArtifactKind::Clip => "clip",
            ArtifactKind::Metadata => "metadata",
        }
    }

    /// MIME type sent to the storage service.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ArtifactKind::Still => "image/jpeg",
            ArtifactKind::Clip => "image/gif",
            ArtifactKind::Metadata => "application/json",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Still => "jpg",
            ArtifactKind::Clip => "gif",
            ArtifactKind::Metadata => "json",
        }
    }

    /// File name used both locally and for the upload.
    pub fn file_name(&self, segment_index: u32) -> String {
        format!(
            "segment-{:04}-{}.{}",
            segment_index,
            self.as_str(),
            self.extension()
        )
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A local artifact payload awaiting publication.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub segment_index: u32,
    pub payload: Vec<u8>,
}

impl Artifact {
    pub fn new(kind: ArtifactKind, segment_index: u32, payload: Vec<u8>) -> Self {
        Self {
            kind,
            segment_index,
            payload,
        }
    }

    pub fn file_name(&self) -> String {
        self.kind.file_name(self.segment_index)
    }

    pub fn mime_type(&self) -> &'static str {
        self.kind.mime_type()
    }
}

/// An artifact after it was accepted by content-addressable storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PublishedArtifact {
    pub kind: ArtifactKind,
    /// Content identifier
    pub cid: String,
    /// Stored size in bytes
    pub size: u64,
    /// True when the identical payload had already been stored
    pub is_duplicate: bool,
    /// MIME type the store detected
    pub mime_type: String,
    /// Upload timestamp reported by the store
    pub created_at: DateTime<Utc>,
}

impl PublishedArtifact {
    /// URI for this artifact under a gateway prefix such as `ipfs://`.
    pub fn uri(&self, gateway_prefix: &str) -> String {
        format!("{}{}", gateway_prefix, self.cid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names() {
        assert_eq!(ArtifactKind::Clip.file_name(3), "segment-0003-clip.gif");
        assert_eq!(ArtifactKind::Still.file_name(12), "segment-0012-still.jpg");
        assert_eq!(
            Artifact::new(ArtifactKind::Metadata, 0, b"{}".to_vec()).file_name(),
            "segment-0000-metadata.json"
        );
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(ArtifactKind::Clip.mime_type(), "image/gif");
        assert_eq!(ArtifactKind::Metadata.mime_type(), "application/json");
    }

    #[test]
    fn test_uri() {
        let artifact = PublishedArtifact {
            kind: ArtifactKind::Still,
            cid: "bafyabc".to_string(),
            size: 10,
            is_duplicate: false,
            mime_type: "image/jpeg".to_string(),
            created_at: Utc::now(),
        };
        assert_eq!(artifact.uri("ipfs://"), "ipfs://bafyabc");
    }
}
