//! In-process content store.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use sha3::{Digest, Keccak256};
use tracing::info;

use smint_models::{Artifact, PublishedArtifact};

use crate::error::StorageResult;
use crate::store::ContentStore;

/// Content identifier for a payload: hex Keccak-256 digest.
pub fn keccak_cid(payload: &[u8]) -> String {
    format!("{:x}", Keccak256::digest(payload))
}

/// Stores payloads in memory, addressed by [`keccak_cid`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored payload for a content identifier.
    pub fn get(&self, cid: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .ok()
            .and_then(|objects| objects.get(cid).cloned())
    }

    pub fn len(&self) -> usize {
        self.objects.lock().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn publish(&self, artifact: &Artifact) -> StorageResult<PublishedArtifact> {
        let cid = keccak_cid(&artifact.payload);
        let is_duplicate = {
            let mut objects = self
                .objects
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if objects.contains_key(&cid) {
                true
            } else {
                objects.insert(cid.clone(), artifact.payload.clone());
                false
            }
        };

        info!(
            segment = artifact.segment_index,
            kind = %artifact.kind,
            cid = %cid,
            is_duplicate,
            "Stored artifact in memory"
        );

        Ok(PublishedArtifact {
            kind: artifact.kind,
            cid,
            size: artifact.payload.len() as u64,
            is_duplicate,
            mime_type: artifact.mime_type().to_string(),
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smint_models::ArtifactKind;

    #[test]
    fn test_keccak_cid() {
        assert_eq!(
            keccak_cid(b""),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[tokio::test]
    async fn test_second_publish_is_duplicate() {
        let store = MemoryStore::new();
        let first = store
            .publish(&Artifact::new(ArtifactKind::Still, 0, b"frame".to_vec()))
            .await
            .unwrap();
        let second = store
            .publish(&Artifact::new(ArtifactKind::Still, 5, b"frame".to_vec()))
            .await
            .unwrap();

        assert!(!first.is_duplicate);
        assert!(second.is_duplicate);
        assert_eq!(first.cid, second.cid);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&first.cid).unwrap(), b"frame");
    }

    #[tokio::test]
    async fn test_distinct_payloads() {
        let store = MemoryStore::new();
        let a = store
            .publish(&Artifact::new(ArtifactKind::Clip, 0, vec![1]))
            .await
            .unwrap();
        let b = store
            .publish(&Artifact::new(ArtifactKind::Clip, 1, vec![2]))
            .await
            .unwrap();
        assert_ne!(a.cid, b.cid);
        assert_eq!(a.mime_type, "image/gif");
    }
}
