//! Storage seam used by the pipeline.

use async_trait::async_trait;

use smint_models::{Artifact, PublishedArtifact};

use crate::error::StorageResult;

/// Content-addressable storage.
///
/// Publishing identical bytes twice yields the same identifier, and the
/// second result carries `is_duplicate = true`.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn publish(&self, artifact: &Artifact) -> StorageResult<PublishedArtifact>;
}
