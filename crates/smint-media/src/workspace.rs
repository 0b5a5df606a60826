//! Per-run temporary workspace.
//!
//! The downloaded source is owned by the workspace and shared read-only with
//! every segment. The whole directory is removed when the workspace is closed
//! or dropped, on success, failure or cancellation alike.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};

use smint_models::ArtifactKind;

use crate::error::MediaResult;

#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
    source: PathBuf,
}

impl Workspace {
    /// Create a fresh run directory under `root`.
    pub async fn create(root: impl AsRef<Path>, run_id: &str, container: &str) -> MediaResult<Self> {
        let root = root.as_ref();
        tokio::fs::create_dir_all(root).await?;
        let dir = tempfile::Builder::new()
            .prefix(&format!("run-{}-", run_id))
            .tempdir_in(root)?;
        let source = dir.path().join(format!("source.{}", container));
        debug!(path = %dir.path().display(), "Created run workspace");
        Ok(Self { dir, source })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Location of the downloaded source.
    pub fn source_path(&self) -> &Path {
        &self.source
    }

    /// Location of one artifact of one segment.
    pub fn artifact_path(&self, kind: ArtifactKind, segment_index: u32) -> PathBuf {
        self.dir.path().join(kind.file_name(segment_index))
    }

    /// Remove a segment's local artifact once it is published.
    pub async fn discard_artifact(&self, kind: ArtifactKind, segment_index: u32) {
        let path = self.artifact_path(kind, segment_index);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), "Failed to remove artifact: {}", e);
            }
        }
    }

    /// Remove the workspace and report any cleanup error.
    pub fn close(self) -> MediaResult<()> {
        self.dir.close()?;
        Ok(())
    }
}
