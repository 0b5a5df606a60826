//! Processing of a single segment up to `MetadataReady`.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::Instrument;

use smint_media::Workspace;
use smint_models::{
    compose_token_metadata, Artifact, ArtifactKind, InterestPeriod, MetadataContext, PublishedArtifact,
    Segment, SegmentFailure, SegmentState, SegmentSuccess,
};

use super::Pipeline;
use crate::error::{PipelineError, PipelineResult};
use crate::logging::SegmentLogger;
use crate::metrics;

/// Run-wide values shared read-only by every segment.
pub(super) struct SegmentContext<'a> {
    pub run_id: &'a str,
    pub workspace: &'a Workspace,
    pub periods: &'a [InterestPeriod],
    pub metadata: MetadataContext<'a>,
}

fn transition(state: &mut SegmentState, to: SegmentState, logger: &SegmentLogger, message: &str) {
    debug_assert!(state.can_transition_to(to), "{} -> {}", state, to);
    *state = to;
    logger.log_stage(to, message);
}

impl Pipeline {
    /// Drive one segment through extraction, scoring and publishing.
    ///
    /// Any error is turned into a [`SegmentFailure`] recording the last state
    /// reached; it never escapes to the caller.
    pub(super) async fn process_segment(
        &self,
        ctx: &SegmentContext<'_>,
        segment: &Segment,
    ) -> Result<SegmentSuccess, SegmentFailure> {
        let logger = SegmentLogger::new(ctx.run_id, segment.index);
        metrics::record_segment_started();

        let mut state = SegmentState::Pending;
        let result = self
            .advance(ctx, segment, &logger, &mut state)
            .instrument(logger.create_span())
            .await;

        for kind in [ArtifactKind::Still, ArtifactKind::Clip] {
            ctx.workspace.discard_artifact(kind, segment.index).await;
        }

        result.map_err(|err| {
            logger.log_failure(state, err.kind(), &err.to_string());
            metrics::record_segment_failure(state);
            SegmentFailure {
                segment_index: segment.index,
                stage: state,
                kind: err.kind().to_string(),
                error: err.to_string(),
            }
        })
    }

    async fn advance(
        &self,
        ctx: &SegmentContext<'_>,
        segment: &Segment,
        logger: &SegmentLogger,
        state: &mut SegmentState,
    ) -> PipelineResult<SegmentSuccess> {
        let still_path = self.extract(ctx, segment, ArtifactKind::Still).await?;
        let clip_path = self.extract(ctx, segment, ArtifactKind::Clip).await?;
        transition(state, SegmentState::Extracted, logger, "still and clip extracted");

        let score = segment.score(ctx.periods);
        transition(state, SegmentState::Scored, logger, &format!("score {:.4}", score));

        let still = self.publish_file(segment, ArtifactKind::Still, &still_path, logger).await?;
        let clip = self.publish_file(segment, ArtifactKind::Clip, &clip_path, logger).await?;
        transition(state, SegmentState::Published, logger, "still and clip published");

        let document = compose_token_metadata(&ctx.metadata, segment, &still.cid, &clip.cid, score);
        let payload = document
            .to_json_bytes()
            .map_err(|e| PipelineError::Publish(format!("metadata encoding: {}", e)))?;
        let metadata = self
            .publish(Artifact::new(ArtifactKind::Metadata, segment.index, payload), logger)
            .await?;
        let metadata_uri = metadata.uri(&self.config.gateway_prefix);
        transition(state, SegmentState::MetadataReady, logger, &metadata_uri);

        Ok(SegmentSuccess {
            segment: *segment,
            score,
            still_cid: still.cid,
            clip_cid: clip.cid,
            metadata_cid: metadata.cid,
            metadata_uri,
        })
    }

    async fn extract(
        &self,
        ctx: &SegmentContext<'_>,
        segment: &Segment,
        kind: ArtifactKind,
    ) -> PipelineResult<PathBuf> {
        let output = ctx.workspace.artifact_path(kind, segment.index);
        let started = Instant::now();
        self.deps
            .extractor
            .extract(ctx.workspace.source_path(), segment, kind, &output)
            .await?;
        metrics::record_transcode(kind, started.elapsed());
        Ok(output)
    }

    async fn publish_file(
        &self,
        segment: &Segment,
        kind: ArtifactKind,
        path: &Path,
        logger: &SegmentLogger,
    ) -> PipelineResult<PublishedArtifact> {
        let payload = tokio::fs::read(path).await.map_err(|e| PipelineError::Extraction {
            message: format!("{} output {} unreadable: {}", kind, path.display(), e),
            exit_code: None,
        })?;
        self.publish(Artifact::new(kind, segment.index, payload), logger).await
    }

    async fn publish(&self, artifact: Artifact, logger: &SegmentLogger) -> PipelineResult<PublishedArtifact> {
        let published = self.deps.store.publish(&artifact).await?;
        if published.is_duplicate {
            logger.log_warning(&format!("{} {} was already stored", artifact.kind, published.cid));
        }
        metrics::record_artifact_published(artifact.kind);
        Ok(published)
    }
}
