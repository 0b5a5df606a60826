//! Still frame and animated clip extraction for a segment.

use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use smint_models::{ArtifactKind, ExtractionParams, Segment};

use crate::command::{TranscodeCommand, TranscodeRunner};
use crate::error::{MediaError, MediaResult};

/// Produces one artifact file for one segment of a local source.
#[async_trait]
pub trait SegmentExtractor: Send + Sync {
    /// Write the `kind` artifact of `segment` to `output`.
    ///
    /// `source` is read-only; implementations never modify or remove it.
    async fn extract(
        &self,
        source: &Path,
        segment: &Segment,
        kind: ArtifactKind,
        output: &Path,
    ) -> MediaResult<()>;
}

/// FFmpeg-backed extractor.
#[derive(Debug, Clone)]
pub struct FfmpegExtractor {
    runner: TranscodeRunner,
    params: ExtractionParams,
}

impl FfmpegExtractor {
    pub fn new(runner: TranscodeRunner, params: ExtractionParams) -> Self {
        Self { runner, params }
    }

    /// Build the transcoder command for one artifact.
    pub fn build_command(
        &self,
        source: &Path,
        segment: &Segment,
        kind: ArtifactKind,
        output: &Path,
    ) -> MediaResult<TranscodeCommand> {
        match kind {
            ArtifactKind::Still => Ok(TranscodeCommand::new(source, output)
                .seek(segment.start + segment.duration / 2.0)
                .single_frame()
                .video_filter(self.params.still_filter())
                .quality(self.params.still_quality)),
            ArtifactKind::Clip => Ok(TranscodeCommand::new(source, output)
                .seek(segment.start)
                .duration(segment.duration)
                .video_filter(self.params.clip_filter())
                .no_audio()),
            ArtifactKind::Metadata => Err(MediaError::UnsupportedArtifact(kind)),
        }
    }
}

#[async_trait]
impl SegmentExtractor for FfmpegExtractor {
    async fn extract(
        &self,
        source: &Path,
        segment: &Segment,
        kind: ArtifactKind,
        output: &Path,
    ) -> MediaResult<()> {
        if !tokio::fs::try_exists(source).await.unwrap_or(false) {
            return Err(MediaError::FileNotFound(source.to_path_buf()));
        }

        let cmd = self.build_command(source, segment, kind, output)?;
        let elapsed = self.runner.run(&cmd).await?;

        let produced = tokio::fs::metadata(output)
            .await
            .map(|m| m.len() > 0)
            .unwrap_or(false);
        if !produced {
            return Err(MediaError::OutputMissing(output.to_path_buf()));
        }

        debug!(
            segment = segment.index,
            kind = %kind,
            elapsed_ms = elapsed.as_millis() as u64,
            "Extracted artifact"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smint_models::segment_timeline;

    fn extractor() -> FfmpegExtractor {
        FfmpegExtractor::new(TranscodeRunner::default(), ExtractionParams::default())
    }

    #[test]
    fn test_still_seeks_to_midpoint() {
        let segment = segment_timeline(1200.0, 4).unwrap()[1];
        let args = extractor()
            .build_command(Path::new("src.mp4"), &segment, ArtifactKind::Still, Path::new("s.jpg"))
            .unwrap()
            .build_args();

        let ss = args.iter().position(|a| a == "-ss").unwrap();
        assert_eq!(args[ss + 1], "450.000");
        assert!(args.contains(&"scale=640:-2".to_string()));
        assert!(!args.contains(&"-t".to_string()));
    }

    #[test]
    fn test_clip_covers_segment() {
        let segment = segment_timeline(1200.0, 4).unwrap()[2];
        let args = extractor()
            .build_command(Path::new("src.mp4"), &segment, ArtifactKind::Clip, Path::new("c.gif"))
            .unwrap()
            .build_args();

        let ss = args.iter().position(|a| a == "-ss").unwrap();
        let t = args.iter().position(|a| a == "-t").unwrap();
        assert_eq!(args[ss + 1], "600.000");
        assert_eq!(args[t + 1], "300.000");
        assert!(args.contains(&"fps=5,scale=320:-1:flags=fast_bilinear".to_string()));
    }

    #[test]
    fn test_metadata_is_not_extracted() {
        let segment = segment_timeline(10.0, 1).unwrap()[0];
        let err = extractor()
            .build_command(Path::new("a"), &segment, ArtifactKind::Metadata, Path::new("b"))
            .unwrap_err();
        assert!(matches!(err, MediaError::UnsupportedArtifact(ArtifactKind::Metadata)));
    }

    #[tokio::test]
    async fn test_missing_source() {
        let segment = segment_timeline(10.0, 1).unwrap()[0];
        let err = extractor()
            .extract(
                Path::new("/nonexistent/source.mp4"),
                &segment,
                ArtifactKind::Clip,
                Path::new("/tmp/out.gif"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
