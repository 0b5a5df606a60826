//! Source resolution: link parsing, duration policy and stream selection.

use std::sync::Arc;

use tracing::info;

use smint_models::{extract_video_id, StreamCandidate, VideoSource};

use crate::error::{SourceError, SourceResult};
use crate::provider::VideoMetadataProvider;

/// Pick the smallest candidate in `container`.
pub fn select_stream<'a>(candidates: &'a [StreamCandidate], container: &str) -> Option<&'a StreamCandidate> {
    candidates
        .iter()
        .filter(|c| c.matches_container(container))
        .min_by_key(|c| c.size)
}

/// Resolves a link into a [`VideoSource`] under a maximum-duration policy.
#[derive(Clone)]
pub struct SourceResolver {
    provider: Arc<dyn VideoMetadataProvider>,
    max_duration_secs: u64,
    container: String,
}

impl SourceResolver {
    pub fn new(
        provider: Arc<dyn VideoMetadataProvider>,
        max_duration_secs: u64,
        container: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            max_duration_secs,
            container: container.into(),
        }
    }

    /// Resolve a link. The duration policy is checked before stream
    /// selection, so an over-long source never yields a download URL.
    pub async fn resolve(&self, link: &str) -> SourceResult<VideoSource> {
        let video_id = extract_video_id(link)?;
        let details = self.provider.video_details(&video_id).await?;

        if details.duration_secs > self.max_duration_secs as f64 {
            return Err(SourceError::DurationExceeded {
                duration_secs: details.duration_secs,
                limit_secs: self.max_duration_secs,
            });
        }

        let selected = select_stream(&details.candidates, &self.container)
            .cloned()
            .ok_or_else(|| SourceError::NoStreamAvailable {
                container: self.container.clone(),
            })?;

        info!(
            video_id = %video_id,
            duration_secs = details.duration_secs,
            stream_size = selected.size,
            candidates = details.candidates.len(),
            "Resolved source"
        );

        Ok(VideoSource {
            video_id,
            link: link.to_string(),
            title: details.title,
            duration_secs: details.duration_secs,
            selected_stream: selected,
            candidates: details.candidates,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VideoDetails;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedProvider {
        duration: f64,
        candidates: Vec<StreamCandidate>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl VideoMetadataProvider for FixedProvider {
        async fn video_details(&self, video_id: &str) -> SourceResult<VideoDetails> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(VideoDetails {
                video_id: video_id.to_string(),
                title: None,
                duration_secs: self.duration,
                candidates: self.candidates.clone(),
            })
        }
    }

    fn candidate(container: &str, size: u64) -> StreamCandidate {
        StreamCandidate {
            url: format!("https://cdn/{}-{}", size, container),
            container: container.to_string(),
            quality: None,
            size,
        }
    }

    fn resolver(duration: f64, candidates: Vec<StreamCandidate>) -> (SourceResolver, Arc<FixedProvider>) {
        let provider = Arc::new(FixedProvider {
            duration,
            candidates,
            calls: AtomicUsize::new(0),
        });
        (SourceResolver::new(provider.clone(), 1800, "mp4"), provider)
    }

    #[test]
    fn test_select_smallest_matching() {
        let candidates = vec![
            candidate("mp4", 500),
            candidate("webm", 10),
            candidate("MP4", 200),
            candidate("mp4", 900),
        ];
        assert_eq!(select_stream(&candidates, "mp4").unwrap().size, 200);
        assert!(select_stream(&candidates, "mkv").is_none());
    }

    #[tokio::test]
    async fn test_resolve() {
        let (resolver, _) = resolver(1200.0, vec![candidate("mp4", 300), candidate("mp4", 100)]);
        let source = resolver.resolve("https://youtu.be/dQw4w9WgXcQ").await.unwrap();
        assert_eq!(source.video_id, "dQw4w9WgXcQ");
        assert_eq!(source.resolved_url(), "https://cdn/100-mp4");
        assert_eq!(source.candidates.len(), 2);
    }

    #[tokio::test]
    async fn test_duration_exceeded() {
        let (resolver, _) = resolver(1800.5, vec![candidate("mp4", 1)]);
        let err = resolver.resolve("https://youtu.be/dQw4w9WgXcQ").await.unwrap_err();
        assert!(matches!(err, SourceError::DurationExceeded { limit_secs: 1800, .. }));
    }

    #[tokio::test]
    async fn test_no_stream() {
        let (resolver, _) = resolver(60.0, vec![candidate("webm", 1)]);
        let err = resolver.resolve("https://youtu.be/dQw4w9WgXcQ").await.unwrap_err();
        assert!(matches!(err, SourceError::NoStreamAvailable { .. }));
    }

    #[tokio::test]
    async fn test_invalid_link_skips_provider() {
        let (resolver, provider) = resolver(60.0, vec![candidate("mp4", 1)]);
        let err = resolver.resolve("https://example.com/video").await.unwrap_err();
        assert!(matches!(err, SourceError::InvalidLink(_)));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }
}
