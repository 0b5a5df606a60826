//! Video source descriptors and link parsing.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Length of a platform video id.
const VIDEO_ID_LEN: usize = 11;

/// Path prefixes that carry the video id directly.
const ID_PATH_PREFIXES: [&str; 4] = ["/embed/", "/shorts/", "/live/", "/v/"];

/// Errors that can occur while turning a link into a video id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceIdError {
    #[error("Link is empty")]
    Empty,

    #[error("Link is not a recognized video URL: {0}")]
    Unrecognized(String),

    #[error("Video id has invalid format: {0}")]
    InvalidId(String),
}

/// One encoded stream offered by the video metadata provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StreamCandidate {
    /// Direct download URL
    pub url: String,
    /// Container/extension (e.g. "mp4", "webm")
    pub container: String,
    /// Human-readable quality label, when provided
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    /// Encoded size in bytes
    pub size: u64,
}

impl StreamCandidate {
    /// Whether this stream uses the given container.
    pub fn matches_container(&self, container: &str) -> bool {
        self.container.eq_ignore_ascii_case(container)
    }
}

/// A resolved video source. Built once per run and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VideoSource {
    /// Platform video id
    pub video_id: String,
    /// Link the run was started with
    pub link: String,
    /// Title reported by the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Total duration in seconds
    pub duration_secs: f64,
    /// Stream chosen for download
    pub selected_stream: StreamCandidate,
    /// Every stream the provider offered
    pub candidates: Vec<StreamCandidate>,
}

impl VideoSource {
    /// Canonical URL the source file is downloaded from.
    pub fn resolved_url(&self) -> &str {
        &self.selected_stream.url
    }
}

/// Extract the platform video id from a link or a bare id.
///
/// Supported forms:
/// - `https://www.youtube.com/watch?v=VIDEO_ID`
/// - `https://youtu.be/VIDEO_ID`
/// - `https://www.youtube.com/embed/VIDEO_ID`
/// - `https://www.youtube.com/shorts/VIDEO_ID`
/// - `https://www.youtube.com/live/VIDEO_ID`
/// - `VIDEO_ID`
pub fn extract_video_id(link: &str) -> Result<String, SourceIdError> {
    let link = link.trim();
    if link.is_empty() {
        return Err(SourceIdError::Empty);
    }

    if is_valid_video_id(link) {
        return Ok(link.to_string());
    }

    let parsed =
        url::Url::parse(link).map_err(|_| SourceIdError::Unrecognized(link.to_string()))?;

    let host = parsed
        .host_str()
        .unwrap_or_default()
        .trim_start_matches("www.")
        .trim_start_matches("m.");

    let candidate = match host {
        "youtu.be" => parsed
            .path_segments()
            .and_then(|mut segments| segments.next())
            .map(str::to_string),
        "youtube.com" | "music.youtube.com" => match parsed.path() {
            "/watch" => parsed
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned()),
            path => ID_PATH_PREFIXES
                .iter()
                .find_map(|prefix| path.strip_prefix(prefix))
                .map(|rest| rest.trim_end_matches('/').to_string()),
        },
        _ => return Err(SourceIdError::Unrecognized(link.to_string())),
    };

    let id = candidate
        .filter(|id| !id.is_empty())
        .ok_or_else(|| SourceIdError::Unrecognized(link.to_string()))?;

    if is_valid_video_id(&id) {
        Ok(id)
    } else {
        Err(SourceIdError::InvalidId(id))
    }
}

fn is_valid_video_id(candidate: &str) -> bool {
    candidate.len() == VIDEO_ID_LEN
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_url() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42s").unwrap(),
            "dQw4w9WgXcQ"
        );
        assert_eq!(
            extract_video_id("https://m.youtube.com/watch?feature=share&v=dQw4w9WgXcQ").unwrap(),
            "dQw4w9WgXcQ"
        );
    }

    #[test]
    fn test_short_and_path_urls() {
        assert_eq!(extract_video_id("https://youtu.be/dQw4w9WgXcQ?si=x").unwrap(), "dQw4w9WgXcQ");
        assert_eq!(
            extract_video_id("https://youtube.com/embed/dQw4w9WgXcQ").unwrap(),
            "dQw4w9WgXcQ"
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/shorts/dQw4w9WgXcQ/").unwrap(),
            "dQw4w9WgXcQ"
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/live/dQw4w9WgXcQ").unwrap(),
            "dQw4w9WgXcQ"
        );
    }

    #[test]
    fn test_bare_id() {
        assert_eq!(extract_video_id("  dQw4w9WgXcQ ").unwrap(), "dQw4w9WgXcQ");
    }

    #[test]
    fn test_rejections() {
        assert_eq!(extract_video_id(""), Err(SourceIdError::Empty));
        assert!(matches!(
            extract_video_id("https://vimeo.com/12345"),
            Err(SourceIdError::Unrecognized(_))
        ));
        assert!(matches!(
            extract_video_id("https://www.youtube.com/watch?v=short"),
            Err(SourceIdError::InvalidId(_))
        ));
        assert!(matches!(
            extract_video_id("https://www.youtube.com/feed/trending"),
            Err(SourceIdError::Unrecognized(_))
        ));
        assert!(matches!(
            extract_video_id("not a link"),
            Err(SourceIdError::Unrecognized(_))
        ));
    }

    #[test]
    fn test_container_match() {
        let stream = StreamCandidate {
            url: "https://cdn.example/v.mp4".to_string(),
            container: "MP4".to_string(),
            quality: None,
            size: 10,
        };
        assert!(stream.matches_container("mp4"));
        assert!(!stream.matches_container("webm"));
    }
}
