//! Video metadata provider client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::{transport, SourceError, SourceResult};
use crate::types::{DetailsResponse, VideoDetails};

const SERVICE: &str = "video metadata provider";

/// Default RapidAPI host for the video details endpoint.
pub const DEFAULT_RAPIDAPI_HOST: &str = "youtube-media-downloader.p.rapidapi.com";

/// Looks up duration and encoded streams for a video id.
#[async_trait]
pub trait VideoMetadataProvider: Send + Sync {
    async fn video_details(&self, video_id: &str) -> SourceResult<VideoDetails>;
}

/// Configuration for the RapidAPI provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    /// Value of the `x-rapidapi-host` header
    pub host: String,
    /// Scheme and authority requests are sent to
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            host: DEFAULT_RAPIDAPI_HOST.to_string(),
            base_url: format!("https://{}", DEFAULT_RAPIDAPI_HOST),
            timeout: Duration::from_secs(60),
        }
    }
}

impl ProviderConfig {
    /// Create config from environment variables.
    pub fn from_env() -> SourceResult<Self> {
        let api_key = std::env::var("RAPIDAPI_KEY")
            .map_err(|_| SourceError::Config("RAPIDAPI_KEY not set".to_string()))?;
        let host = std::env::var("RAPIDAPI_HOST").unwrap_or_else(|_| DEFAULT_RAPIDAPI_HOST.to_string());
        let base_url = std::env::var("RAPIDAPI_BASE_URL").unwrap_or_else(|_| format!("https://{}", host));
        let timeout = std::env::var("HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));

        Ok(Self {
            api_key,
            host,
            base_url,
            timeout,
        })
    }

    pub fn validate(&self) -> SourceResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(SourceError::Config("RAPIDAPI_KEY is empty".to_string()));
        }
        reqwest::Url::parse(&self.base_url)
            .map_err(|e| SourceError::Config(format!("provider base url: {}", e)))?;
        Ok(())
    }
}

/// RapidAPI video details client.
pub struct RapidApiProvider {
    http: Client,
    config: ProviderConfig,
}

impl RapidApiProvider {
    pub fn new(config: ProviderConfig) -> SourceResult<Self> {
        config.validate()?;
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    pub fn from_env() -> SourceResult<Self> {
        Self::new(ProviderConfig::from_env()?)
    }
}

#[async_trait]
impl VideoMetadataProvider for RapidApiProvider {
    async fn video_details(&self, video_id: &str) -> SourceResult<VideoDetails> {
        let url = format!("{}/v2/video/details", self.config.base_url.trim_end_matches('/'));
        debug!(video_id, "Requesting video details");

        let response = self
            .http
            .get(&url)
            .query(&[
                ("videoId", video_id),
                ("urlAccess", "normal"),
                ("videos", "auto"),
                ("audios", "auto"),
            ])
            .header("x-rapidapi-host", &self.config.host)
            .header("x-rapidapi-key", &self.config.api_key)
            .send()
            .await
            .map_err(transport(SERVICE))?;

        let status = response.status();
        let body = response.text().await.map_err(transport(SERVICE))?;
        if !status.is_success() {
            return Err(SourceError::RequestFailed {
                service: SERVICE,
                status: status.as_u16(),
                body,
            });
        }

        let details: DetailsResponse = serde_json::from_str(&body)
            .map_err(|e| SourceError::invalid_response(SERVICE, e.to_string()))?;
        if !details.length_seconds.is_finite() || details.length_seconds <= 0.0 {
            return Err(SourceError::invalid_response(
                SERVICE,
                format!("lengthSeconds must be positive, got {}", details.length_seconds),
            ));
        }

        Ok(VideoDetails {
            video_id: video_id.to_string(),
            title: details.title,
            duration_secs: details.length_seconds,
            candidates: details
                .videos
                .map(|v| v.items.into_iter().map(Into::into).collect())
                .unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> RapidApiProvider {
        RapidApiProvider::new(ProviderConfig {
            api_key: "key".to_string(),
            base_url: server.uri(),
            ..ProviderConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_video_details() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/video/details"))
            .and(query_param("videoId", "dQw4w9WgXcQ"))
            .and(query_param("urlAccess", "normal"))
            .and(header("x-rapidapi-key", "key"))
            .and(header("x-rapidapi-host", DEFAULT_RAPIDAPI_HOST))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "title": "Launch stream",
                "lengthSeconds": 1200,
                "videos": {"items": [
                    {"url": "https://cdn/a.mp4", "extension": "mp4", "size": 900, "quality": "720p"},
                    {"url": "https://cdn/b.webm", "extension": "webm", "size": 100}
                ]}
            })))
            .mount(&server)
            .await;

        let details = provider_for(&server).video_details("dQw4w9WgXcQ").await.unwrap();
        assert_eq!(details.duration_secs, 1200.0);
        assert_eq!(details.title.as_deref(), Some("Launch stream"));
        assert_eq!(details.candidates.len(), 2);
        assert_eq!(details.candidates[0].quality.as_deref(), Some("720p"));
    }

    #[tokio::test]
    async fn test_upstream_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let err = provider_for(&server).video_details("dQw4w9WgXcQ").await.unwrap_err();
        assert!(matches!(err, SourceError::RequestFailed { status: 429, .. }));
        assert!(err.is_upstream());
    }

    #[tokio::test]
    async fn test_schema_mismatch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": false})))
            .mount(&server)
            .await;

        let err = provider_for(&server).video_details("dQw4w9WgXcQ").await.unwrap_err();
        assert!(matches!(err, SourceError::InvalidResponse { .. }));
    }

    #[test]
    fn test_missing_key_is_config_error() {
        assert!(matches!(
            RapidApiProvider::new(ProviderConfig::default()),
            Err(SourceError::Config(_))
        ));
    }
}
