//! Pinata v3 files API client.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, info};

use smint_models::{Artifact, PublishedArtifact};

use crate::error::{StorageError, StorageResult};
use crate::store::ContentStore;

/// Default upload endpoint.
pub const DEFAULT_UPLOAD_URL: &str = "https://uploads.pinata.cloud/v3/files";

/// Configuration for the Pinata client.
#[derive(Debug, Clone)]
pub struct PinataConfig {
    /// Bearer JWT
    pub jwt: String,
    /// Files upload endpoint
    pub upload_url: String,
    /// Network visibility (`public` or `private`)
    pub network: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for PinataConfig {
    fn default() -> Self {
        Self {
            jwt: String::new(),
            upload_url: DEFAULT_UPLOAD_URL.to_string(),
            network: "public".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl PinataConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        let defaults = Self::default();
        Ok(Self {
            jwt: std::env::var("PINATA_JWT")
                .map_err(|_| StorageError::config_error("PINATA_JWT not set"))?,
            upload_url: std::env::var("PINATA_UPLOAD_URL").unwrap_or(defaults.upload_url),
            network: std::env::var("PINATA_NETWORK").unwrap_or(defaults.network),
            timeout: std::env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        })
    }

    pub fn validate(&self) -> StorageResult<()> {
        if self.jwt.trim().is_empty() {
            return Err(StorageError::config_error("PINATA_JWT is empty"));
        }
        reqwest::Url::parse(&self.upload_url)
            .map_err(|e| StorageError::config_error(format!("PINATA_UPLOAD_URL: {}", e)))?;
        if self.network != "public" && self.network != "private" {
            return Err(StorageError::config_error(format!(
                "PINATA_NETWORK must be public or private, got {}",
                self.network
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    data: UploadedFile,
}

#[derive(Debug, Deserialize)]
struct UploadedFile {
    id: String,
    cid: String,
    size: u64,
    created_at: DateTime<Utc>,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    is_duplicate: Option<bool>,
}

/// Pinata storage client.
#[derive(Clone)]
pub struct PinataClient {
    client: reqwest::Client,
    config: PinataConfig,
}

impl PinataClient {
    pub fn new(config: PinataConfig) -> StorageResult<Self> {
        config.validate()?;
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> StorageResult<Self> {
        Self::new(PinataConfig::from_env()?)
    }

    async fn upload(&self, artifact: &Artifact) -> StorageResult<UploadedFile> {
        let file_name = artifact.file_name();
        let part = Part::bytes(artifact.payload.clone())
            .file_name(file_name.clone())
            .mime_str(artifact.mime_type())?;
        let form = Form::new()
            .part("file", part)
            .text("network", self.config.network.clone())
            .text("name", file_name);

        let response = self
            .client
            .post(&self.config.upload_url)
            .bearer_auth(&self.config.jwt)
            .multipart(form)
            .send()
            .await
            .map_err(map_transport)?;

        let status = response.status();
        let body = response.text().await.map_err(map_transport)?;
        if !status.is_success() {
            return Err(StorageError::UploadRejected {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: UploadResponse = serde_json::from_str(&body)
            .map_err(|e| StorageError::invalid_response(format!("{}: {}", e, body)))?;
        if parsed.data.cid.is_empty() {
            return Err(StorageError::invalid_response("empty cid"));
        }
        Ok(parsed.data)
    }
}

#[async_trait]
impl ContentStore for PinataClient {
    async fn publish(&self, artifact: &Artifact) -> StorageResult<PublishedArtifact> {
        debug!(
            segment = artifact.segment_index,
            kind = %artifact.kind,
            bytes = artifact.payload.len(),
            "Uploading artifact"
        );

        let file = self.upload(artifact).await?;
        let is_duplicate = file.is_duplicate.unwrap_or(false);
        info!(
            segment = artifact.segment_index,
            kind = %artifact.kind,
            cid = %file.cid,
            id = %file.id,
            is_duplicate,
            "Published artifact"
        );

        Ok(PublishedArtifact {
            kind: artifact.kind,
            cid: file.cid,
            size: file.size,
            is_duplicate,
            mime_type: file
                .mime_type
                .unwrap_or_else(|| artifact.mime_type().to_string()),
            created_at: file.created_at,
        })
    }
}

fn map_transport(e: reqwest::Error) -> StorageError {
    if e.is_timeout() {
        StorageError::Timeout
    } else {
        StorageError::Http(e)
    }
}
