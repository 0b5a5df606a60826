//! Streaming download of the selected source stream.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::error::{MediaError, MediaResult};

/// Retrieves a remote stream into a local file.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Download `url` to `destination`, returning the bytes written.
    async fn fetch(&self, url: &str, destination: &Path) -> MediaResult<u64>;
}

/// HTTP downloader that streams the body to disk.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpDownloader {
    pub fn new(timeout: Duration) -> MediaResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client, timeout })
    }

    async fn stream_to_file(&self, url: &str, destination: &Path) -> MediaResult<u64> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::download_failed(
                format!("source responded with {}", status),
                Some(status.as_u16()),
            ));
        }

        let mut file = tokio::fs::File::create(destination).await?;
        let mut body = response.bytes_stream();
        let mut written: u64 = 0;
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        if written == 0 {
            return Err(MediaError::download_failed("source body was empty", None));
        }
        Ok(written)
    }
}

#[async_trait]
impl SourceFetcher for HttpDownloader {
    async fn fetch(&self, url: &str, destination: &Path) -> MediaResult<u64> {
        let result = match tokio::time::timeout(self.timeout, self.stream_to_file(url, destination)).await {
            Ok(result) => result,
            Err(_) => Err(MediaError::Timeout(self.timeout.as_secs())),
        };

        match result {
            Ok(bytes) => {
                info!(bytes, path = %destination.display(), "Downloaded source");
                Ok(bytes)
            }
            Err(e) => {
                warn!("Source download failed: {}", e);
                if let Err(rm) = tokio::fs::remove_file(destination).await {
                    if rm.kind() != std::io::ErrorKind::NotFound {
                        warn!("Failed to remove partial download: {}", rm);
                    }
                }
                Err(e)
            }
        }
    }
}
