//! Interest oracle client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use smint_models::InterestPeriod;

use crate::error::{transport, SourceError, SourceResult};
use crate::types::PeriodsResponse;

const SERVICE: &str = "interest oracle";

/// Supplies weighted interest periods for a source.
#[async_trait]
pub trait InterestOracle: Send + Sync {
    /// Periods relevant at `threshold` (0..1). An empty list is valid.
    async fn interest_periods(&self, link: &str, threshold: f64) -> SourceResult<Vec<InterestPeriod>>;
}

#[derive(Debug, Clone)]
pub struct OracleConfig {
    /// Endpoint receiving `link` and `threshold` query parameters
    pub url: String,
    pub timeout: Duration,
}

impl OracleConfig {
    pub fn from_env() -> SourceResult<Self> {
        Ok(Self {
            url: std::env::var("ORACLE_URL")
                .map_err(|_| SourceError::Config("ORACLE_URL not set".to_string()))?,
            timeout: Duration::from_secs(
                std::env::var("HTTP_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
        })
    }

    pub fn validate(&self) -> SourceResult<()> {
        reqwest::Url::parse(&self.url)
            .map(|_| ())
            .map_err(|e| SourceError::Config(format!("ORACLE_URL: {}", e)))
    }
}

/// HTTP interest oracle client.
pub struct HttpOracle {
    http: Client,
    config: OracleConfig,
}

impl HttpOracle {
    pub fn new(config: OracleConfig) -> SourceResult<Self> {
        config.validate()?;
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }
}

#[async_trait]
impl InterestOracle for HttpOracle {
    async fn interest_periods(&self, link: &str, threshold: f64) -> SourceResult<Vec<InterestPeriod>> {
        debug!(link, threshold, "Requesting interest periods");
        let threshold = threshold.to_string();

        let response = self
            .http
            .get(&self.config.url)
            .query(&[("link", link), ("threshold", threshold.as_str())])
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

        let parsed: PeriodsResponse = serde_json::from_str(&body)
            .map_err(|e| SourceError::invalid_response(SERVICE, e.to_string()))?;
        for (index, period) in parsed.periods.iter().enumerate() {
            period
                .validate()
                .map_err(|source| SourceError::InvalidPeriod { index, source })?;
        }

        info!(count = parsed.periods.len(), "Received interest periods");
        Ok(parsed.periods)
    }
}
