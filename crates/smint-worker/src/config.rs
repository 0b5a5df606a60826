//! Pipeline configuration.
//!
//! Read once at startup and passed by value to the orchestrator.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use smint_ledger::LedgerConfig;
use smint_models::ExtractionParams;
use smint_sources::{OracleConfig, ProviderConfig};
use smint_storage::PinataConfig;

use crate::error::{PipelineError, PipelineResult};

/// Placeholder contract used when no ledger is written to.
pub const DRY_RUN_CONTRACT: &str = "0x0000000000000000000000000000000000000000";

/// Credentials required for a live run.
const REQUIRED_LIVE: [&str; 5] = [
    "RAPIDAPI_KEY",
    "PINATA_JWT",
    "ORACLE_URL",
    "LEDGER_RPC_URL",
    "LEDGER_FROM_ADDRESS",
];

/// Credentials required for a dry run.
const REQUIRED_DRY_RUN: [&str; 2] = ["RAPIDAPI_KEY", "ORACLE_URL"];

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Run-level settings for the orchestrator.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Publish to memory and skip ledger writes
    pub dry_run: bool,
    /// Sources longer than this are rejected
    pub max_source_duration_secs: u64,
    /// Upper bound for a whole run
    pub run_timeout: Duration,
    /// Per transcoder invocation
    pub transcoder_timeout: Duration,
    /// Source download
    pub download_timeout: Duration,
    /// Root for per-run temporary workspaces
    pub work_dir: PathBuf,
    pub ffmpeg_path: String,
    /// Container the downloaded stream must use
    pub accepted_container: String,
    /// Threshold used when the task does not carry one
    pub default_score_threshold: f64,
    pub extraction: ExtractionParams,
    /// Prefix turning a content identifier into a URI
    pub gateway_prefix: String,
    pub collection_name: String,
    /// Collection written to for link-based tasks
    pub contract_address: Option<String>,
    /// Prometheus listener
    pub metrics_addr: Option<SocketAddr>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            max_source_duration_secs: 1800,
            run_timeout: Duration::from_secs(3600),
            transcoder_timeout: Duration::from_secs(300),
            download_timeout: Duration::from_secs(900),
            work_dir: PathBuf::from("/tmp/streammint"),
            ffmpeg_path: "ffmpeg".to_string(),
            accepted_container: "mp4".to_string(),
            default_score_threshold: 0.5,
            extraction: ExtractionParams::default(),
            gateway_prefix: "ipfs://".to_string(),
            collection_name: "StreamMint".to_string(),
            contract_address: None,
            metrics_addr: None,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> PipelineResult<Self> {
        let defaults = Self::default();
        let secs = |name: &str, default: Duration| {
            env_parse::<u64>(name).map(Duration::from_secs).unwrap_or(default)
        };

        let metrics_addr = match std::env::var("METRICS_ADDR") {
            Ok(raw) if !raw.trim().is_empty() => Some(
                raw.trim()
                    .parse()
                    .map_err(|e| PipelineError::config(format!("METRICS_ADDR: {}", e)))?,
            ),
            _ => None,
        };

        let mut extraction = defaults.extraction.clone();
        if let Some(fps) = env_parse("CLIP_FPS") {
            extraction = extraction.with_clip_fps(fps);
        }
        if let Some(width) = env_parse("CLIP_WIDTH") {
            extraction = extraction.with_clip_width(width);
        }
        if let Some(width) = env_parse("STILL_WIDTH") {
            extraction = extraction.with_still_width(width);
        }

        let config = Self {
            dry_run: env_flag("SMINT_DRY_RUN"),
            max_source_duration_secs: env_parse("MAX_SOURCE_DURATION_SECS")
                .unwrap_or(defaults.max_source_duration_secs),
            run_timeout: secs("RUN_TIMEOUT_SECS", defaults.run_timeout),
            transcoder_timeout: secs("TRANSCODER_TIMEOUT_SECS", defaults.transcoder_timeout),
            download_timeout: secs("DOWNLOAD_TIMEOUT_SECS", defaults.download_timeout),
            work_dir: std::env::var("WORK_DIR").map(PathBuf::from).unwrap_or(defaults.work_dir),
            ffmpeg_path: std::env::var("FFMPEG_PATH").unwrap_or(defaults.ffmpeg_path),
            accepted_container: std::env::var("ACCEPTED_CONTAINER")
                .unwrap_or(defaults.accepted_container),
            default_score_threshold: env_parse("DEFAULT_SCORE_THRESHOLD")
                .unwrap_or(defaults.default_score_threshold),
            extraction,
            gateway_prefix: std::env::var("GATEWAY_PREFIX").unwrap_or(defaults.gateway_prefix),
            collection_name: std::env::var("COLLECTION_NAME").unwrap_or(defaults.collection_name),
            contract_address: std::env::var("LEDGER_CONTRACT_ADDRESS")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            metrics_addr,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PipelineResult<()> {
        if self.max_source_duration_secs == 0 {
            return Err(PipelineError::config("MAX_SOURCE_DURATION_SECS must be positive"));
        }
        if !(0.0..=1.0).contains(&self.default_score_threshold) {
            return Err(PipelineError::config("DEFAULT_SCORE_THRESHOLD must be within 0..1"));
        }
        if self.accepted_container.trim().is_empty() {
            return Err(PipelineError::config("ACCEPTED_CONTAINER is empty"));
        }
        if self.extraction.clip_fps == 0 || self.extraction.clip_width == 0 || self.extraction.still_width == 0 {
            return Err(PipelineError::config("CLIP_FPS, CLIP_WIDTH and STILL_WIDTH must be positive"));
        }
        if let Some(address) = &self.contract_address {
            smint_ledger::abi::validate_address(address)
                .map_err(|e| PipelineError::config(format!("LEDGER_CONTRACT_ADDRESS: {}", e)))?;
        }
        Ok(())
    }
}

/// Credentials and endpoints of the external services.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub provider: ProviderConfig,
    pub oracle: OracleConfig,
    /// Absent in dry runs
    pub storage: Option<PinataConfig>,
    /// Absent in dry runs
    pub ledger: Option<LedgerConfig>,
}

impl ServiceConfig {
    /// Create config from environment variables. Every missing credential is
    /// reported at once.
    pub fn from_env(dry_run: bool) -> PipelineResult<Self> {
        let required: &[&str] = if dry_run { &REQUIRED_DRY_RUN } else { &REQUIRED_LIVE };
        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|name| std::env::var(name).map(|v| v.trim().is_empty()).unwrap_or(true))
            .collect();
        if !missing.is_empty() {
            return Err(PipelineError::config(format!(
                "missing required configuration: {}",
                missing.join(", ")
            )));
        }

        let config = Self {
            provider: ProviderConfig::from_env()?,
            oracle: OracleConfig::from_env()?,
            storage: if dry_run { None } else { Some(PinataConfig::from_env()?) },
            ledger: if dry_run { None } else { Some(LedgerConfig::from_env()?) },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PipelineResult<()> {
        self.provider.validate()?;
        self.oracle.validate()?;
        if let Some(storage) = &self.storage {
            storage.validate()?;
        }
        if let Some(ledger) = &self.ledger {
            ledger
                .validate()
                .map_err(|e| PipelineError::config(e.to_string()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_source_duration_secs, 1800);
        assert_eq!(config.extraction.clip_filter(), "fps=5,scale=320:-1:flags=fast_bilinear");
    }

    #[test]
    fn test_rejects_bad_threshold_and_contract() {
        let config = PipelineConfig {
            default_score_threshold: 1.5,
            ..PipelineConfig::default()
        };
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));

        let config = PipelineConfig {
            contract_address: Some("0xnope".to_string()),
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_service_config_validation() {
        let services = ServiceConfig {
            provider: ProviderConfig {
                api_key: "key".to_string(),
                ..ProviderConfig::default()
            },
            oracle: OracleConfig {
                url: "not a url".to_string(),
                timeout: Duration::from_secs(1),
            },
            storage: None,
            ledger: None,
        };
        assert!(matches!(services.validate(), Err(PipelineError::Config(_))));
    }
}
