//! Ledger client configuration.

use std::time::Duration;

use crate::abi::validate_address;
use crate::error::{LedgerError, LedgerResult};

#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// JSON-RPC endpoint of a node that manages `from_address`
    pub rpc_url: String,
    /// Sending account
    pub from_address: String,
    /// Explicit gas limit; the node estimates when unset
    pub gas_limit: Option<u64>,
    /// Per-request HTTP timeout
    pub request_timeout: Duration,
    /// How long to wait for a receipt
    pub confirm_timeout: Duration,
    /// Delay between receipt polls
    pub poll_interval: Duration,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".to_string(),
            from_address: String::new(),
            gas_limit: None,
            request_timeout: Duration::from_secs(60),
            confirm_timeout: Duration::from_secs(180),
            poll_interval: Duration::from_millis(2000),
        }
    }
}

impl LedgerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> LedgerResult<Self> {
        let defaults = Self::default();
        let parse = |name: &str| std::env::var(name).ok().and_then(|s| s.parse::<u64>().ok());

        Ok(Self {
            rpc_url: std::env::var("LEDGER_RPC_URL")
                .map_err(|_| LedgerError::Config("LEDGER_RPC_URL not set".to_string()))?,
            from_address: std::env::var("LEDGER_FROM_ADDRESS")
                .map_err(|_| LedgerError::Config("LEDGER_FROM_ADDRESS not set".to_string()))?,
            gas_limit: parse("LEDGER_GAS_LIMIT"),
            request_timeout: parse("HTTP_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            confirm_timeout: parse("LEDGER_CONFIRM_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.confirm_timeout),
            poll_interval: parse("LEDGER_POLL_INTERVAL_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
        })
    }

    pub fn validate(&self) -> LedgerResult<()> {
        reqwest::Url::parse(&self.rpc_url)
            .map_err(|e| LedgerError::Config(format!("LEDGER_RPC_URL: {}", e)))?;
        validate_address(&self.from_address)?;
        if self.poll_interval.is_zero() {
            return Err(LedgerError::Config("LEDGER_POLL_INTERVAL_MS must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        let mut config = LedgerConfig::default();
        assert!(matches!(config.validate(), Err(LedgerError::InvalidAddress(_))));

        config.from_address = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".to_string();
        assert!(config.validate().is_ok());

        config.poll_interval = Duration::ZERO;
        assert!(config.validate().is_err());
    }
}
