//! Ledger error types.

use thiserror::Error;

pub type LedgerResult<T> = Result<T, LedgerError>;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Ledger configuration error: {0}")]
    Config(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("RPC endpoint returned {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Invalid RPC response: {0}")]
    InvalidResponse(String),

    #[error("ABI decoding failed: {0}")]
    Abi(String),

    #[error("Transaction {tx_hash} failed with status {status}")]
    Reverted { tx_hash: String, status: String },

    #[error("Transaction {tx_hash} not confirmed within {secs} seconds")]
    ConfirmationTimeout { tx_hash: String, secs: u64 },

    #[error("Not supported: {0}")]
    Unsupported(&'static str),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl LedgerError {
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    pub fn abi(msg: impl Into<String>) -> Self {
        Self::Abi(msg.into())
    }
}
