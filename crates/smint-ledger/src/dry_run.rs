//! Ledger stand-in that confirms every write immediately.

use std::sync::Mutex;

use async_trait::async_trait;
use sha3::{Digest, Keccak256};
use tracing::info;

use crate::abi;
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::{CollectionInfo, Receipt, TokenLedger, TxHandle};

/// Records `setTokenURI` calls instead of sending them.
#[derive(Debug, Default)]
pub struct DryRunLedger {
    calls: Mutex<Vec<(u64, String)>>,
}

impl DryRunLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(token_id, uri)` pairs submitted so far, in order.
    pub fn calls(&self) -> Vec<(u64, String)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TokenLedger for DryRunLedger {
    async fn submit_token_uri(&self, contract: &str, token_id: u64, uri: &str) -> LedgerResult<TxHandle> {
        let calldata = abi::encode_set_token_uri(token_id, uri);
        let mut hasher = Keccak256::new();
        hasher.update(contract.as_bytes());
        hasher.update(&calldata);
        let tx_hash = abi::to_hex_data(&hasher.finalize());

        if let Ok(mut calls) = self.calls.lock() {
            calls.push((token_id, uri.to_string()));
        }
        info!(token_id, uri, tx_hash = %tx_hash, "Dry run: setTokenURI");
        Ok(TxHandle { token_id, tx_hash })
    }

    async fn await_confirmation(&self, handle: &TxHandle) -> LedgerResult<Receipt> {
        Ok(Receipt {
            tx_hash: handle.tx_hash.clone(),
            block_number: None,
        })
    }

    async fn read_collection(&self, _contract: &str) -> LedgerResult<CollectionInfo> {
        Err(LedgerError::Unsupported("collection reads in dry run"))
    }
}
