//! Background ledger confirmations joined with an all-settled barrier.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::warn;

use smint_ledger::{TokenLedger, TxHandle};
use smint_models::TransactionOutcome;

use crate::error::PipelineError;

/// In-flight confirmations keyed by segment index.
///
/// Dropping this aborts every outstanding confirmation.
pub(super) struct Confirmations {
    ledger: Arc<dyn TokenLedger>,
    tasks: JoinSet<TransactionOutcome>,
    pending: BTreeMap<u32, TxHandle>,
}

impl Confirmations {
    pub(super) fn new(ledger: Arc<dyn TokenLedger>) -> Self {
        Self {
            ledger,
            tasks: JoinSet::new(),
            pending: BTreeMap::new(),
        }
    }

    pub(super) fn len(&self) -> usize {
        self.pending.len()
    }

    /// Start awaiting a submitted transaction without blocking the caller.
    pub(super) fn spawn(&mut self, segment_index: u32, handle: TxHandle) {
        self.pending.insert(segment_index, handle.clone());
        let ledger = self.ledger.clone();

        self.tasks.spawn(async move {
            match ledger.await_confirmation(&handle).await {
                Ok(receipt) => TransactionOutcome::confirmed(
                    segment_index,
                    handle.token_id,
                    receipt.tx_hash,
                    receipt.block_number,
                ),
                Err(e) => {
                    let err = PipelineError::from(e);
                    warn!(segment = segment_index, tx_hash = %handle.tx_hash, "Confirmation failed: {}", err);
                    TransactionOutcome::failed(
                        segment_index,
                        handle.token_id,
                        Some(handle.tx_hash),
                        err.to_string(),
                    )
                }
            }
        });
    }

    /// Wait for every confirmation. Yields one outcome per spawned segment,
    /// whatever the others do.
    pub(super) async fn join_all(mut self) -> Vec<TransactionOutcome> {
        let mut outcomes = Vec::with_capacity(self.pending.len());
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(outcome) => {
                    self.pending.remove(&outcome.segment_index);
                    outcomes.push(outcome);
                }
                Err(e) => warn!("Confirmation task ended abnormally: {}", e),
            }
        }

        for (segment_index, handle) in std::mem::take(&mut self.pending) {
            outcomes.push(TransactionOutcome::failed(
                segment_index,
                handle.token_id,
                Some(handle.tx_hash),
                "confirmation task aborted",
            ));
        }
        outcomes
    }
}
