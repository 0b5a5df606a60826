//! Ledger committer.
//!
//! Writes `setTokenURI(tokenId, uri)` transactions through a JSON-RPC node
//! that manages the sending account, then awaits their receipts as a
//! separate step. Also reads collection parameters with `eth_call`.

pub mod abi;
pub mod config;
pub mod dry_run;
pub mod error;
pub mod ledger;
pub mod rpc;

pub use config::LedgerConfig;
pub use dry_run::DryRunLedger;
pub use error::{LedgerError, LedgerResult};
pub use ledger::{CollectionInfo, JsonRpcLedger, Receipt, TokenLedger, TxHandle};
pub use rpc::JsonRpcClient;
