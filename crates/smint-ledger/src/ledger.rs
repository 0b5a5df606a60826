//! Two-phase token URI commits.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::abi::{self, MAX_SUPPLY, VIDEO_URL};
use crate::config::LedgerConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::rpc::JsonRpcClient;

/// A submitted, not yet finalized, transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxHandle {
    pub token_id: u64,
    pub tx_hash: String,
}

/// A finalized successful transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: String,
    pub block_number: Option<u64>,
}

/// Parameters a deployed collection exposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionInfo {
    pub video_url: String,
    pub max_supply: u64,
}

/// Ledger write and read operations used by the pipeline.
#[async_trait]
pub trait TokenLedger: Send + Sync {
    /// Send `setTokenURI(token_id, uri)` to `contract` without waiting for it
    /// to be mined.
    async fn submit_token_uri(&self, contract: &str, token_id: u64, uri: &str) -> LedgerResult<TxHandle>;

    /// Wait for the transaction's finalized status. A non-success status is
    /// an error just like a failed submission.
    async fn await_confirmation(&self, handle: &TxHandle) -> LedgerResult<Receipt>;

    /// Read the source link and supply of a collection.
    async fn read_collection(&self, contract: &str) -> LedgerResult<CollectionInfo>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    block_number: Option<String>,
}

/// Ledger reached over JSON-RPC with a node-managed sending account.
pub struct JsonRpcLedger {
    rpc: JsonRpcClient,
    config: LedgerConfig,
}

impl JsonRpcLedger {
    pub fn new(config: LedgerConfig) -> LedgerResult<Self> {
        config.validate()?;
        let rpc = JsonRpcClient::new(config.rpc_url.clone(), config.request_timeout)?;
        Ok(Self { rpc, config })
    }

    async fn eth_call(&self, contract: &str, signature: &str) -> LedgerResult<Vec<u8>> {
        let data: String = self
            .rpc
            .call(
                "eth_call",
                json!([{ "to": contract, "data": abi::to_hex_data(&abi::encode_call(signature)) }, "latest"]),
            )
            .await?;
        abi::from_hex_data(&data)
    }

    async fn poll_receipt(&self, tx_hash: &str) -> LedgerResult<RpcReceipt> {
        loop {
            let receipt: Option<RpcReceipt> = self
                .rpc
                .call("eth_getTransactionReceipt", json!([tx_hash]))
                .await?;
            if let Some(receipt) = receipt {
                return Ok(receipt);
            }
            debug!(tx_hash, "Receipt not available yet");
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }
}

#[async_trait]
impl TokenLedger for JsonRpcLedger {
    async fn submit_token_uri(&self, contract: &str, token_id: u64, uri: &str) -> LedgerResult<TxHandle> {
        abi::validate_address(contract)?;

        let mut tx = json!({
            "from": self.config.from_address,
            "to": contract,
            "data": abi::to_hex_data(&abi::encode_set_token_uri(token_id, uri)),
        });
        if let Some(gas) = self.config.gas_limit {
            tx["gas"] = json!(format!("0x{:x}", gas));
        }

        let tx_hash: String = self.rpc.call("eth_sendTransaction", json!([tx])).await?;
        if !tx_hash.starts_with("0x") {
            return Err(LedgerError::invalid_response(format!("bad tx hash {}", tx_hash)));
        }

        info!(token_id, tx_hash = %tx_hash, uri, "Submitted setTokenURI");
        Ok(TxHandle { token_id, tx_hash })
    }

    async fn await_confirmation(&self, handle: &TxHandle) -> LedgerResult<Receipt> {
        let limit = self.config.confirm_timeout;
        let receipt = tokio::time::timeout(limit, self.poll_receipt(&handle.tx_hash))
            .await
            .map_err(|_| LedgerError::ConfirmationTimeout {
                tx_hash: handle.tx_hash.clone(),
                secs: limit.as_secs(),
            })??;

        let status = receipt.status.unwrap_or_else(|| "missing".to_string());
        if status != "0x1" {
            warn!(tx_hash = %handle.tx_hash, status = %status, "Transaction failed");
            return Err(LedgerError::Reverted {
                tx_hash: handle.tx_hash.clone(),
                status,
            });
        }

        let block_number = receipt
            .block_number
            .as_deref()
            .map(abi::parse_quantity)
            .transpose()?;
        info!(token_id = handle.token_id, tx_hash = %handle.tx_hash, ?block_number, "Transaction confirmed");
        Ok(Receipt {
            tx_hash: handle.tx_hash.clone(),
            block_number,
        })
    }

    async fn read_collection(&self, contract: &str) -> LedgerResult<CollectionInfo> {
        abi::validate_address(contract)?;
        let video_url = abi::decode_string(&self.eth_call(contract, VIDEO_URL).await?)?;
        let max_supply = abi::decode_uint(&self.eth_call(contract, MAX_SUPPLY).await?)?;
        info!(contract, video_url = %video_url, max_supply, "Read collection");
        Ok(CollectionInfo { video_url, max_supply })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, body_string_contains, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FROM: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
    const CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
    const TX: &str = "0x8c5be1e5ebec7d5bd14f71427d1e84f3dd0314c0f7b2291e5b200ac8c7c3b925";

    fn quick_config(rpc_url: String, from_address: &str) -> LedgerConfig {
        LedgerConfig {
            rpc_url,
            from_address: from_address.to_string(),
            confirm_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(20),
            ..LedgerConfig::default()
        }
    }

    fn rpc_result(result: Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": result}))
    }

    fn ledger_for(server: &MockServer) -> JsonRpcLedger {
        JsonRpcLedger::new(quick_config(server.uri(), FROM)).unwrap()
    }

    #[tokio::test]
    async fn test_submit_sends_calldata() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "eth_sendTransaction"})))
            .and(body_string_contains("0x162094c4"))
            .respond_with(rpc_result(json!(TX)))
            .expect(1)
            .mount(&server)
            .await;

        let handle = ledger_for(&server)
            .submit_token_uri(CONTRACT, 2, "ipfs://bafymeta")
            .await
            .unwrap();
        assert_eq!(handle, TxHandle { token_id: 2, tx_hash: TX.to_string() });
    }

    #[tokio::test]
    async fn test_submit_rejects_bad_contract() {
        let server = MockServer::start().await;
        let err = ledger_for(&server)
            .submit_token_uri("0x1234", 0, "ipfs://x")
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAddress(_)));
    }

    #[tokio::test]
    async fn test_confirmation_polls_until_receipt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "eth_getTransactionReceipt"})))
            .respond_with(rpc_result(Value::Null))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "eth_getTransactionReceipt"})))
            .respond_with(rpc_result(json!({"status": "0x1", "blockNumber": "0x10"})))
            .mount(&server)
            .await;

        let handle = TxHandle { token_id: 0, tx_hash: TX.to_string() };
        let receipt = ledger_for(&server).await_confirmation(&handle).await.unwrap();
        assert_eq!(receipt.block_number, Some(16));
    }

    #[tokio::test]
    async fn test_reverted_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(rpc_result(json!({"status": "0x0", "blockNumber": "0x10"})))
            .mount(&server)
            .await;

        let handle = TxHandle { token_id: 1, tx_hash: TX.to_string() };
        let err = ledger_for(&server).await_confirmation(&handle).await.unwrap_err();
        assert!(matches!(err, LedgerError::Reverted { .. }));
    }

    #[tokio::test]
    async fn test_confirmation_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(rpc_result(Value::Null))
            .mount(&server)
            .await;

        let mut config = quick_config(server.uri(), FROM);
        config.confirm_timeout = Duration::from_millis(150);
        let ledger = JsonRpcLedger::new(config).unwrap();

        let handle = TxHandle { token_id: 1, tx_hash: TX.to_string() };
        let err = ledger.await_confirmation(&handle).await.unwrap_err();
        assert!(matches!(err, LedgerError::ConfirmationTimeout { .. }));
    }

    #[tokio::test]
    async fn test_read_collection() {
        let server = MockServer::start().await;
        let url_return = format!(
            "0x{}{}{}",
            format!("{:064x}", 32),
            format!("{:064x}", 28),
            hex::encode({
                let mut b = b"https://youtu.be/dQw4w9WgXcQ".to_vec();
                b.resize(32, 0);
                b
            })
        );
        Mock::given(method("POST"))
            .and(body_string_contains("0x73c9fbe2"))
            .respond_with(rpc_result(json!(url_return)))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains("0xd5abeb01"))
            .respond_with(rpc_result(json!(format!("0x{:064x}", 8))))
            .mount(&server)
            .await;

        let info = ledger_for(&server).read_collection(CONTRACT).await.unwrap();
        assert_eq!(info.video_url, "https://youtu.be/dQw4w9WgXcQ");
        assert_eq!(info.max_supply, 8);
    }
}
