//! JSON-RPC 2.0 transport.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::trace;

use crate::error::{LedgerError, LedgerResult};

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Minimal JSON-RPC client over HTTP.
pub struct JsonRpcClient {
    http: Client,
    url: String,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> LedgerResult<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.into(),
            next_id: AtomicU64::new(1),
        })
    }

    /// Call `method` and decode its `result` (which may be `null`).
    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> LedgerResult<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        trace!(method, id, "RPC request");

        let response = self.http.post(&self.url).json(&request).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(LedgerError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: RpcResponse = serde_json::from_str(&body)
            .map_err(|e| LedgerError::invalid_response(format!("{}: {}", method, e)))?;
        if let Some(error) = parsed.error {
            return Err(LedgerError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        serde_json::from_value(parsed.result.unwrap_or(Value::Null))
            .map_err(|e| LedgerError::invalid_response(format!("{} result: {}", method, e)))
    }
}
