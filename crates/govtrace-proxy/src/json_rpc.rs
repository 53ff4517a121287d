//! A plain JSON-RPC-over-HTTP `EvmRpc`, talking `eth_call` / `eth_getCode`
//! / `eth_getStorageAt` against a single chain's RPC endpoint. Modeled on
//! the explorer client's request/response shape — one `reqwest::Client`,
//! no retry (an RPC failure here is absorbed by the caller as absent
//! metadata, never retried).

use async_trait::async_trait;
use serde_json::{json, Value};
use url::Url;

use crate::error::RpcError;
use crate::rpc::EvmRpc;

pub struct HttpEvmRpc {
    http: reqwest::Client,
    url: Url,
}

impl HttpEvmRpc {
    pub fn new(url: Url) -> Self {
        HttpEvmRpc { http: reqwest::Client::new(), url }
    }

    async fn call_method(&self, method: &str, params: Value) -> Result<String, RpcError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let response: Value = self
            .http
            .post(self.url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))?
            .json()
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))?;

        if let Some(error) = response.get("error") {
            return Err(RpcError::Transport(error.to_string()));
        }
        response
            .get("result")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| RpcError::Malformed(format!("{method} returned no result field")))
    }
}

#[async_trait]
impl EvmRpc for HttpEvmRpc {
    async fn get_code(&self, address: &str) -> Result<Vec<u8>, RpcError> {
        let hex = self.call_method("eth_getCode", json!([address, "latest"])).await?;
        hex::decode(hex.strip_prefix("0x").unwrap_or(&hex)).map_err(|e| RpcError::Malformed(e.to_string()))
    }

    async fn get_storage_at(&self, address: &str, slot: &str) -> Result<String, RpcError> {
        self.call_method("eth_getStorageAt", json!([address, slot, "latest"])).await
    }

    async fn call(&self, address: &str, calldata: &[u8]) -> Result<Vec<u8>, RpcError> {
        let data = format!("0x{}", hex::encode(calldata));
        let hex = self.call_method("eth_call", json!([{"to": address, "data": data}, "latest"])).await?;
        hex::decode(hex.strip_prefix("0x").unwrap_or(&hex)).map_err(|e| RpcError::Malformed(e.to_string()))
    }
}
