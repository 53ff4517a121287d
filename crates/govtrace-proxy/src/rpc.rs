//! RPC surface the proxy schemes probe against.
//!
//! Detection needs only three JSON-RPC primitives. Callers provide a
//! concrete implementation backed by whatever HTTP/WS client they use;
//! tests provide a canned in-memory one.

use async_trait::async_trait;

use crate::error::RpcError;

/// Minimal EVM JSON-RPC surface a proxy scheme can probe.
#[async_trait]
pub trait EvmRpc: Send + Sync {
    /// Raw deployed bytecode at `address` (`eth_getCode`), not hex-encoded.
    async fn get_code(&self, address: &str) -> Result<Vec<u8>, RpcError>;

    /// 32-byte storage word at `slot` (`eth_getStorageAt`), as `0x`-prefixed hex.
    async fn get_storage_at(&self, address: &str, slot: &str) -> Result<String, RpcError>;

    /// Calls `address` with raw ABI-encoded `calldata` and returns the
    /// ABI-encoded return data (`eth_call`), not hex-encoded. `calldata`
    /// is the 4-byte selector for zero-argument view functions, or the
    /// selector plus encoded arguments for everything else.
    async fn call(&self, address: &str, calldata: &[u8]) -> Result<Vec<u8>, RpcError>;
}
