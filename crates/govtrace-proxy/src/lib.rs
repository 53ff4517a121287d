//! Concurrent EVM proxy-pattern detection.
//!
//! Eleven detection schemes are raced against an address at once; the
//! first positive result wins, under a single wall-clock cap. See
//! [`resolver::ProxyResolver`].

pub mod error;
pub mod json_rpc;
pub mod resolver;
pub mod rpc;
pub mod schemes;

pub use error::RpcError;
pub use json_rpc::HttpEvmRpc;
pub use resolver::ProxyResolver;
pub use rpc::EvmRpc;
pub use schemes::{ProxyDetection, ProxyKind};
