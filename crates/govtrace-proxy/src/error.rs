use thiserror::Error;

/// Errors surfaced by an `EvmRpc` adapter. A resolver never lets these
/// escape — a failing scheme is simply treated as a negative result.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("rpc transport error: {0}")]
    Transport(String),

    #[error("rpc returned malformed data: {0}")]
    Malformed(String),
}
