use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("explorer error: {0}")]
    Explorer(#[from] govtrace_explorer::ExplorerError),

    #[error("on-chain rpc error: {0}")]
    Rpc(#[from] govtrace_proxy::RpcError),
}
