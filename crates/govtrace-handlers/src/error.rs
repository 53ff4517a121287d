use thiserror::Error;

/// Local control flow only — never escapes a node's decode step. The
/// registry converts a failing handler into a note on the node instead
/// of propagating this upward.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("expected argument `{0}` was missing or the wrong shape")]
    MissingArg(String),

    #[error("on-chain view call failed: {0}")]
    Rpc(String),

    #[error("malformed handler input: {0}")]
    Malformed(String),
}
