use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid ABI json: {0}")]
    InvalidAbi(String),

    #[error("function '{0}' not found in ABI")]
    FunctionNotFound(String),

    #[error("argument count mismatch: expected {expected}, got {got}")]
    ArgCountMismatch { expected: usize, got: usize },

    #[error("cannot encode argument {index}: {reason}")]
    EncodeFailed { index: usize, reason: String },
}
