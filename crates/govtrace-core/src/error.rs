//! The three fatal error variants that are allowed to halt a decode, plus
//! the config-loading error. Every other failure mode (timeouts, missing
//! ABIs, handler panics) is absorbed locally into node diagnostics and
//! never reaches this enum — see the propagation policy in the error
//! handling design notes.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecoderError {
    #[error("malformed proposal input: {0}")]
    Input(String),

    #[error("explorer authentication failed: {0}")]
    Auth(String),

    #[error("proposal {proposal_id} does not exist on-chain (proposalDetails reverted)")]
    ChainRevert { proposal_id: String },

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

impl DecoderError {
    pub fn input(msg: impl Into<String>) -> Self {
        DecoderError::Input(msg.into())
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        DecoderError::Auth(msg.into())
    }

    pub fn chain_revert(proposal_id: impl Into<String>) -> Self {
        DecoderError::ChainRevert {
            proposal_id: proposal_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_revert_message_names_the_id() {
        let err = DecoderError::chain_revert("482");
        assert!(err.to_string().contains("482"));
    }
}
