//! Chain identifiers and the catalogue of chains the decoder knows about.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An EVM chain id, newtyped so it can't be confused with an address index
/// or a proposal id in function signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub u64);

impl ChainId {
    pub const MAINNET: ChainId = ChainId(1);
    pub const ARBITRUM: ChainId = ChainId(42161);
    pub const OPTIMISM: ChainId = ChainId(10);
    pub const BASE: ChainId = ChainId(8453);
    pub const POLYGON: ChainId = ChainId(137);
    pub const LINEA: ChainId = ChainId(59144);
    pub const SCROLL: ChainId = ChainId(534352);
    pub const BSC: ChainId = ChainId(56);
    pub const AVALANCHE: ChainId = ChainId(43114);

    pub fn slug(self) -> &'static str {
        match self.0 {
            1 => "ethereum",
            10 => "optimism",
            56 => "bsc",
            137 => "polygon",
            42161 => "arbitrum",
            43114 => "avalanche",
            8453 => "base",
            59144 => "linea",
            534352 => "scroll",
            _ => "unknown",
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_id_display_is_numeric() {
        assert_eq!(ChainId::ARBITRUM.to_string(), "42161");
    }

    #[test]
    fn chain_id_slug_known_and_unknown() {
        assert_eq!(ChainId::MAINNET.slug(), "ethereum");
        assert_eq!(ChainId(999_999).slug(), "unknown");
    }

    #[test]
    fn chain_id_serde_roundtrip() {
        let json = serde_json::to_string(&ChainId::LINEA).unwrap();
        assert_eq!(json, "59144");
        let back: ChainId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ChainId::LINEA);
    }
}
