//! Resolves the ABI used to decode one target's calldata: explorer-
//! verified first, the bundled local index as fallback. Proxy resolution
//! (which address's ABI to fetch) happens one level up, in the engine.

use std::collections::HashMap;

use govtrace_codec::Codec;
use govtrace_core::{ChainId, DataSource};
use govtrace_explorer::{AbiFetch, ExplorerClient};

/// A small bundled ABI table, keyed by `(chainId, address)`, consulted
/// when the explorer has no verified source. Analogous in spirit to the
/// static deployment index, but for ABI documents rather than names.
#[derive(Debug, Clone, Default)]
pub struct LocalAbiIndex {
    abis: HashMap<(u64, String), String>,
}

impl LocalAbiIndex {
    pub fn new() -> Self {
        LocalAbiIndex::default()
    }

    pub fn insert(&mut self, chain_id: u64, address: &str, abi_json: impl Into<String>) {
        self.abis.insert((chain_id, address.to_lowercase()), abi_json.into());
    }

    pub fn get(&self, chain_id: u64, address: &str) -> Option<&str> {
        self.abis.get(&(chain_id, address.to_lowercase())).map(String::as_str)
    }
}

pub struct ResolvedAbi {
    pub codec: Codec,
    pub source: DataSource,
}

/// Fetches the ABI for `address`, preferring an explorer-verified source
/// and falling back to the bundled local index. `None` when neither has
/// anything — the caller classifies the node as "ABI not available".
pub async fn resolve_abi(
    explorer: &ExplorerClient,
    local: &LocalAbiIndex,
    chain_id: ChainId,
    address: &str,
) -> Option<ResolvedAbi> {
    if let Ok(AbiFetch::Found(json)) = explorer.fetch_abi(chain_id, address).await {
        if let Ok(codec) = Codec::from_abi_json(&json.to_string()) {
            return Some(ResolvedAbi {
                codec,
                source: DataSource::EtherscanABI { chain_id: chain_id.0, address: address.to_string() },
            });
        }
    }

    let abi_json = local.get(chain_id.0, address)?;
    let codec = Codec::from_abi_json(abi_json).ok()?;
    Some(ResolvedAbi {
        codec,
        source: DataSource::LocalABI { path: format!("bundled:{}:{}", chain_id.0, address), variant: None },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let mut index = LocalAbiIndex::new();
        index.insert(1, "0xABC", "[]");
        assert_eq!(index.get(1, "0xabc"), Some("[]"));
        assert_eq!(index.get(2, "0xabc"), None);
    }
}
