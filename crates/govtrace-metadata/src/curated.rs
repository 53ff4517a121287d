//! Bundled curated maps: hardcoded contract names, an external token
//! list mirror, and the bridge-gateway argument split table used by
//! `MetadataResolver`'s fan-out.

use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct TokenListEntry {
    pub symbol: String,
    pub name: Option<String>,
}

/// Describes how a bridge gateway's call arguments split between
/// "this chain" and "the destination chain" for metadata fan-out.
#[derive(Debug, Clone)]
pub struct BridgeArgSplit {
    pub source_chain_arg_indices: Vec<usize>,
    pub destination_chain_arg_indices: Vec<usize>,
    pub destination_chain_id: u64,
}

#[derive(Debug, Clone, Default)]
pub struct CuratedMaps {
    hardcoded_names: HashMap<(u64, String), String>,
    token_list: HashMap<(u64, String), TokenListEntry>,
    bridge_splits: HashMap<(String, String), BridgeArgSplit>,
}

impl CuratedMaps {
    pub fn new() -> Self {
        CuratedMaps::default()
    }

    pub fn insert_name(&mut self, chain_id: u64, address: &str, name: impl Into<String>) {
        self.hardcoded_names.insert((chain_id, address.to_lowercase()), name.into());
    }

    pub fn name(&self, chain_id: u64, address: &str) -> Option<&str> {
        self.hardcoded_names.get(&(chain_id, address.to_lowercase())).map(String::as_str)
    }

    pub fn insert_token(&mut self, chain_id: u64, address: &str, entry: TokenListEntry) {
        self.token_list.insert((chain_id, address.to_lowercase()), entry);
    }

    pub fn token(&self, chain_id: u64, address: &str) -> Option<&TokenListEntry> {
        self.token_list.get(&(chain_id, address.to_lowercase()))
    }

    pub fn insert_bridge_split(&mut self, gateway: &str, method: &str, split: BridgeArgSplit) {
        self.bridge_splits.insert((gateway.to_lowercase(), method.to_string()), split);
    }

    pub fn bridge_split(&self, gateway: &str, method: &str) -> Option<&BridgeArgSplit> {
        self.bridge_splits.get(&(gateway.to_lowercase(), method.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bridge_split_lookup_is_keyed_by_gateway_and_method() {
        let mut maps = CuratedMaps::new();
        maps.insert_bridge_split(
            "0xGateway",
            "sendMessage",
            BridgeArgSplit { source_chain_arg_indices: vec![0], destination_chain_arg_indices: vec![1, 2], destination_chain_id: 10 },
        );
        let split = maps.bridge_split("0xgateway", "sendMessage").unwrap();
        assert_eq!(split.destination_chain_id, 10);
        assert!(maps.bridge_split("0xgateway", "other").is_none());
    }
}
