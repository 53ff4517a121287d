//! Ties the static index, curated maps, explorer client, and on-chain
//! RPC together into one trust-ranked `AddressMetadata` builder, with
//! proxy-aware recursion and ABI-argument-tree fan-out.

use std::collections::HashMap;

use futures::future::{BoxFuture, FutureExt};
use tiny_keccak::{Hasher, Keccak};

use govtrace_core::{AddressMetadata, ArgValue, ChainId, DataSource, MaybeSourced};
use govtrace_explorer::ExplorerClient;
use govtrace_proxy::{EvmRpc, ProxyResolver};

use crate::curated::{BridgeArgSplit, CuratedMaps};
use crate::error::MetadataError;
use crate::reconcile::{resolve_contract_name, resolve_longest, Candidate};
use crate::static_index::StaticDeploymentIndex;

fn keccak256(preimage: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut out = [0u8; 32];
    hasher.update(preimage);
    hasher.finalize(&mut out);
    out
}

fn selector4(signature: &str) -> [u8; 4] {
    let digest = keccak256(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

fn return_to_address(data: &[u8]) -> Option<String> {
    if data.len() < 32 {
        return None;
    }
    let word = &data[data.len() - 32..];
    let (prefix, addr) = word.split_at(12);
    if addr.iter().all(|b| *b == 0) {
        return None;
    }
    let _ = prefix;
    Some(format!("0x{}", hex::encode(addr)))
}

/// Decodes an ERC-20 `symbol()`/`name()` return, which may be a
/// right-padded `bytes32` (legacy tokens) or a dynamic ABI string.
fn decode_return_string(data: &[u8]) -> Option<String> {
    if data.len() == 32 {
        let trimmed: Vec<u8> = data.iter().copied().take_while(|b| *b != 0).collect();
        return (!trimmed.is_empty()).then(|| String::from_utf8_lossy(&trimmed).into_owned());
    }
    if data.len() < 64 {
        return None;
    }
    let len = u64::from_be_bytes(data[56..64].try_into().ok()?) as usize;
    let bytes = data.get(64..64 + len)?;
    Some(String::from_utf8_lossy(bytes).into_owned())
}

fn decode_return_u8(data: &[u8]) -> Option<u8> {
    data.last().copied()
}

pub struct MetadataResolver<'a> {
    pub explorer: &'a ExplorerClient,
    pub rpc: &'a dyn EvmRpc,
    pub static_index: &'a StaticDeploymentIndex,
    pub curated: &'a CuratedMaps,
    pub track_sources: bool,
}

impl<'a> MetadataResolver<'a> {
    pub fn new(
        explorer: &'a ExplorerClient,
        rpc: &'a dyn EvmRpc,
        static_index: &'a StaticDeploymentIndex,
        curated: &'a CuratedMaps,
        track_sources: bool,
    ) -> Self {
        MetadataResolver { explorer, rpc, static_index, curated, track_sources }
    }

    /// Builds `AddressMetadata` for one address, recursing into the
    /// implementation's metadata when the address is a proxy.
    pub fn resolve(&self, chain_id: ChainId, address: &str) -> BoxFuture<'_, Result<AddressMetadata, MetadataError>> {
        let address = address.to_string();
        async move {
            let mut metadata = AddressMetadata::default();
            let static_entry = self.static_index.get(chain_id.0, &address).cloned();

            let mut name_candidates = Vec::new();
            if let Some(name) = static_entry.as_ref().and_then(|e| e.contract_name.clone()) {
                name_candidates.push(Candidate {
                    value: name,
                    source: DataSource::StaticMetadata { path: "deployments.yaml".into(), key: address.clone(), market: None },
                });
            }
            if let Some(name) = self.curated.name(chain_id.0, &address) {
                name_candidates.push(Candidate {
                    value: name.to_string(),
                    source: DataSource::Hardcoded { location: "curated_names".into(), reason: "bundled contract name map".into() },
                });
            }
            match self.explorer.fetch_contract_name(chain_id, &address).await {
                Ok(Some(name)) => name_candidates.push(Candidate {
                    value: name,
                    source: DataSource::EtherscanSourcecode { chain_id: chain_id.0, address: address.clone(), verified: true },
                }),
                Ok(None) => {}
                Err(err) => tracing::debug!(%err, address, "explorer contract name lookup failed"),
            }

            let tag_info = match self.explorer.fetch_address_tag_info(chain_id, &address).await {
                Ok(info) => info,
                Err(err) => {
                    tracing::debug!(%err, address, "explorer tag info lookup failed");
                    None
                }
            };
            if let Some(tag) = &tag_info {
                if let Some(name_tag) = &tag.name_tag {
                    name_candidates.push(Candidate {
                        value: name_tag.clone(),
                        source: DataSource::EtherscanTag { chain_id: chain_id.0, address: address.clone(), kind: "nameTag".into() },
                    });
                }
                for attribute in &tag.other_attributes {
                    if let Some(("CN", value)) = crate::reconcile::parse_tag_attribute(attribute) {
                        name_candidates.push(Candidate {
                            value: value.to_string(),
                            source: DataSource::EtherscanTag { chain_id: chain_id.0, address: address.clone(), kind: "CN".into() },
                        });
                    }
                }
                metadata.labels = tag.labels.clone();
                metadata.etherscan_label = tag.name_tag.clone().or_else(|| tag.labels.first().cloned());
                metadata.url = tag.url.clone();
                metadata.description = tag.short_description.clone();
                for attribute in &tag.other_attributes {
                    if let Some(("ENS", value)) = crate::reconcile::parse_tag_attribute(attribute) {
                        metadata.ens_name = Some(value.to_string());
                    }
                }
            }

            if let Some(resolved) = resolve_contract_name(&name_candidates) {
                metadata.contract_name = Some(MaybeSourced::new(resolved.value, resolved.source, self.track_sources));
            }

            let mut symbol_candidates = Vec::new();
            match self.explorer.fetch_token_page(chain_id, &address).await {
                Ok(page) => {
                    if let Some(symbol) = page.symbol.clone() {
                        symbol_candidates.push(Candidate {
                            value: symbol,
                            source: DataSource::EtherscanTag { chain_id: chain_id.0, address: address.clone(), kind: "tokenPage".into() },
                        });
                    }
                    if let Some(name) = page.name.clone() {
                        metadata.token_name = Some(MaybeSourced::new(
                            name,
                            DataSource::EtherscanTag { chain_id: chain_id.0, address: address.clone(), kind: "tokenPage".into() },
                            self.track_sources,
                        ));
                    }
                    if let Some(decimals) = page.decimals {
                        metadata.token_decimals = Some(decimals);
                    }
                }
                Err(err) => tracing::debug!(%err, address, "token page lookup failed"),
            }

            if let Ok(Some(symbol)) = self.fetch_onchain_symbol(&address).await {
                symbol_candidates.push(Candidate {
                    value: symbol,
                    source: DataSource::OnChain {
                        chain_id: chain_id.0,
                        address: address.clone(),
                        method: "symbol()".into(),
                        args: Vec::new(),
                        cast_command: None,
                    },
                });
            }
            if let Some(entry) = self.curated.token(chain_id.0, &address) {
                symbol_candidates.push(Candidate {
                    value: entry.symbol.clone(),
                    source: DataSource::StaticMetadata { path: "curated_tokens.yaml".into(), key: address.clone(), market: None },
                });
            }
            if let Some(symbol) = static_entry.as_ref().and_then(|e| e.token_symbol.clone()) {
                symbol_candidates.push(Candidate {
                    value: symbol,
                    source: DataSource::StaticMetadata { path: "deployments.yaml".into(), key: address.clone(), market: None },
                });
            }
            if let Some(tag) = &tag_info {
                for attribute in &tag.other_attributes {
                    if let Some(("TS", value)) = crate::reconcile::parse_tag_attribute(attribute) {
                        symbol_candidates.push(Candidate {
                            value: value.to_string(),
                            source: DataSource::EtherscanTag { chain_id: chain_id.0, address: address.clone(), kind: "TS".into() },
                        });
                    }
                }
            }
            if let Some(resolved) = resolve_longest(&symbol_candidates) {
                metadata.token_symbol = Some(MaybeSourced::new(resolved.value, resolved.source, self.track_sources));
            }

            if static_entry.as_ref().map(|e| e.is_market_proxy).unwrap_or(false) {
                if let Ok(Some(base_token)) = self.fetch_onchain_address(&address, "baseToken()").await {
                    if let Ok(Some(symbol)) = self.fetch_onchain_symbol(&base_token).await {
                        metadata.base_token_symbol = Some(symbol);
                    }
                    if let Ok(Some(decimals)) = self.fetch_onchain_decimals(&base_token).await {
                        metadata.base_token_decimals = Some(decimals);
                    }
                }
            }

            if let Some(detection) = ProxyResolver::resolve(self.rpc, &address).await {
                let implementation_metadata = self.resolve(chain_id, &detection.target).await?;
                metadata.implementation = Some(Box::new(implementation_metadata));
            }

            Ok(metadata)
        }
        .boxed()
    }

    async fn fetch_onchain_symbol(&self, address: &str) -> Result<Option<String>, MetadataError> {
        let data = self.rpc.call(address, &selector4("symbol()")).await?;
        Ok(decode_return_string(&data))
    }

    async fn fetch_onchain_decimals(&self, address: &str) -> Result<Option<u8>, MetadataError> {
        let data = self.rpc.call(address, &selector4("decimals()")).await?;
        Ok(decode_return_u8(&data))
    }

    async fn fetch_onchain_address(&self, address: &str, signature: &str) -> Result<Option<String>, MetadataError> {
        let data = self.rpc.call(address, &selector4(signature)).await?;
        Ok(return_to_address(&data))
    }

    /// Walks a decoded argument tree, dedupes every address leaf, and
    /// resolves each concurrently.
    pub async fn collect_and_resolve(
        &self,
        chain_id: ChainId,
        args: &[ArgValue],
    ) -> Result<HashMap<String, AddressMetadata>, MetadataError> {
        let mut addresses = Vec::new();
        for arg in args {
            arg.collect_addresses(&mut addresses);
        }
        addresses.sort();
        addresses.dedup();

        let futures = addresses.iter().map(|address| self.resolve(chain_id, address));
        let resolved = futures::future::join_all(futures).await;

        let mut out = HashMap::new();
        for (address, metadata) in addresses.into_iter().zip(resolved) {
            out.insert(address, metadata?);
        }
        Ok(out)
    }

    /// Resolves a bridge gateway call's address leaves split between
    /// the source chain and the catalogued destination chain.
    pub async fn resolve_bridge_fanout(
        &self,
        chain_id: ChainId,
        args: &[ArgValue],
        split: &BridgeArgSplit,
    ) -> Result<(HashMap<String, AddressMetadata>, HashMap<String, AddressMetadata>), MetadataError> {
        let source_args: Vec<ArgValue> = split.source_chain_arg_indices.iter().filter_map(|i| args.get(*i).cloned()).collect();
        let destination_args: Vec<ArgValue> =
            split.destination_chain_arg_indices.iter().filter_map(|i| args.get(*i).cloned()).collect();

        let source_metadata = self.collect_and_resolve(chain_id, &source_args).await?;
        let destination_metadata = self.collect_and_resolve(ChainId(split.destination_chain_id), &destination_args).await?;
        Ok((source_metadata, destination_metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_return_string_handles_bytes32_and_dynamic() {
        let mut bytes32 = [0u8; 32];
        bytes32[..4].copy_from_slice(b"USDC");
        assert_eq!(decode_return_string(&bytes32).unwrap(), "USDC");

        let mut dynamic = vec![0u8; 32];
        dynamic[31] = 0x20;
        dynamic.extend(vec![0u8; 31]);
        dynamic.push(4);
        dynamic.extend_from_slice(b"USDC");
        dynamic.extend(vec![0u8; 28]);
        assert_eq!(decode_return_string(&dynamic).unwrap(), "USDC");
    }

    #[test]
    fn decode_return_u8_takes_last_byte() {
        let mut data = [0u8; 32];
        data[31] = 6;
        assert_eq!(decode_return_u8(&data), Some(6));
    }

    #[test]
    fn return_to_address_rejects_zero_word() {
        let zero = [0u8; 32];
        assert!(return_to_address(&zero).is_none());
    }
}
