//! The recursive call-tree builder: resolves each node's ABI (proxy-aware),
//! decodes its calldata, enriches it with address metadata, runs the
//! handler registry, and recurses into any children the handlers emit.

use futures::future::{BoxFuture, FutureExt};
use tracing::Instrument;

use govtrace_core::{
    CallEdgeNode, CallNode, ChainId, DecoderConfig, DecoderError, Proposal, ProposalDetails,
};
use govtrace_explorer::ExplorerClient;
use govtrace_handlers::{HandlerContext, HandlerRegistry};
use govtrace_metadata::{CuratedMaps, MetadataResolver, StaticDeploymentIndex};
use govtrace_proxy::{EvmRpc, ProxyResolver};

use crate::abi_resolution::{resolve_abi, LocalAbiIndex};
use crate::input::{parse_propose_calldata, DecoderInput, GovernorView};

/// Per-chain RPC lookup, injected so the engine never hardcodes a
/// transport. `None` models "no RPC configured for this chain" — proxy
/// detection and on-chain metadata probes are skipped, not failed.
pub trait RpcProvider: Send + Sync {
    fn rpc_for(&self, chain_id: ChainId) -> Option<&dyn EvmRpc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    pub track_sources: bool,
}

pub struct Decoder<'a> {
    pub config: &'a DecoderConfig,
    pub explorer: &'a ExplorerClient,
    pub local_abi: &'a LocalAbiIndex,
    pub rpc: &'a dyn RpcProvider,
    pub static_index: &'a StaticDeploymentIndex,
    pub curated: &'a CuratedMaps,
    pub handlers: &'a HandlerRegistry,
}

fn decode_hex(value: &str) -> Result<Vec<u8>, DecoderError> {
    hex::decode(value.strip_prefix("0x").unwrap_or(value)).map_err(|e| DecoderError::input(e.to_string()))
}

impl<'a> Decoder<'a> {
    /// Resolves whichever input shape the caller provided into a
    /// `ProposalDetails`, then decodes it.
    #[tracing::instrument(skip_all)]
    pub async fn decode(
        &self,
        input: DecoderInput,
        governor_view: Option<&dyn GovernorView>,
        options: DecodeOptions,
    ) -> Result<Proposal, DecoderError> {
        let (governor, proposal_id, details) = match input {
            DecoderInput::Json(details) => (None, None, details),
            DecoderInput::RawProposeCalldata(calldata) => (None, None, parse_propose_calldata(&calldata)?),
            DecoderInput::ProposalId(id) => {
                let view = governor_view
                    .ok_or_else(|| DecoderError::input("a proposal id requires a governor view"))?;
                let details = view
                    .proposal_details(&id)
                    .await
                    .ok_or_else(|| DecoderError::chain_revert(id.clone()))?;
                (None, Some(id), details)
            }
        };
        self.decode_proposal(details, governor, proposal_id, options).await
    }

    #[tracing::instrument(skip_all, fields(actions = details.targets.len()))]
    pub async fn decode_proposal(
        &self,
        details: ProposalDetails,
        governor: Option<String>,
        proposal_id: Option<String>,
        options: DecodeOptions,
    ) -> Result<Proposal, DecoderError> {
        details.validate().map_err(DecoderError::input)?;
        tracing::info!(actions = details.targets.len(), "decoding proposal");

        let mut calls = Vec::with_capacity(details.targets.len());
        for i in 0..details.targets.len() {
            let raw = decode_hex(&details.calldatas[i])?;
            let node = self
                .decode_node(ChainId::MAINNET, details.targets[i].clone(), details.values[i].clone(), raw, options)
                .await;
            calls.push(node);
        }

        let mut proposal =
            Proposal { governor, proposal_id, description_hash: details.description_hash.clone(), calls };
        refine_market_labels(&mut proposal.calls, self.static_index);
        Ok(proposal)
    }

    fn decode_node(
        &self,
        chain_id: ChainId,
        target: String,
        value_wei: String,
        raw_calldata: Vec<u8>,
        options: DecodeOptions,
    ) -> BoxFuture<'_, CallNode> {
        let span = tracing::info_span!("decode_node", chain_id = chain_id.0, %target);
        async move {
            let mut node =
                CallNode::new(chain_id, target.clone(), value_wei.clone(), format!("0x{}", hex::encode(&raw_calldata)));

            let rpc = self.rpc.rpc_for(chain_id);

            let proxy_detection = match rpc {
                Some(rpc) => ProxyResolver::resolve(rpc, &target).await,
                None => None,
            };
            let abi_address = proxy_detection.as_ref().map(|d| d.target.clone()).unwrap_or_else(|| target.clone());
            if let Some(detection) = &proxy_detection {
                node.implementation = Some(detection.target.clone());
            }

            if let Some(rpc) = rpc {
                let metadata_resolver = MetadataResolver::new(self.explorer, rpc, self.static_index, self.curated, options.track_sources);
                match metadata_resolver.resolve(chain_id, &target).await {
                    Ok(metadata) => {
                        node.target_contract_name = metadata.contract_name.as_ref().map(|m| m.value().clone());
                        node.implementation_contract_name = metadata
                            .implementation
                            .as_ref()
                            .and_then(|i| i.contract_name.as_ref())
                            .map(|m| m.value().clone());
                        node.address_metadata = Some(metadata);
                    }
                    Err(err) => node.push_note(format!("metadata resolution failed: {err}")),
                }
            } else if self.config.chain(chain_id).is_some() {
                node.push_note("RPC-dependent probes are unavailable on this chain (rpc call failed)");
            } else {
                node.push_note("RPC-dependent probes are unavailable on this chain (no rpcUrl configured)");
            }

            let resolved_abi = resolve_abi(self.explorer, self.local_abi, chain_id, &abi_address).await;

            let decoded = match &resolved_abi {
                Some(resolved) => resolved.codec.decode_call(&raw_calldata, options.track_sources),
                None => None,
            };

            if raw_calldata.is_empty() {
                node.push_note("empty calldata (possible ETH transfer or fallback)");
            } else if raw_calldata.len() >= 4 && raw_calldata[..4] == [0, 0, 0, 0] {
                node.push_note("zero selector; cannot decode");
            } else if let Some(mut decoded) = decoded {
                if matches!(resolved_abi.as_ref().map(|r| &r.source), Some(govtrace_core::DataSource::LocalABI { .. })) {
                    node.push_note("decoded against a bundled ABI, not an explorer-verified one");
                }
                if let Some(rpc) = rpc {
                    let metadata_resolver =
                        MetadataResolver::new(self.explorer, rpc, self.static_index, self.curated, options.track_sources);
                    let split = self.curated.bridge_split(&target, &decoded.name);
                    let resolved = match split {
                        Some(split) => {
                            let (source, destination) =
                                metadata_resolver.resolve_bridge_fanout(chain_id, &decoded.args, split).await.unwrap_or_default();
                            source.into_iter().chain(destination).collect()
                        }
                        None => metadata_resolver.collect_and_resolve(chain_id, &decoded.args).await.unwrap_or_default(),
                    };
                    if !resolved.is_empty() {
                        decoded.address_metadata = Some(resolved);
                    }
                }
                node.decoded = Some(decoded);
            } else if resolved_abi.is_some() {
                node.push_note("unknown function selector");
            } else {
                node.push_note("ABI not available (unverified or failed fetch); cannot decode selector");
            }

            let ctx = HandlerContext {
                chain_id,
                target: target.clone(),
                value_wei,
                raw_calldata,
                parsed: node.decoded.clone(),
                track_sources: options.track_sources,
            };
            let registry_output = self.handlers.apply(&ctx).await;
            node.insights.extend(registry_output.insights);
            node.notes.extend(registry_output.notes);

            for child in registry_output.children {
                let child_node = self
                    .decode_node(child.chain_id, child.target, child.value_wei, child.raw_calldata, options)
                    .await;
                node.children.push(CallEdgeNode { edge: child.edge, node: child_node });
            }

            node
        }
        .instrument(span)
        .boxed()
    }
}

/// Walks the finished tree and overwrites `targetContractName` for nodes
/// whose decoded function carries a `cometProxy` argument, using the
/// market-specific label from the static deployment index rather than
/// the shared Configurator's own name.
fn refine_market_labels(nodes: &mut [CallNode], static_index: &StaticDeploymentIndex) {
    for node in nodes.iter_mut() {
        if let Some(decoded) = &node.decoded {
            let comet = decoded
                .arg("cometProxy")
                .and_then(|v| v.as_address())
                .or_else(|| decoded.args.first().and_then(|v| v.as_address()));
            if let Some(comet) = comet {
                if let Some(entry) = static_index.get(node.chain_id.0, comet) {
                    if entry.is_market_proxy {
                        if let Some(name) = &entry.contract_name {
                            node.target_contract_name = Some(name.clone());
                        }
                    }
                }
            }
        }
        for edge in node.children.iter_mut() {
            refine_market_labels(std::slice::from_mut(&mut edge.node), static_index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use govtrace_core::{ArgValue, DecodedFunction, ParamInfo};
    use govtrace_metadata::StaticDeploymentEntry;

    fn tuple_param(name: &str) -> ParamInfo {
        ParamInfo { name: Some(name.into()), base_type: "address".into(), ty: "address".into(), components: None, array_children: None }
    }

    #[test]
    fn overwrites_target_name_with_the_market_specific_label() {
        let mut static_index = StaticDeploymentIndex::new();
        static_index.insert(
            1,
            "0xComet",
            StaticDeploymentEntry { contract_name: Some("Comet USDC".into()), token_symbol: None, is_market_proxy: true },
        );

        let mut node = CallNode::new(ChainId::MAINNET, "0xConfigurator".into(), "0".into(), "0x".into());
        node.target_contract_name = Some("Configurator".into());
        node.decoded = Some(DecodedFunction {
            name: "setBaseTrackingSupplySpeed".into(),
            signature: "setBaseTrackingSupplySpeed(address,uint64)".into(),
            selector: "0xdead".into(),
            args: vec![ArgValue::Address("0xComet".into()), ArgValue::Uint("10".into())],
            arg_types: vec!["address".into(), "uint64".into()],
            arg_param_info: vec![tuple_param("cometProxy"), tuple_param("newSpeed")],
            arg_sources: None,
            address_metadata: None,
        });

        let mut calls = vec![node];
        refine_market_labels(&mut calls, &static_index);
        assert_eq!(calls[0].target_contract_name.as_deref(), Some("Comet USDC"));
    }

    #[test]
    fn leaves_the_name_alone_when_comet_is_not_a_market_proxy() {
        let static_index = StaticDeploymentIndex::new();
        let mut node = CallNode::new(ChainId::MAINNET, "0xConfigurator".into(), "0".into(), "0x".into());
        node.target_contract_name = Some("Configurator".into());
        node.decoded = Some(DecodedFunction {
            name: "setBaseTrackingSupplySpeed".into(),
            signature: "setBaseTrackingSupplySpeed(address,uint64)".into(),
            selector: "0xdead".into(),
            args: vec![ArgValue::Address("0xComet".into()), ArgValue::Uint("10".into())],
            arg_types: vec!["address".into(), "uint64".into()],
            arg_param_info: vec![tuple_param("cometProxy"), tuple_param("newSpeed")],
            arg_sources: None,
            address_metadata: None,
        });

        let mut calls = vec![node];
        refine_market_labels(&mut calls, &static_index);
        assert_eq!(calls[0].target_contract_name.as_deref(), Some("Configurator"));
    }
}
