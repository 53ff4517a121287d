//! The proposal and call-tree data model: the shapes every component
//! reads from or writes into as it walks a proposal.

use crate::chain::ChainId;
use crate::types::{ArgValue, DataSource, MaybeSourced, ParamInfo};
use serde::{Deserialize, Serialize};

/// The raw action list a proposal carries, before any decoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalDetails {
    pub targets: Vec<String>,
    pub values: Vec<String>,
    pub calldatas: Vec<String>,
    #[serde(rename = "descriptionHash")]
    pub description_hash: Option<String>,
}

impl ProposalDetails {
    /// `len(targets) == len(values) == len(calldatas)` — the only
    /// structural invariant an input must satisfy before decoding starts.
    pub fn validate(&self) -> Result<(), String> {
        if self.targets.len() != self.values.len() || self.targets.len() != self.calldatas.len() {
            return Err(format!(
                "targets/values/calldatas length mismatch: {} / {} / {}",
                self.targets.len(),
                self.values.len(),
                self.calldatas.len()
            ));
        }
        Ok(())
    }
}

/// How a child node relates to its parent. Purely descriptive; never
/// interpreted by the decoder itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CallEdge {
    Multicall { index: usize },
    Bridge { label: String },
}

/// One recursive ABI parameter descriptor plus its calldata provenance,
/// when source tracking is enabled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodedFunction {
    pub name: String,
    pub signature: String,
    pub selector: String,
    pub args: Vec<ArgValue>,
    #[serde(rename = "argTypes")]
    pub arg_types: Vec<String>,
    #[serde(rename = "argParamInfo")]
    pub arg_param_info: Vec<ParamInfo>,
    #[serde(rename = "argSources", skip_serializing_if = "Option::is_none")]
    pub arg_sources: Option<Vec<DataSource>>,
    /// Per-argument-address metadata, keyed by the address as it appears
    /// in `args`. Populated by the engine's post-decode fan-out over the
    /// ABI parameter tree, not by the codec itself.
    #[serde(rename = "addressMetadata", skip_serializing_if = "Option::is_none")]
    pub address_metadata: Option<std::collections::HashMap<String, AddressMetadata>>,
}

impl DecodedFunction {
    /// Looks up a named top-level argument, mirroring the teacher's
    /// input-lookup-by-name convenience on `DecodedCall`.
    pub fn arg(&self, name: &str) -> Option<&ArgValue> {
        self.arg_param_info
            .iter()
            .position(|p| p.name.as_deref() == Some(name))
            .and_then(|i| self.args.get(i))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CallInsightEntry {
    pub label: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub warning: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallInsight {
    pub title: String,
    pub entries: Vec<CallInsightEntry>,
    #[serde(rename = "handlerSource", skip_serializing_if = "Option::is_none")]
    pub handler_source: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AddressMetadata {
    #[serde(rename = "contractName", skip_serializing_if = "Option::is_none")]
    pub contract_name: Option<MaybeSourced<String>>,
    #[serde(rename = "etherscanLabel", skip_serializing_if = "Option::is_none")]
    pub etherscan_label: Option<String>,
    #[serde(rename = "tokenSymbol", skip_serializing_if = "Option::is_none")]
    pub token_symbol: Option<MaybeSourced<String>>,
    #[serde(rename = "tokenName", skip_serializing_if = "Option::is_none")]
    pub token_name: Option<MaybeSourced<String>>,
    #[serde(rename = "tokenDecimals", skip_serializing_if = "Option::is_none")]
    pub token_decimals: Option<u8>,
    #[serde(rename = "baseTokenSymbol", skip_serializing_if = "Option::is_none")]
    pub base_token_symbol: Option<String>,
    #[serde(rename = "baseTokenDecimals", skip_serializing_if = "Option::is_none")]
    pub base_token_decimals: Option<u8>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(rename = "ensName", skip_serializing_if = "Option::is_none")]
    pub ens_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub notes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implementation: Option<Box<AddressMetadata>>,
}

/// One node in the decoded call tree: one action or one nested call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallNode {
    #[serde(rename = "chainId")]
    pub chain_id: ChainId,
    pub target: String,
    #[serde(rename = "targetContractName", skip_serializing_if = "Option::is_none")]
    pub target_contract_name: Option<String>,
    #[serde(rename = "valueWei")]
    pub value_wei: String,
    #[serde(rename = "rawCalldata")]
    pub raw_calldata: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decoded: Option<DecodedFunction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implementation: Option<String>,
    #[serde(
        rename = "implementationContractName",
        skip_serializing_if = "Option::is_none"
    )]
    pub implementation_contract_name: Option<String>,
    #[serde(rename = "addressMetadata", skip_serializing_if = "Option::is_none")]
    pub address_metadata: Option<AddressMetadata>,
    #[serde(default)]
    pub insights: Vec<CallInsight>,
    #[serde(default)]
    pub children: Vec<CallEdgeNode>,
    #[serde(default)]
    pub notes: Vec<String>,
}

impl CallNode {
    pub fn new(chain_id: ChainId, target: String, value_wei: String, raw_calldata: String) -> Self {
        CallNode {
            chain_id,
            target,
            target_contract_name: None,
            value_wei,
            raw_calldata,
            decoded: None,
            implementation: None,
            implementation_contract_name: None,
            address_metadata: None,
            insights: Vec::new(),
            children: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn push_note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallEdgeNode {
    pub edge: CallEdge,
    pub node: CallNode,
}

/// A request for a child node to be decoded, emitted by a handler.
#[derive(Debug, Clone)]
pub struct ChildRequest {
    pub edge: CallEdge,
    pub chain_id: ChainId,
    pub target: String,
    pub value_wei: String,
    pub raw_calldata: Vec<u8>,
}

/// Root record for one decode. Created once, never mutated after emission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    pub governor: Option<String>,
    #[serde(rename = "proposalId")]
    pub proposal_id: Option<String>,
    #[serde(rename = "descriptionHash")]
    pub description_hash: Option<String>,
    pub calls: Vec<CallNode>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proposal_details_validates_length_invariant() {
        let details = ProposalDetails {
            targets: vec!["0xabc".into()],
            values: vec!["0".into(), "1".into()],
            calldatas: vec!["0x".into()],
            description_hash: None,
        };
        assert!(details.validate().is_err());
    }

    #[test]
    fn call_node_serializes_omitting_absent_optionals() {
        let node = CallNode::new(ChainId::MAINNET, "0xabc".into(), "0".into(), "0x".into());
        let json = serde_json::to_value(&node).unwrap();
        assert!(json.get("decoded").is_none());
        assert!(json.get("implementation").is_none());
    }

    #[test]
    fn decoded_function_arg_lookup_by_name() {
        let func = DecodedFunction {
            name: "transfer".into(),
            signature: "transfer(address,uint256)".into(),
            selector: "0xa9059cbb".into(),
            args: vec![
                ArgValue::Address("0x1111111111111111111111111111111111111111".into()),
                ArgValue::Uint("1000000".into()),
            ],
            arg_types: vec!["address".into(), "uint256".into()],
            arg_param_info: vec![
                ParamInfo {
                    name: Some("to".into()),
                    base_type: "address".into(),
                    ty: "address".into(),
                    components: None,
                    array_children: None,
                },
                ParamInfo {
                    name: Some("amount".into()),
                    base_type: "uint".into(),
                    ty: "uint256".into(),
                    components: None,
                    array_children: None,
                },
            ],
            arg_sources: None,
            address_metadata: None,
        };
        assert_eq!(func.arg("amount"), Some(&ArgValue::Uint("1000000".into())));
        assert_eq!(func.arg("missing"), None);
    }
}
