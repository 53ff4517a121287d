//! A `GovernorView` backed by a live Governor Bravo-style contract:
//! `getActions(uint256)` returns targets/values/signatures/calldatas
//! separately, so the full calldata has to be reassembled by
//! selector-prefixing whenever a signature string is present — the same
//! reconstruction the governor's own `execute()` does on-chain.

use async_trait::async_trait;
use alloy_dyn_abi::{DynSolType, DynSolValue};

use govtrace_codec::selector;
use govtrace_core::ProposalDetails;
use govtrace_decoder::GovernorView;
use govtrace_proxy::EvmRpc;

fn encode_get_actions(proposal_id: &str) -> Option<Vec<u8>> {
    let id = proposal_id.parse::<u128>().ok()?;
    let mut out = selector("getActions(uint256)").to_vec();
    out.extend_from_slice(&DynSolValue::Uint(alloy_primitives::U256::from(id), 256).abi_encode());
    Some(out)
}

fn reassemble_calldata(signature: &str, raw: &[u8]) -> Vec<u8> {
    if signature.is_empty() {
        return raw.to_vec();
    }
    let mut out = selector(signature).to_vec();
    out.extend_from_slice(raw);
    out
}

pub struct RpcGovernorView<'a> {
    pub rpc: &'a dyn EvmRpc,
    pub governor: String,
}

#[async_trait]
impl GovernorView for RpcGovernorView<'_> {
    async fn proposal_details(&self, proposal_id: &str) -> Option<ProposalDetails> {
        let calldata = encode_get_actions(proposal_id)?;
        let returned = self.rpc.call(&self.governor, &calldata).await.ok()?;

        let ty = DynSolType::Tuple(vec![
            DynSolType::Array(Box::new(DynSolType::Address)),
            DynSolType::Array(Box::new(DynSolType::Uint(256))),
            DynSolType::Array(Box::new(DynSolType::String)),
            DynSolType::Array(Box::new(DynSolType::Bytes)),
        ]);
        let values = match ty.abi_decode(&returned).ok()? {
            DynSolValue::Tuple(values) => values,
            _ => return None,
        };
        if values.len() != 4 {
            return None;
        }

        let targets = as_array(&values[0])?
            .iter()
            .map(|v| match v {
                DynSolValue::Address(a) => Some(a.to_string()),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()?;
        let amounts = as_array(&values[1])?
            .iter()
            .map(|v| match v {
                DynSolValue::Uint(n, _) => Some(n.to_string()),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()?;
        let signatures = as_array(&values[2])?
            .iter()
            .map(|v| match v {
                DynSolValue::String(s) => Some(s.clone()),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()?;
        let raw_calldatas = as_array(&values[3])?
            .iter()
            .map(|v| match v {
                DynSolValue::Bytes(b) => Some(b.clone()),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()?;

        if targets.len() != signatures.len() || targets.len() != raw_calldatas.len() {
            return None;
        }

        let calldatas = signatures
            .iter()
            .zip(raw_calldatas.iter())
            .map(|(sig, raw)| format!("0x{}", hex::encode(reassemble_calldata(sig, raw))))
            .collect();

        Some(ProposalDetails {
            targets,
            values: amounts,
            calldatas,
            description_hash: None,
        })
    }
}

fn as_array(value: &DynSolValue) -> Option<&[DynSolValue]> {
    match value {
        DynSolValue::Array(items) => Some(items),
        _ => None,
    }
}
