//! The three shapes `decodeProposal` accepts: a numeric proposal id
//! (resolved via a governor view call), a JSON document, or a raw
//! `propose(...)` calldata blob.

use async_trait::async_trait;

use govtrace_codec::Codec;
use govtrace_core::{ArgValue, DecoderError, ProposalDetails};

const PROPOSE_ABI: &str = r#"[{
    "name": "propose",
    "type": "function",
    "inputs": [
        {"name": "targets", "type": "address[]"},
        {"name": "values", "type": "uint256[]"},
        {"name": "calldatas", "type": "bytes[]"},
        {"name": "description", "type": "string"}
    ],
    "outputs": [{"name": "", "type": "uint256"}],
    "stateMutability": "nonpayable"
}]"#;

pub enum DecoderInput {
    ProposalId(String),
    Json(ProposalDetails),
    RawProposeCalldata(Vec<u8>),
}

#[derive(serde::Deserialize)]
struct WrappedProposalJson {
    details: ProposalDetails,
    #[allow(dead_code)]
    #[serde(default)]
    metadata: Option<serde_json::Value>,
}

/// Accepts either the bare `{ targets, values, calldatas, descriptionHash }`
/// shape or the same document wrapped as `{ details, metadata }`; `metadata`
/// is accepted but not interpreted by the decoder.
pub fn parse_proposal_json(raw: &str) -> Result<ProposalDetails, DecoderError> {
    if let Ok(wrapped) = serde_json::from_str::<WrappedProposalJson>(raw) {
        return Ok(wrapped.details);
    }
    serde_json::from_str::<ProposalDetails>(raw).map_err(DecoderError::from)
}

/// Reads a proposal's action list from chain, given its numeric id.
/// `None` models the governor call reverting (`proposalDetails` not
/// found) — the engine maps that to `DecoderError::ChainRevert`.
#[async_trait]
pub trait GovernorView: Send + Sync {
    async fn proposal_details(&self, proposal_id: &str) -> Option<ProposalDetails>;
}

fn as_array(value: &ArgValue) -> Option<&[ArgValue]> {
    match value {
        ArgValue::Array(items) => Some(items),
        _ => None,
    }
}

/// Parses a raw `propose(address[],uint256[],bytes[],string)` calldata
/// blob into a `ProposalDetails`, ignoring the trailing description.
pub fn parse_propose_calldata(calldata: &[u8]) -> Result<ProposalDetails, DecoderError> {
    let codec = Codec::from_abi_json(PROPOSE_ABI)
        .map_err(|e| DecoderError::input(format!("invalid propose() ABI: {e}")))?;
    let decoded = codec
        .decode_call(calldata, false)
        .ok_or_else(|| DecoderError::input("calldata does not match propose(address[],uint256[],bytes[],string)"))?;

    let targets = decoded
        .arg("targets")
        .and_then(as_array)
        .ok_or_else(|| DecoderError::input("propose() missing targets"))?
        .iter()
        .map(|v| match v {
            ArgValue::Address(a) => Ok(a.clone()),
            _ => Err(DecoderError::input("targets[] contains a non-address element")),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let values = decoded
        .arg("values")
        .and_then(as_array)
        .ok_or_else(|| DecoderError::input("propose() missing values"))?
        .iter()
        .map(|v| match v {
            ArgValue::Uint(s) | ArgValue::Int(s) => Ok(s.clone()),
            _ => Err(DecoderError::input("values[] contains a non-integer element")),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let calldatas = decoded
        .arg("calldatas")
        .and_then(as_array)
        .ok_or_else(|| DecoderError::input("propose() missing calldatas"))?
        .iter()
        .map(|v| match v {
            ArgValue::Bytes(s) => Ok(s.clone()),
            _ => Err(DecoderError::input("calldatas[] contains a non-bytes element")),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let details = ProposalDetails { targets, values, calldatas, description_hash: None };
    details.validate().map_err(DecoderError::input)?;
    Ok(details)
}

#[cfg(test)]
mod tests {
    use super::*;
    use govtrace_codec::Codec as EncodeCodec;

    #[test]
    fn parses_a_round_tripped_propose_call() {
        let codec = EncodeCodec::from_abi_json(PROPOSE_ABI).unwrap();
        let calldata = codec
            .encode_call(
                "propose",
                &[
                    ArgValue::Array(vec![ArgValue::Address("0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045".into())]),
                    ArgValue::Array(vec![ArgValue::Uint("0".into())]),
                    ArgValue::Array(vec![ArgValue::Bytes("0xa9059cbb".into())]),
                    ArgValue::Str("a proposal".into()),
                ],
            )
            .unwrap();

        let details = parse_propose_calldata(&calldata).unwrap();
        assert_eq!(details.targets.len(), 1);
        assert_eq!(details.calldatas[0], "0xa9059cbb");
    }

    #[test]
    fn rejects_calldata_for_a_different_function() {
        let err = parse_propose_calldata(&[0xde, 0xad, 0xbe, 0xef]).unwrap_err();
        assert!(matches!(err, DecoderError::Input(_)));
    }

    #[test]
    fn parses_a_bare_proposal_document() {
        let raw = r#"{"targets":["0xabc"],"values":["0"],"calldatas":["0x"],"descriptionHash":null}"#;
        let details = parse_proposal_json(raw).unwrap();
        assert_eq!(details.targets, vec!["0xabc"]);
    }

    #[test]
    fn parses_a_wrapped_proposal_document() {
        let raw = r#"{
            "details": {"targets":["0xabc"],"values":["0"],"calldatas":["0x"],"descriptionHash":null},
            "metadata": {"submittedBy": "someone"}
        }"#;
        let details = parse_proposal_json(raw).unwrap();
        assert_eq!(details.targets, vec!["0xabc"]);
    }
}
