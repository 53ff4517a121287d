//! ABI selector derivation, calldata decode, and probe-call encode for
//! the EVM calling convention.

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_json_abi::{Function, JsonAbi};
use alloy_primitives::U256;
use govtrace_core::{ArgValue, DataSource, DecodedFunction, ParamInfo};
use tiny_keccak::{Hasher, Keccak};

use crate::convert::{from_arg_value, is_dynamic, param_info, to_arg_value};
use crate::error::CodecError;

/// Computes the 4-byte function selector from a canonical signature
/// (`name(type1,type2,...)`, full tuple expansion, no parameter names).
pub fn selector(signature: &str) -> [u8; 4] {
    let mut hasher = Keccak::v256();
    let mut out = [0u8; 32];
    hasher.update(signature.as_bytes());
    hasher.finalize(&mut out);
    [out[0], out[1], out[2], out[3]]
}

/// Thin wrapper around a parsed ABI document, providing `decodeCall` /
/// `encodeCall` / `paramInfo`.
pub struct Codec {
    abi: JsonAbi,
}

impl Codec {
    pub fn from_abi_json(abi_json: &str) -> Result<Self, CodecError> {
        let abi: JsonAbi =
            serde_json::from_str(abi_json).map_err(|e| CodecError::InvalidAbi(e.to_string()))?;
        Ok(Codec { abi })
    }

    pub fn function_names(&self) -> Vec<&str> {
        self.abi.functions().map(|f| f.name.as_str()).collect()
    }

    pub fn selector_for(&self, name: &str) -> Option<[u8; 4]> {
        self.abi.functions().find(|f| f.name == name).map(|f| f.selector())
    }

    fn find_function(&self, sel: [u8; 4], name_hint: Option<&str>) -> Option<&Function> {
        if let Some(name) = name_hint {
            if let Some(f) = self.abi.functions().find(|f| f.name == name && f.selector() == sel) {
                return Some(f);
            }
            if let Some(f) = self.abi.functions().find(|f| f.name == name) {
                return Some(f);
            }
        }
        self.abi.functions().find(|f| f.selector() == sel)
    }

    /// Matches the 4-byte prefix against the ABI's function set and
    /// decodes the remainder according to that function's input layout.
    /// Never throws: returns `None` when the selector is unknown, or
    /// decoding would read past the end of calldata.
    pub fn decode_call(&self, calldata: &[u8], track_sources: bool) -> Option<DecodedFunction> {
        self.decode_call_hinted(calldata, None, track_sources)
    }

    pub fn decode_call_hinted(
        &self,
        calldata: &[u8],
        function_name: Option<&str>,
        track_sources: bool,
    ) -> Option<DecodedFunction> {
        if calldata.len() < 4 {
            return None;
        }
        let sel: [u8; 4] = calldata[..4].try_into().ok()?;
        let func = self.find_function(sel, function_name)?;
        let input_data = &calldata[4..];

        let names: Vec<String> = func
            .inputs
            .iter()
            .enumerate()
            .map(|(i, p)| if p.name.is_empty() { format!("arg{i}") } else { p.name.clone() })
            .collect();
        let types: Vec<DynSolType> = func
            .inputs
            .iter()
            .map(|p| p.resolve().ok())
            .collect::<Option<Vec<_>>>()?;

        let values = decode_tuple(input_data, &types)?;
        if values.len() != types.len() {
            return None;
        }

        let args: Vec<ArgValue> = values.iter().map(to_arg_value).collect();
        let arg_param_info: Vec<ParamInfo> = types
            .iter()
            .zip(names.iter())
            .map(|(t, n)| param_info(t, Some(n)))
            .collect();
        let arg_types: Vec<String> = types.iter().map(|t| t.sol_type_name().to_string()).collect();

        let arg_sources = if track_sources {
            Some(compute_arg_sources(input_data, &types))
        } else {
            None
        };

        Some(DecodedFunction {
            name: func.name.clone(),
            signature: format!("{}({})", func.name, arg_types.join(",")),
            selector: format!("0x{}", hex::encode(sel)),
            args,
            arg_types,
            arg_param_info,
            arg_sources,
            address_metadata: None,
        })
    }

    /// Encodes a probe call: selector followed by the ABI-encoded tuple
    /// of `args`, validated against the named function's declared input
    /// types.
    pub fn encode_call(&self, function_name: &str, args: &[ArgValue]) -> Result<Vec<u8>, CodecError> {
        let func = self
            .abi
            .functions()
            .find(|f| f.name == function_name)
            .ok_or_else(|| CodecError::FunctionNotFound(function_name.to_string()))?;

        if func.inputs.len() != args.len() {
            return Err(CodecError::ArgCountMismatch {
                expected: func.inputs.len(),
                got: args.len(),
            });
        }

        let types: Vec<DynSolType> = func
            .inputs
            .iter()
            .map(|p| p.resolve().map_err(|e| CodecError::InvalidAbi(e.to_string())))
            .collect::<Result<Vec<_>, _>>()?;

        let mut converted = Vec::with_capacity(args.len());
        for (i, (arg, ty)) in args.iter().zip(types.iter()).enumerate() {
            let v = from_arg_value(arg, ty).map_err(|reason| CodecError::EncodeFailed { index: i, reason })?;
            converted.push(v);
        }

        let sel = func.selector();
        let mut out = sel.to_vec();
        out.extend_from_slice(&DynSolValue::Tuple(converted).abi_encode());
        Ok(out)
    }

    pub fn param_info(&self, function_name: &str) -> Vec<ParamInfo> {
        let Some(func) = self.abi.functions().find(|f| f.name == function_name) else {
            return Vec::new();
        };
        func.inputs
            .iter()
            .enumerate()
            .filter_map(|(i, p)| {
                let name = if p.name.is_empty() { format!("arg{i}") } else { p.name.clone() };
                p.resolve().ok().map(|t| param_info(&t, Some(&name)))
            })
            .collect()
    }
}

fn decode_tuple(data: &[u8], types: &[DynSolType]) -> Option<Vec<DynSolValue>> {
    if types.is_empty() {
        return Some(vec![]);
    }
    let tuple = DynSolType::Tuple(types.to_vec());
    match tuple.abi_decode(data).ok()? {
        DynSolValue::Tuple(values) => Some(values),
        other => Some(vec![other]),
    }
}

/// Computes one `DataSource::Calldata` entry per top-level argument.
/// Static types are inline in the 32-byte head word; dynamic types place
/// a pointer in the head and their content in the tail. Tail spans are
/// derived from the sorted pointer positions of all dynamic arguments so
/// adjacent dynamic tails don't overlap; the last tail runs to the end
/// of the buffer (full-length capture, not truncated to 256 bytes).
fn compute_arg_sources(data: &[u8], types: &[DynSolType]) -> Vec<DataSource> {
    let mut dyn_positions: Vec<(usize, usize)> = Vec::new(); // (arg index, tail offset)
    for (i, ty) in types.iter().enumerate() {
        if is_dynamic(ty) {
            let head_pos = i * 32;
            if let Some(word) = data.get(head_pos..head_pos + 32) {
                if let Ok(offset) = U256::from_be_slice(word).try_into() as Result<usize, _> {
                    dyn_positions.push((i, offset));
                }
            }
        }
    }
    let mut sorted = dyn_positions.clone();
    sorted.sort_by_key(|(_, off)| *off);

    types
        .iter()
        .enumerate()
        .map(|(i, ty)| {
            let head_pos = i * 32;
            if is_dynamic(ty) {
                let tail_offset = dyn_positions
                    .iter()
                    .find(|(idx, _)| *idx == i)
                    .map(|(_, off)| *off)
                    .unwrap_or(data.len());
                let next_offset = sorted
                    .iter()
                    .find(|(_, off)| *off > tail_offset)
                    .map(|(_, off)| *off)
                    .unwrap_or(data.len());
                let end = next_offset.min(data.len()).max(tail_offset.min(data.len()));
                let slice = data.get(tail_offset..end).unwrap_or(&[]);
                DataSource::Calldata {
                    offset: 4 + tail_offset,
                    length: slice.len(),
                    raw: format!("0x{}", hex::encode(slice)),
                    encoding: "tail".to_string(),
                }
            } else {
                let slice = data.get(head_pos..head_pos + 32).unwrap_or(&[]);
                DataSource::Calldata {
                    offset: 4 + head_pos,
                    length: 32,
                    raw: format!("0x{}", hex::encode(slice)),
                    encoding: "head".to_string(),
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ERC20_ABI: &str = r#"[
        {"name":"transfer","type":"function","inputs":[{"name":"to","type":"address"},{"name":"amount","type":"uint256"}],"outputs":[{"name":"","type":"bool"}],"stateMutability":"nonpayable"}
    ]"#;

    #[test]
    fn selector_matches_known_values() {
        assert_eq!(hex::encode(selector("transfer(address,uint256)")), "a9059cbb");
        assert_eq!(
            hex::encode(selector("propose(address[],uint256[],bytes[],string)")),
            "da95691a"
        );
    }

    #[test]
    fn decode_call_round_trips_transfer() {
        let codec = Codec::from_abi_json(ERC20_ABI).unwrap();
        let calldata = codec
            .encode_call(
                "transfer",
                &[
                    ArgValue::Address("0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045".into()),
                    ArgValue::Uint("1000000".into()),
                ],
            )
            .unwrap();

        let decoded = codec.decode_call(&calldata, false).unwrap();
        assert_eq!(decoded.name, "transfer");
        assert_eq!(decoded.args[1], ArgValue::Uint("1000000".to_string()));
    }

    #[test]
    fn decode_call_returns_none_for_unknown_selector() {
        let codec = Codec::from_abi_json(ERC20_ABI).unwrap();
        let calldata = hex::decode("deadbeef").unwrap();
        assert!(codec.decode_call(&calldata, false).is_none());
    }

    #[test]
    fn decode_call_returns_none_for_truncated_calldata() {
        let codec = Codec::from_abi_json(ERC20_ABI).unwrap();
        let mut calldata = hex::decode("a9059cbb").unwrap();
        calldata.extend_from_slice(&[0u8; 10]);
        assert!(codec.decode_call(&calldata, false).is_none());
    }

    #[test]
    fn static_dynamic_layout_matches_head_offsets() {
        let abi = r#"[{"name":"foo","type":"function","inputs":[{"name":"a","type":"uint256"},{"name":"b","type":"bytes"}],"outputs":[],"stateMutability":"nonpayable"}]"#;
        let codec = Codec::from_abi_json(abi).unwrap();
        let calldata = codec
            .encode_call("foo", &[ArgValue::Uint("7".into()), ArgValue::bytes(b"hello")])
            .unwrap();
        let decoded = codec.decode_call(&calldata, true).unwrap();
        let sources = decoded.arg_sources.unwrap();
        match &sources[0] {
            DataSource::Calldata { offset, length, .. } => {
                assert_eq!(*offset, 4);
                assert_eq!(*length, 32);
            }
            _ => panic!("expected calldata source"),
        }
        match &sources[1] {
            DataSource::Calldata { offset, .. } => {
                // tail pointer value is 0x40 = 64 for a two-slot head
                assert_eq!(*offset, 4 + 64);
            }
            _ => panic!("expected calldata source"),
        }
    }

    #[test]
    fn wrong_arg_count_returns_error() {
        let codec = Codec::from_abi_json(ERC20_ABI).unwrap();
        let err = codec.encode_call("transfer", &[ArgValue::Uint("1".into())]).unwrap_err();
        assert!(matches!(err, CodecError::ArgCountMismatch { .. }));
    }
}
