//! Small ABI-value helpers shared by the bridge and insight handlers.

use govtrace_core::{ArgValue, DecodedFunction};
use tiny_keccak::{Hasher, Keccak};

pub fn selector4(signature: &str) -> [u8; 4] {
    let mut hasher = Keccak::v256();
    let mut out = [0u8; 32];
    hasher.update(signature.as_bytes());
    hasher.finalize(&mut out);
    [out[0], out[1], out[2], out[3]]
}

pub fn decode_hex_bytes(value: &str) -> Option<Vec<u8>> {
    hex::decode(value.strip_prefix("0x").unwrap_or(value)).ok()
}

/// Reads a named field out of a `Tuple` arg value.
pub fn tuple_field<'a>(value: &'a ArgValue, name: &str) -> Option<&'a ArgValue> {
    match value {
        ArgValue::Tuple(fields) => fields.iter().find(|(n, _)| n == name).map(|(_, v)| v),
        _ => None,
    }
}

pub fn as_array(value: &ArgValue) -> Option<&[ArgValue]> {
    match value {
        ArgValue::Array(items) => Some(items),
        _ => None,
    }
}

pub fn as_str(value: &ArgValue) -> Option<&str> {
    match value {
        ArgValue::Str(s) => Some(s),
        _ => None,
    }
}

pub fn as_address(value: &ArgValue) -> Option<&str> {
    match value {
        ArgValue::Address(a) => Some(a),
        _ => None,
    }
}

pub fn as_decimal(value: &ArgValue) -> Option<&str> {
    match value {
        ArgValue::Uint(s) | ArgValue::Int(s) => Some(s),
        _ => None,
    }
}

pub fn as_bytes_hex(value: &ArgValue) -> Option<&str> {
    match value {
        ArgValue::Bytes(s) => Some(s),
        _ => None,
    }
}

/// Looks up a top-level named argument, by parameter name, on a decoded
/// function — the same convenience `DecodedFunction::arg` provides, kept
/// here too so handler modules only need one import surface.
pub fn named_arg<'a>(func: &'a DecodedFunction, name: &str) -> Option<&'a ArgValue> {
    func.arg(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector4_is_deterministic_and_signature_sensitive() {
        let a = selector4("sendMessage(address,uint256,bytes)");
        let b = selector4("sendMessage(address,uint256,bytes)");
        let c = selector4("sendMessage(address,uint256)");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn tuple_field_looks_up_by_name() {
        let tuple = ArgValue::Tuple(vec![("asset".into(), ArgValue::Address("0xaaa".into()))]);
        assert_eq!(tuple_field(&tuple, "asset"), Some(&ArgValue::Address("0xaaa".into())));
        assert_eq!(tuple_field(&tuple, "missing"), None);
    }
}
