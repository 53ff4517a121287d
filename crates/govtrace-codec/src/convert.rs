//! Conversions between alloy's `DynSolType`/`DynSolValue` and the crate's
//! own `ParamInfo`/`ArgValue` wire types, plus the static/dynamic
//! classification the head/tail layout rules depend on.

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::Address;
use govtrace_core::{ArgValue, ParamInfo};

/// A type is "dynamic" (tail-encoded, head holds an offset pointer) if it
/// is a variable-length byte string, a string, a dynamic-length array, or
/// a tuple/fixed array with any dynamic component. Everything else is
/// "static" (inline in the head).
pub fn is_dynamic(ty: &DynSolType) -> bool {
    match ty {
        DynSolType::Bytes | DynSolType::String => true,
        DynSolType::Array(_) => true,
        DynSolType::FixedArray(inner, _) => is_dynamic(inner),
        DynSolType::Tuple(fields) => fields.iter().any(is_dynamic),
        _ => false,
    }
}

pub fn is_static_type(ty: &DynSolType) -> bool {
    !is_dynamic(ty)
}

pub fn param_info(ty: &DynSolType, name: Option<&str>) -> ParamInfo {
    match ty {
        DynSolType::Tuple(fields) => ParamInfo {
            name: name.map(str::to_owned),
            base_type: "tuple".to_string(),
            ty: ty.sol_type_name().to_string(),
            components: Some(fields.iter().map(|f| param_info(f, None)).collect()),
            array_children: None,
        },
        DynSolType::Array(inner) => ParamInfo {
            name: name.map(str::to_owned),
            base_type: "array".to_string(),
            ty: ty.sol_type_name().to_string(),
            components: None,
            array_children: Some(Box::new(param_info(inner, None))),
        },
        DynSolType::FixedArray(inner, _) => ParamInfo {
            name: name.map(str::to_owned),
            base_type: "array".to_string(),
            ty: ty.sol_type_name().to_string(),
            components: None,
            array_children: Some(Box::new(param_info(inner, None))),
        },
        DynSolType::Uint(_) => base_param_info(name, "uint", ty),
        DynSolType::Int(_) => base_param_info(name, "int", ty),
        DynSolType::Bool => base_param_info(name, "bool", ty),
        DynSolType::Address => base_param_info(name, "address", ty),
        DynSolType::Bytes | DynSolType::FixedBytes(_) => base_param_info(name, "bytes", ty),
        DynSolType::String => base_param_info(name, "string", ty),
        _ => base_param_info(name, "unknown", ty),
    }
}

fn base_param_info(name: Option<&str>, base_type: &str, ty: &DynSolType) -> ParamInfo {
    ParamInfo {
        name: name.map(str::to_owned),
        base_type: base_type.to_string(),
        ty: ty.sol_type_name().to_string(),
        components: None,
        array_children: None,
    }
}

/// Converts a decoded alloy value into the wire `ArgValue` union,
/// narrowing integers to decimal strings so the JSON encoding never
/// loses precision.
pub fn to_arg_value(value: &DynSolValue) -> ArgValue {
    match value {
        DynSolValue::Bool(b) => ArgValue::Bool(*b),
        DynSolValue::Int(i, _) => ArgValue::Int(i.to_string()),
        DynSolValue::Uint(u, _) => ArgValue::Uint(u.to_string()),
        DynSolValue::FixedBytes(b, size) => ArgValue::bytes(&b.0[..*size]),
        DynSolValue::Bytes(b) => ArgValue::bytes(b),
        DynSolValue::String(s) => ArgValue::Str(s.clone()),
        DynSolValue::Address(a) => ArgValue::address(*a),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) => {
            ArgValue::Array(items.iter().map(to_arg_value).collect())
        }
        DynSolValue::Tuple(items) => ArgValue::Tuple(
            items
                .iter()
                .enumerate()
                .map(|(i, v)| (format!("arg{i}"), to_arg_value(v)))
                .collect(),
        ),
        DynSolValue::Function(f) => ArgValue::bytes(f.as_slice()),
        _ => ArgValue::Str(format!("{value:?}")),
    }
}

/// Converts a caller-supplied `ArgValue` into the `DynSolValue` an ABI
/// encoder expects, guided by the declared type. Used by `encodeCall`
/// for probe calls constructed from already-decoded or hand-built args.
pub fn from_arg_value(value: &ArgValue, expected: &DynSolType) -> Result<DynSolValue, String> {
    match (value, expected) {
        (ArgValue::Bool(b), DynSolType::Bool) => Ok(DynSolValue::Bool(*b)),
        (ArgValue::Uint(s), DynSolType::Uint(bits)) => {
            let u = s
                .parse::<alloy_primitives::U256>()
                .map_err(|e| format!("invalid uint literal '{s}': {e}"))?;
            Ok(DynSolValue::Uint(u, *bits))
        }
        (ArgValue::Int(s), DynSolType::Int(bits)) => {
            let i = s
                .parse::<alloy_primitives::I256>()
                .map_err(|e| format!("invalid int literal '{s}': {e}"))?;
            Ok(DynSolValue::Int(i, *bits))
        }
        (ArgValue::Address(s), DynSolType::Address) => {
            let a: Address = s
                .parse()
                .map_err(|e| format!("invalid address '{s}': {e}"))?;
            Ok(DynSolValue::Address(a))
        }
        (ArgValue::Bytes(s), DynSolType::Bytes) => {
            let data = decode_hex(s)?;
            Ok(DynSolValue::Bytes(data))
        }
        (ArgValue::Bytes(s), DynSolType::FixedBytes(size)) => {
            let data = decode_hex(s)?;
            let mut buf = [0u8; 32];
            buf[..data.len().min(32)].copy_from_slice(&data[..data.len().min(32)]);
            Ok(DynSolValue::FixedBytes(buf.into(), *size))
        }
        (ArgValue::Str(s), DynSolType::String) => Ok(DynSolValue::String(s.clone())),
        (ArgValue::Array(items), DynSolType::Array(inner)) => {
            let converted = items
                .iter()
                .map(|v| from_arg_value(v, inner))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(DynSolValue::Array(converted))
        }
        (ArgValue::Array(items), DynSolType::FixedArray(inner, len)) => {
            if items.len() != *len {
                return Err(format!("fixed array length mismatch: expected {len}, got {}", items.len()));
            }
            let converted = items
                .iter()
                .map(|v| from_arg_value(v, inner))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(DynSolValue::FixedArray(converted))
        }
        (ArgValue::Tuple(fields), DynSolType::Tuple(types)) => {
            if fields.len() != types.len() {
                return Err(format!(
                    "tuple arity mismatch: expected {}, got {}",
                    types.len(),
                    fields.len()
                ));
            }
            let converted = fields
                .iter()
                .zip(types.iter())
                .map(|((_, v), t)| from_arg_value(v, t))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(DynSolValue::Tuple(converted))
        }
        (value, expected) => Err(format!(
            "type mismatch: value {value:?} does not fit expected type {expected:?}"
        )),
    }
}

fn decode_hex(s: &str) -> Result<Vec<u8>, String> {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(stripped).map_err(|e| format!("invalid hex '{s}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_static_type_classification() {
        let static_tuple = DynSolType::Tuple(vec![DynSolType::Uint(256), DynSolType::Bool]);
        assert!(is_static_type(&static_tuple));

        let dynamic_tuple = DynSolType::Tuple(vec![DynSolType::Uint(256), DynSolType::Bytes]);
        assert!(!is_static_type(&dynamic_tuple));
    }

    #[test]
    fn param_info_captures_tuple_components() {
        let ty = DynSolType::Tuple(vec![DynSolType::Address, DynSolType::Uint(256)]);
        let info = param_info(&ty, Some("pair"));
        assert_eq!(info.base_type, "tuple");
        assert_eq!(info.components.unwrap().len(), 2);
    }

    #[test]
    fn to_arg_value_narrows_uint_to_decimal_string() {
        let v = DynSolValue::Uint(alloy_primitives::U256::from(1_000_000u64), 256);
        assert_eq!(to_arg_value(&v), ArgValue::Uint("1000000".to_string()));
    }
}
