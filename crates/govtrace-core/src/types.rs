//! The dynamic value union and the `Sourced<T>` provenance wrapper.
//!
//! Decoded call arguments are heterogeneously typed (address, integer, bool,
//! bytes, string, nested tuple, array). `ArgValue` is a tagged variant
//! carrying the payload; `ParamInfo` is the matching recursive ABI type
//! descriptor used for rendering and for UI type hints.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A decoded argument value. Integers are carried as decimal strings so
/// the JSON encoding never loses precision for values above 2^53 — see
/// the numeric serialization rule in the external-interfaces section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ArgValue {
    Uint(String),
    Int(String),
    Bool(bool),
    Address(String),
    Bytes(String),
    Str(String),
    Array(Vec<ArgValue>),
    Tuple(Vec<(String, ArgValue)>),
}

impl ArgValue {
    pub fn address(addr: Address) -> Self {
        ArgValue::Address(addr.to_checksum(None))
    }

    pub fn bytes(data: &[u8]) -> Self {
        ArgValue::Bytes(format!("0x{}", hex::encode(data)))
    }

    /// Returns the checksummed address string if this value is an address leaf.
    pub fn as_address(&self) -> Option<&str> {
        match self {
            ArgValue::Address(a) => Some(a),
            _ => None,
        }
    }

    /// Walks the value tree, collecting every address-typed leaf.
    pub fn collect_addresses(&self, out: &mut Vec<String>) {
        match self {
            ArgValue::Address(a) => out.push(a.clone()),
            ArgValue::Array(items) => items.iter().for_each(|v| v.collect_addresses(out)),
            ArgValue::Tuple(fields) => fields.iter().for_each(|(_, v)| v.collect_addresses(out)),
            _ => {}
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Uint(s) | ArgValue::Int(s) => write!(f, "{s}"),
            ArgValue::Bool(b) => write!(f, "{b}"),
            ArgValue::Address(a) => write!(f, "{a}"),
            ArgValue::Bytes(b) => write!(f, "{b}"),
            ArgValue::Str(s) => write!(f, "{s}"),
            ArgValue::Array(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            ArgValue::Tuple(fields) => {
                write!(f, "(")?;
                for (i, (_, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Recursive descriptor for one ABI parameter's type, independent of its value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamInfo {
    pub name: Option<String>,
    /// The Solidity base type family: "uint", "int", "bool", "address",
    /// "bytes", "string", "tuple", "array".
    pub base_type: String,
    /// The full canonical type string, e.g. "uint256", "address[]", "(uint256,bytes)[3]".
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<ParamInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub array_children: Option<Box<ParamInfo>>,
}

/// Where a decoded value came from. One variant per provenance kind named
/// in the data model; carried uniformly regardless of which field it
/// annotates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DataSource {
    Calldata {
        offset: usize,
        length: usize,
        raw: String,
        encoding: String,
    },
    EtherscanABI {
        chain_id: u64,
        address: String,
    },
    EtherscanSourcecode {
        chain_id: u64,
        address: String,
        verified: bool,
    },
    EtherscanTag {
        chain_id: u64,
        address: String,
        kind: String,
    },
    OnChain {
        chain_id: u64,
        address: String,
        method: String,
        args: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        cast_command: Option<String>,
    },
    StaticMetadata {
        path: String,
        key: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        market: Option<String>,
    },
    ExternalAPI {
        api: String,
        endpoint: String,
    },
    LocalABI {
        path: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        variant: Option<String>,
    },
    Handler {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    ProposalParameter {
        array: String,
        index: usize,
        raw: String,
    },
    Hardcoded {
        location: String,
        reason: String,
    },
}

/// A value paired with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sourced<T> {
    pub value: T,
    pub source: DataSource,
}

impl<T> Sourced<T> {
    pub fn new(value: T, source: DataSource) -> Self {
        Sourced { value, source }
    }
}

/// A field that is either plain `T` or `T` with a provenance tag, decided
/// once per decode by `trackSources` — never mixed within one decode.
/// Serializes as `T` directly when untracked and as `{ value, source }`
/// when tracked, so toggling the option never changes the shape of
/// fields the caller doesn't care about.
#[derive(Debug, Clone, PartialEq)]
pub enum MaybeSourced<T> {
    Plain(T),
    Sourced(Sourced<T>),
}

impl<T> MaybeSourced<T> {
    pub fn plain(value: T) -> Self {
        MaybeSourced::Plain(value)
    }

    pub fn sourced(value: T, source: DataSource) -> Self {
        MaybeSourced::Sourced(Sourced::new(value, source))
    }

    /// Builds a `Plain` or `Sourced` variant depending on `track_sources`,
    /// matching the single-code-path rule: callers decode once and pick
    /// the wrapping at the call site instead of branching decode logic.
    pub fn new(value: T, source: DataSource, track_sources: bool) -> Self {
        if track_sources {
            MaybeSourced::sourced(value, source)
        } else {
            MaybeSourced::plain(value)
        }
    }

    pub fn value(&self) -> &T {
        match self {
            MaybeSourced::Plain(v) => v,
            MaybeSourced::Sourced(s) => &s.value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            MaybeSourced::Plain(v) => v,
            MaybeSourced::Sourced(s) => s.value,
        }
    }

    pub fn source(&self) -> Option<&DataSource> {
        match self {
            MaybeSourced::Plain(_) => None,
            MaybeSourced::Sourced(s) => Some(&s.source),
        }
    }
}

impl<T: Serialize> Serialize for MaybeSourced<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            MaybeSourced::Plain(v) => v.serialize(serializer),
            MaybeSourced::Sourced(s) => s.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arg_value_display_nested() {
        let v = ArgValue::Tuple(vec![
            ("a".into(), ArgValue::Uint("1000000".into())),
            ("b".into(), ArgValue::Bool(true)),
        ]);
        assert_eq!(v.to_string(), "(1000000, true)");
    }

    #[test]
    fn collect_addresses_walks_nested_structures() {
        let v = ArgValue::Array(vec![
            ArgValue::Address("0xAAAA000000000000000000000000000000000A".into()),
            ArgValue::Tuple(vec![(
                "inner".into(),
                ArgValue::Address("0xBBBB000000000000000000000000000000000B".into()),
            )]),
        ]);
        let mut out = Vec::new();
        v.collect_addresses(&mut out);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn maybe_sourced_serializes_as_plain_value_when_untracked() {
        let m = MaybeSourced::new("USDC".to_string(), DataSource::Hardcoded {
            location: "static".into(),
            reason: "test".into(),
        }, false);
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, "\"USDC\"");
    }

    #[test]
    fn maybe_sourced_serializes_as_object_when_tracked() {
        let m = MaybeSourced::new(
            "USDC".to_string(),
            DataSource::Hardcoded {
                location: "static".into(),
                reason: "test".into(),
            },
            true,
        );
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["value"], "USDC");
        assert_eq!(json["source"]["type"], "Hardcoded");
    }
}
