//! The eleven proxy-detection probes `ProxyResolver` races concurrently.
//!
//! Each probe is self-contained: it reads whatever storage slot or view
//! call it needs and returns `None` on anything short of a confident
//! positive match, including RPC failures. A scheme never propagates an
//! error — the resolver only ever sees presence or absence.

use serde::{Deserialize, Serialize};
use tiny_keccak::{Hasher, Keccak};

use crate::rpc::EvmRpc;

/// The detected proxy pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProxyKind {
    Eip1167Minimal,
    Eip1967Direct,
    Eip1967Beacon,
    OzLegacy,
    Eip1822Uups,
    Eip897,
    SafeProxy,
    Comptroller,
    BalancerBatchRelayer,
    AddressManager,
    Eip2535Diamond,
}

/// Result of a single scheme's probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyDetection {
    pub target: String,
    pub proxy_type: ProxyKind,
    /// True when the implementation can never change after deployment
    /// (only the EIP-1167 bytecode clone qualifies).
    pub immutable: bool,
}

// ─── Storage slots ──────────────────────────────────────────────────────

/// `keccak256("eip1967.proxy.implementation") - 1`
pub const EIP1967_IMPL_SLOT: &str = "0x360894a13ba1a3210667c828492db98dca3e2076cc3735a920a3ca505d382bbc";
/// `keccak256("eip1967.proxy.beacon") - 1`
pub const EIP1967_BEACON_SLOT: &str = "0xa3f0ad74e5423aebfd80d3ef4346578335a9a72aeaee59ff6cb3582b35133d50";
/// `keccak256("PROXIABLE")`
pub const EIP1822_PROXIABLE_SLOT: &str = "0xc5f16f0fcc639fa48a6947836d9850f504798523bf8c9a3a87d5876cf622bcf7";

const EIP1167_PREFIX: &[u8] = &[0x36, 0x3d, 0x3d, 0x37, 0x3d, 0x3d, 0x3d, 0x36, 0x3d, 0x73];
const EIP1167_SUFFIX: &[u8] = &[0x5a, 0xf4, 0x3d, 0x82, 0x80, 0x3e, 0x90, 0x3d, 0x91, 0x60, 0x2b, 0x57, 0xfd, 0x5b, 0xf3];

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

/// `keccak256("org.zeppelinos.proxy.implementation")`, computed rather
/// than hardcoded since it has no well-known literature value.
fn oz_legacy_slot() -> String {
    format!("0x{}", hex::encode(keccak256(b"org.zeppelinos.proxy.implementation")))
}

/// Storage returns 32-byte zero-padded words; an address lives in the
/// low 20 bytes. `None` if the high 12 bytes are non-zero or the value
/// is the zero address.
fn storage_to_address(slot_value: &str) -> Option<String> {
    let hex_str = slot_value.strip_prefix("0x").unwrap_or(slot_value);
    if hex_str.len() != 64 {
        return None;
    }
    let (prefix, addr_hex) = hex_str.split_at(24);
    if prefix.chars().all(|c| c == '0') && addr_hex != "0".repeat(40) {
        Some(format!("0x{addr_hex}"))
    } else {
        None
    }
}

/// Return data from a zero-argument `address`-returning view call is a
/// single 32-byte word, same shape as a storage slot.
fn return_to_address(data: &[u8]) -> Option<String> {
    if data.len() < 32 {
        return None;
    }
    storage_to_address(&format!("0x{}", hex::encode(&data[data.len() - 32..])))
}

pub async fn detect_eip1167_minimal(rpc: &dyn EvmRpc, address: &str) -> Option<ProxyDetection> {
    let code = rpc.get_code(address).await.ok()?;
    if code.len() != 45 || &code[..10] != EIP1167_PREFIX || &code[30..] != EIP1167_SUFFIX {
        return None;
    }
    let target = format!("0x{}", hex::encode(&code[10..30]));
    Some(ProxyDetection { target, proxy_type: ProxyKind::Eip1167Minimal, immutable: true })
}

pub async fn detect_eip1967_direct(rpc: &dyn EvmRpc, address: &str) -> Option<ProxyDetection> {
    let slot = rpc.get_storage_at(address, EIP1967_IMPL_SLOT).await.ok()?;
    let target = storage_to_address(&slot)?;
    Some(ProxyDetection { target, proxy_type: ProxyKind::Eip1967Direct, immutable: false })
}

pub async fn detect_eip1967_beacon(rpc: &dyn EvmRpc, address: &str) -> Option<ProxyDetection> {
    let slot = rpc.get_storage_at(address, EIP1967_BEACON_SLOT).await.ok()?;
    let beacon = storage_to_address(&slot)?;
    let data = rpc.call(&beacon, &selector4("implementation()")).await.ok()?;
    let target = return_to_address(&data)?;
    Some(ProxyDetection { target, proxy_type: ProxyKind::Eip1967Beacon, immutable: false })
}

pub async fn detect_oz_legacy(rpc: &dyn EvmRpc, address: &str) -> Option<ProxyDetection> {
    let slot = rpc.get_storage_at(address, &oz_legacy_slot()).await.ok()?;
    let target = storage_to_address(&slot)?;
    Some(ProxyDetection { target, proxy_type: ProxyKind::OzLegacy, immutable: false })
}

pub async fn detect_eip1822_uups(rpc: &dyn EvmRpc, address: &str) -> Option<ProxyDetection> {
    let slot = rpc.get_storage_at(address, EIP1822_PROXIABLE_SLOT).await.ok()?;
    let target = storage_to_address(&slot)?;
    Some(ProxyDetection { target, proxy_type: ProxyKind::Eip1822Uups, immutable: false })
}

pub async fn detect_eip897(rpc: &dyn EvmRpc, address: &str) -> Option<ProxyDetection> {
    let data = rpc.call(address, &selector4("implementation()")).await.ok()?;
    let target = return_to_address(&data)?;
    Some(ProxyDetection { target, proxy_type: ProxyKind::Eip897, immutable: false })
}

pub async fn detect_safe_proxy(rpc: &dyn EvmRpc, address: &str) -> Option<ProxyDetection> {
    let data = rpc.call(address, &selector4("masterCopy()")).await.ok()?;
    let target = return_to_address(&data)?;
    Some(ProxyDetection { target, proxy_type: ProxyKind::SafeProxy, immutable: false })
}

pub async fn detect_comptroller(rpc: &dyn EvmRpc, address: &str) -> Option<ProxyDetection> {
    let data = rpc.call(address, &selector4("comptrollerImplementation()")).await.ok()?;
    let target = return_to_address(&data)?;
    Some(ProxyDetection { target, proxy_type: ProxyKind::Comptroller, immutable: false })
}

pub async fn detect_balancer_batch_relayer(rpc: &dyn EvmRpc, address: &str) -> Option<ProxyDetection> {
    let data = rpc.call(address, &selector4("getLibrary()")).await.ok()?;
    let target = return_to_address(&data)?;
    Some(ProxyDetection { target, proxy_type: ProxyKind::BalancerBatchRelayer, immutable: false })
}

/// Reads the `Lib_ResolvedDelegateProxy` layout: slot 0 holds the
/// address manager, slot 1 holds the registered implementation name as
/// a short packed string, then resolves via `getAddress(string)`.
pub async fn detect_address_manager(rpc: &dyn EvmRpc, address: &str) -> Option<ProxyDetection> {
    let manager_slot = rpc.get_storage_at(address, "0x0").await.ok()?;
    let manager = storage_to_address(&manager_slot)?;
    let name_slot = rpc.get_storage_at(address, "0x1").await.ok()?;
    let name = decode_short_packed_string(&name_slot)?;

    let mut calldata = selector4("getAddress(string)").to_vec();
    calldata.extend(encode_string_arg(&name));
    let data = rpc.call(&manager, &calldata).await.ok()?;
    let target = return_to_address(&data)?;
    Some(ProxyDetection { target, proxy_type: ProxyKind::AddressManager, immutable: false })
}

/// Solidity packs short strings (< 32 bytes) as `[data ...][2 * len]` in
/// the low byte, left-aligned. Returns `None` for the long-string layout.
fn decode_short_packed_string(slot_value: &str) -> Option<String> {
    let hex_str = slot_value.strip_prefix("0x").unwrap_or(slot_value);
    let bytes = hex::decode(hex_str).ok()?;
    if bytes.len() != 32 {
        return None;
    }
    let marker = bytes[31];
    if marker % 2 != 0 {
        return None;
    }
    let len = (marker / 2) as usize;
    if len >= 32 {
        return None;
    }
    String::from_utf8(bytes[..len].to_vec()).ok()
}

fn encode_string_arg(s: &str) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend(std::iter::repeat(0u8).take(31));
    out.push(0x20);
    let mut len_word = [0u8; 32];
    len_word[24..].copy_from_slice(&(s.len() as u64).to_be_bytes());
    out.extend(len_word);
    let mut data = s.as_bytes().to_vec();
    let padded_len = data.len().div_ceil(32) * 32;
    data.resize(padded_len, 0);
    out.extend(data);
    out
}

/// EIP-2535 Diamond facets answer `supportsInterface(0x01ffc9a7)` and
/// expose `facets()`; detecting one only tells us it is *not* a linear
/// proxy, so this always reports absence to the caller.
pub async fn detect_eip2535_diamond(rpc: &dyn EvmRpc, address: &str) -> Option<ProxyDetection> {
    let _ = rpc.call(address, &selector4("facets()")).await.ok()?;
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector4_matches_known_value() {
        assert_eq!(hex::encode(selector4("implementation()")), "5c60da1b");
    }

    #[test]
    fn storage_to_address_extracts_low_twenty_bytes() {
        let slot = "0x000000000000000000000000d8da6bf26964af9d7eed9e03e53415d37aa96045";
        assert_eq!(storage_to_address(slot).unwrap(), "0xd8da6bf26964af9d7eed9e03e53415d37aa96045");
    }

    #[test]
    fn storage_to_address_rejects_zero() {
        let zero = "0x0000000000000000000000000000000000000000000000000000000000000000";
        assert!(storage_to_address(zero).is_none());
    }

    #[test]
    fn decode_short_packed_string_roundtrips() {
        let mut bytes = [0u8; 32];
        bytes[..7].copy_from_slice(b"Proxy__");
        bytes[31] = 14; // 7 * 2
        let slot = format!("0x{}", hex::encode(bytes));
        assert_eq!(decode_short_packed_string(&slot).unwrap(), "Proxy__");
    }
}
