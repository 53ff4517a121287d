//! A content-addressed on-disk cache keyed by `(chainId, address, kind)`.
//!
//! Writes go to a sibling temp file in the same directory and are then
//! renamed into place, so readers never observe a partial write — they
//! either see the old file, the new file, or (briefly) nothing. Negative
//! entries (`unverified_or_missing`, `unsupported_chain`, `null`) are
//! first-class and persisted with the same atomicity, matching the
//! teacher repo's read-mostly, race-tolerant schema registry but backed
//! by disk instead of memory so entries survive a process restart.
//!
//! `Entry<T>` is externally tagged (`{"payload": ...}` / `{"negative":
//! ...}`) rather than untagged — an untagged `Entry<serde_json::Value>`
//! would let the `Payload` arm swallow a negative marker, since `Value`
//! deserializes from any JSON shape.

use govtrace_core::ChainId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Abi,
    ContractName,
    AddressTagInfo,
    TokenInfo,
}

impl ArtifactKind {
    fn dir_name(self) -> &'static str {
        match self {
            ArtifactKind::Abi => "abi-cache",
            ArtifactKind::ContractName => "contract-name-cache",
            ArtifactKind::AddressTagInfo => "address-tag-cache",
            ArtifactKind::TokenInfo => "token-info-cache",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactKey {
    pub chain_id: ChainId,
    pub address: String,
    pub kind: ArtifactKind,
}

impl ArtifactKey {
    pub fn new(chain_id: ChainId, address: impl Into<String>, kind: ArtifactKind) -> Self {
        ArtifactKey {
            chain_id,
            address: address.into(),
            kind,
        }
    }

    fn path(&self, root: &Path) -> PathBuf {
        root.join(self.kind.dir_name())
            .join(self.chain_id.to_string())
            .join(format!("{}.json", self.address))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegativeReason {
    UnverifiedOrMissing,
    UnsupportedChain,
    Null,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entry<T> {
    Payload(T),
    Negative { negative: NegativeReason },
}

impl<T> Entry<T> {
    pub fn payload(self) -> Option<T> {
        match self {
            Entry::Payload(v) => Some(v),
            Entry::Negative { .. } => None,
        }
    }

    pub fn is_negative(&self) -> bool {
        matches!(self, Entry::Negative { .. })
    }
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cache entry at {path} is not valid json: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// The disk-backed `ArtifactStore`. Holds no mutable in-memory state; all
/// state lives under `root`, so the store is cheap to clone/share across
/// concurrent readers and writers.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ArtifactStore { root: root.into() }
    }

    pub fn get<T: for<'de> Deserialize<'de>>(
        &self,
        key: &ArtifactKey,
    ) -> Result<Option<Entry<T>>, CacheError> {
        let path = key.path(&self.root);
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&path).map_err(|source| CacheError::Io {
            path: path.clone(),
            source,
        })?;
        let entry: Entry<T> =
            serde_json::from_str(&raw).map_err(|source| CacheError::Corrupt { path, source })?;
        Ok(Some(entry))
    }

    /// Writes an entry atomically: serialize to a sibling `.tmp` file in
    /// the same directory, then rename into place. Concurrent writers to
    /// the same key are not serialized against each other — last rename
    /// wins, and every write is independently a complete valid file, so
    /// no reader ever observes a torn write.
    pub fn put<T: Serialize>(&self, key: &ArtifactKey, entry: &Entry<T>) -> Result<(), CacheError> {
        let path = key.path(&self.root);
        let dir = path.parent().expect("artifact path always has a parent");
        std::fs::create_dir_all(dir).map_err(|source| CacheError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let tmp_path = dir.join(format!(".{}.tmp-{}", key.address, uuid::Uuid::new_v4()));
        let body = serde_json::to_vec_pretty(entry).map_err(|source| CacheError::Corrupt {
            path: path.clone(),
            source,
        })?;
        std::fs::write(&tmp_path, &body).map_err(|source| CacheError::Io {
            path: tmp_path.clone(),
            source,
        })?;
        std::fs::rename(&tmp_path, &path).map_err(|source| CacheError::Io { path, source })?;
        tracing::debug!(kind = ?key.kind, chain_id = %key.chain_id, address = %key.address, "artifact cache write");
        Ok(())
    }

    pub fn put_negative<T>(&self, key: &ArtifactKey, reason: NegativeReason) -> Result<(), CacheError> {
        self.put::<T>(key, &Entry::Negative { negative: reason })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (ArtifactStore, PathBuf) {
        let dir = std::env::temp_dir().join(format!("govtrace-cache-test-{}", uuid::Uuid::new_v4()));
        (ArtifactStore::new(&dir), dir)
    }

    #[test]
    fn round_trips_a_payload() {
        let (store, dir) = temp_store();
        let key = ArtifactKey::new(ChainId::MAINNET, "0xabc", ArtifactKind::ContractName);
        store.put(&key, &Entry::Payload("Comet USDC".to_string())).unwrap();

        let got: Entry<String> = store.get(&key).unwrap().unwrap();
        assert_eq!(got.payload(), Some("Comet USDC".to_string()));
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn negative_entry_short_circuits_without_payload() {
        let (store, dir) = temp_store();
        let key = ArtifactKey::new(ChainId::MAINNET, "0xdead", ArtifactKind::Abi);
        store
            .put_negative::<serde_json::Value>(&key, NegativeReason::UnverifiedOrMissing)
            .unwrap();

        let got: Entry<serde_json::Value> = store.get(&key).unwrap().unwrap();
        assert!(got.is_negative());
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn missing_key_returns_none_without_error() {
        let (store, dir) = temp_store();
        let key = ArtifactKey::new(ChainId::MAINNET, "0xnever-written", ArtifactKind::TokenInfo);
        let result: Option<Entry<serde_json::Value>> = store.get(&key).unwrap();
        assert!(result.is_none());
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn store_survives_process_restart_simulation() {
        let (store, dir) = temp_store();
        let key = ArtifactKey::new(ChainId::ARBITRUM, "0xbeef", ArtifactKind::Abi);
        store
            .put_negative::<serde_json::Value>(&key, NegativeReason::UnsupportedChain)
            .unwrap();
        drop(store);

        let reopened = ArtifactStore::new(&dir);
        let got: Entry<serde_json::Value> = reopened.get(&key).unwrap().unwrap();
        assert!(got.is_negative());
        std::fs::remove_dir_all(dir).ok();
    }
}
