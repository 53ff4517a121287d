//! Process-wide configuration: the chain table, explorer API key, cache
//! root, and logging preferences. Loaded once at decode entry and passed
//! through as a plain value — no global state.

use crate::chain::ChainId;
use crate::error::DecoderError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use url::Url;

/// Per-chain connection info. Fields used by the sibling proposal
/// simulator (gas, gasPrice, whale addresses) are accepted but ignored —
/// parsed for forward-compatibility with shared config files, not acted
/// on by the decoder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    #[serde(rename = "rpcUrl")]
    pub rpc_url: Option<Url>,
    #[serde(rename = "explorerBase")]
    pub explorer_base: Option<Url>,
    #[serde(default)]
    pub gas: Option<u64>,
    #[serde(rename = "gasPrice", default)]
    pub gas_price: Option<String>,
    #[serde(rename = "whaleAddresses", default)]
    pub whale_addresses: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecoderConfig {
    pub chains: HashMap<u64, ChainConfig>,
    #[serde(rename = "etherscanApiKey")]
    pub etherscan_api_key: Option<String>,
    #[serde(rename = "cacheRoot")]
    pub cache_root: PathBuf,
    #[serde(rename = "trackSources", default)]
    pub track_sources: bool,
    #[serde(rename = "logJson", default)]
    pub log_json: bool,
}

impl DecoderConfig {
    /// Loads from a YAML or JSON file, chosen by extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DecoderError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let config: DecoderConfig = if is_json {
            serde_json::from_str(&raw)?
        } else {
            serde_yaml::from_str(&raw)
                .map_err(|e| DecoderError::Config(format!("invalid config yaml: {e}")))?
        };
        Ok(config)
    }

    pub fn chain(&self, chain_id: ChainId) -> Option<&ChainConfig> {
        self.chains.get(&chain_id.0)
    }

    pub fn rpc_url(&self, chain_id: ChainId) -> Option<&Url> {
        self.chain(chain_id).and_then(|c| c.rpc_url.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_minimal_yaml_config() {
        let dir = std::env::temp_dir().join(format!("govtrace-cfg-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.yaml");
        std::fs::write(
            &path,
            r#"
cacheRoot: /tmp/govtrace-cache
etherscanApiKey: "ABC123"
trackSources: true
chains:
  1:
    rpcUrl: "https://eth.example.com"
"#,
        )
        .unwrap();

        let config = DecoderConfig::load(&path).unwrap();
        assert_eq!(config.etherscan_api_key.as_deref(), Some("ABC123"));
        assert!(config.track_sources);
        assert!(config.rpc_url(ChainId::MAINNET).is_some());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_file_is_a_decoder_error_not_a_panic() {
        let err = DecoderConfig::load("/nonexistent/path/config.yaml").unwrap_err();
        assert!(matches!(err, DecoderError::Io(_)));
    }
}
