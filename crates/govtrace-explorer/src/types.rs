use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AddressTagInfo {
    pub name_tag: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub other_attributes: Vec<String>,
    pub url: Option<String>,
    pub short_description: Option<String>,
    #[serde(default)]
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TokenPage {
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub decimals: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractNameResult {
    pub name: String,
    pub source: ContractNameSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContractNameSource {
    Etherscan,
    CometMetadata,
}

/// Outcome of a `fetchAbi` attempt: the ABI itself, or one of the three
/// reasons the distilled spec names explicitly.
#[derive(Debug, Clone, PartialEq)]
pub enum AbiFetch {
    Found(serde_json::Value),
    UnsupportedChain,
    UnverifiedOrMissing,
    RateLimited,
}
