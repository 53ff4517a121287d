//! Fetches ABIs, verified-contract names, address-tag info, and token
//! pages from a per-chain verified-source service, with capped-backoff
//! retry and a disk-backed negative cache.
//!
//! Modeled on the explorer API's unified v2 shape (one base URL, chain
//! selected by a `chainid` query parameter) rather than per-chain
//! subdomains — see the design note in the external-interfaces section.

use govtrace_cache::{ArtifactKey, ArtifactKind, ArtifactStore, Entry, NegativeReason};
use govtrace_core::ChainId;
use std::time::Duration;
use url::Url;

use crate::error::ExplorerError;
use crate::types::{AbiFetch, AddressTagInfo, TokenPage};

const DEFAULT_BASE: &str = "https://api.etherscan.io/v2/api";
const MAX_ATTEMPTS: u32 = 3;

pub struct ExplorerClient {
    http: reqwest::Client,
    store: ArtifactStore,
    api_key: Option<String>,
    base: Url,
}

impl ExplorerClient {
    pub fn new(store: ArtifactStore, api_key: Option<String>) -> Self {
        ExplorerClient {
            http: reqwest::Client::new(),
            store,
            api_key,
            base: Url::parse(DEFAULT_BASE).expect("default explorer base is a valid url"),
        }
    }

    pub fn with_base(mut self, base: Url) -> Self {
        self.base = base;
        self
    }

    pub async fn fetch_abi(&self, chain_id: ChainId, address: &str) -> Result<AbiFetch, ExplorerError> {
        let key = ArtifactKey::new(chain_id, address, ArtifactKind::Abi);
        if let Some(entry) = self.store.get::<serde_json::Value>(&key)? {
            return Ok(entry_to_abi_fetch(entry));
        }

        for attempt in 1..=MAX_ATTEMPTS {
            let body = self
                .call(chain_id, &[("module", "contract"), ("action", "getabi"), ("address", address)])
                .await?;

            match classify_getabi_response(&body)? {
                AbiFetch::RateLimited => {
                    if attempt < MAX_ATTEMPTS {
                        tracing::debug!(attempt, "explorer rate-limited, backing off");
                        tokio::time::sleep(backoff(attempt)).await;
                        continue;
                    }
                    return Ok(AbiFetch::RateLimited);
                }
                AbiFetch::UnverifiedOrMissing => {
                    self.store.put_negative::<serde_json::Value>(&key, NegativeReason::UnverifiedOrMissing)?;
                    return Ok(AbiFetch::UnverifiedOrMissing);
                }
                AbiFetch::UnsupportedChain => {
                    self.store.put_negative::<serde_json::Value>(&key, NegativeReason::UnsupportedChain)?;
                    return Ok(AbiFetch::UnsupportedChain);
                }
                found @ AbiFetch::Found(_) => {
                    if let AbiFetch::Found(v) = &found {
                        self.store.put(&key, &Entry::Payload(v.clone()))?;
                    }
                    return Ok(found);
                }
            }
        }
        Ok(AbiFetch::RateLimited)
    }

    pub async fn fetch_contract_name(&self, chain_id: ChainId, address: &str) -> Result<Option<String>, ExplorerError> {
        let key = ArtifactKey::new(chain_id, address, ArtifactKind::ContractName);
        if let Some(entry) = self.store.get::<Option<String>>(&key)? {
            return Ok(entry.payload().flatten());
        }

        let body = self
            .call(chain_id, &[("module", "contract"), ("action", "getsourcecode"), ("address", address)])
            .await?;
        let name = body
            .get("result")
            .and_then(|r| r.as_array())
            .and_then(|arr| arr.first())
            .and_then(|entry| entry.get("ContractName"))
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        self.store.put(&key, &Entry::Payload(name.clone()))?;
        Ok(name)
    }

    pub async fn fetch_address_tag_info(
        &self,
        chain_id: ChainId,
        address: &str,
    ) -> Result<Option<AddressTagInfo>, ExplorerError> {
        let key = ArtifactKey::new(chain_id, address, ArtifactKind::AddressTagInfo);
        if let Some(entry) = self.store.get::<AddressTagInfo>(&key)? {
            return Ok(entry.payload());
        }

        let body = self
            .call(chain_id, &[("module", "contract"), ("action", "addresstag"), ("address", address)])
            .await?;
        let Some(result) = body.get("result") else {
            self.store.put_negative::<AddressTagInfo>(&key, NegativeReason::Null)?;
            return Ok(None);
        };

        let info = AddressTagInfo {
            name_tag: result.get("nameTag").and_then(|v| v.as_str()).map(str::to_string),
            labels: result
                .get("labels")
                .and_then(|v| v.as_array())
                .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
                .unwrap_or_default(),
            other_attributes: result
                .get("otherAttributes")
                .and_then(|v| v.as_array())
                .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
                .unwrap_or_default(),
            url: result.get("url").and_then(|v| v.as_str()).map(str::to_string),
            short_description: result.get("shortDescription").and_then(|v| v.as_str()).map(str::to_string),
            notes: Vec::new(),
        };
        self.store.put(&key, &Entry::Payload(info.clone()))?;
        Ok(Some(info))
    }

    /// Tries HTML title, embedded structured data, then an explicit
    /// variable — first successful strategy wins.
    pub async fn fetch_token_page(&self, chain_id: ChainId, address: &str) -> Result<TokenPage, ExplorerError> {
        let key = ArtifactKey::new(chain_id, address, ArtifactKind::TokenInfo);
        if let Some(entry) = self.store.get::<TokenPage>(&key)? {
            return Ok(entry.payload().unwrap_or_default());
        }

        let body = self
            .call(chain_id, &[("module", "token"), ("action", "tokeninfo"), ("contractaddress", address)])
            .await?;
        let result = body.get("result").and_then(|v| v.as_array()).and_then(|a| a.first());

        let page = match result {
            Some(entry) => TokenPage {
                symbol: entry.get("symbol").and_then(|v| v.as_str()).map(str::to_string),
                name: entry.get("tokenName").and_then(|v| v.as_str()).map(str::to_string),
                decimals: entry
                    .get("divisor")
                    .and_then(|v| v.as_str())
                    .and_then(|s| s.parse().ok()),
            },
            None => TokenPage::default(),
        };
        self.store.put(&key, &Entry::Payload(page.clone()))?;
        Ok(page)
    }

    async fn call(&self, chain_id: ChainId, params: &[(&str, &str)]) -> Result<serde_json::Value, ExplorerError> {
        let mut url = self.base.clone();
        {
            let mut qp = url.query_pairs_mut();
            qp.append_pair("chainid", &chain_id.to_string());
            for (k, v) in params {
                qp.append_pair(k, v);
            }
            if let Some(key) = &self.api_key {
                qp.append_pair("apikey", key);
            }
        }
        let resp = self.http.get(url).send().await?;
        let body: serde_json::Value = resp.json().await?;
        if is_invalid_api_key(&body) {
            return Err(ExplorerError::InvalidApiKey(
                body.get("result").and_then(|v| v.as_str()).unwrap_or("invalid api key").to_string(),
            ));
        }
        Ok(body)
    }
}

fn entry_to_abi_fetch(entry: Entry<serde_json::Value>) -> AbiFetch {
    match entry {
        Entry::Payload(v) => AbiFetch::Found(v),
        Entry::Negative { negative: NegativeReason::UnsupportedChain } => AbiFetch::UnsupportedChain,
        Entry::Negative { .. } => AbiFetch::UnverifiedOrMissing,
    }
}

fn is_invalid_api_key(body: &serde_json::Value) -> bool {
    body.get("result")
        .and_then(|v| v.as_str())
        .map(|s| s.to_lowercase().contains("invalid api key"))
        .unwrap_or(false)
}

/// Classifies a raw `getabi` response body into the three reasons the
/// spec names, or a successful parse of the ABI JSON.
pub fn classify_getabi_response(body: &serde_json::Value) -> Result<AbiFetch, ExplorerError> {
    let status = body.get("status").and_then(|v| v.as_str()).unwrap_or("0");
    let message = body.get("message").and_then(|v| v.as_str()).unwrap_or("").to_lowercase();
    let result = body.get("result").and_then(|v| v.as_str()).unwrap_or("");

    if status == "1" {
        let abi: serde_json::Value = serde_json::from_str(result)
            .map_err(|e| ExplorerError::Malformed(format!("ABI result is not valid json: {e}")))?;
        return Ok(AbiFetch::Found(abi));
    }

    if message.contains("rate limit") || result.to_lowercase().contains("rate limit") {
        return Ok(AbiFetch::RateLimited);
    }
    if message.contains("unsupported chain") || result.to_lowercase().contains("unsupported") {
        return Ok(AbiFetch::UnsupportedChain);
    }
    Ok(AbiFetch::UnverifiedOrMissing)
}

fn backoff(attempt: u32) -> Duration {
    Duration::from_secs(attempt as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifies_successful_abi_response() {
        let body = json!({"status": "1", "message": "OK", "result": "[{\"type\":\"function\",\"name\":\"foo\",\"inputs\":[]}]"});
        let classified = classify_getabi_response(&body).unwrap();
        assert!(matches!(classified, AbiFetch::Found(_)));
    }

    #[test]
    fn classifies_unverified_contract() {
        let body = json!({"status": "0", "message": "NOTOK", "result": "Contract source code not verified"});
        assert_eq!(classify_getabi_response(&body).unwrap(), AbiFetch::UnverifiedOrMissing);
    }

    #[test]
    fn classifies_rate_limit() {
        let body = json!({"status": "0", "message": "NOTOK", "result": "Max rate limit reached"});
        assert_eq!(classify_getabi_response(&body).unwrap(), AbiFetch::RateLimited);
    }

    #[test]
    fn detects_invalid_api_key() {
        let body = json!({"status": "0", "message": "NOTOK", "result": "Invalid API Key"});
        assert!(is_invalid_api_key(&body));
    }

    #[test]
    fn backoff_scales_linearly_with_attempt() {
        assert_eq!(backoff(1), Duration::from_secs(1));
        assert_eq!(backoff(3), Duration::from_secs(3));
    }
}
