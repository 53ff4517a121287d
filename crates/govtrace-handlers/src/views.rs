//! On-chain view abstractions the insight handlers read through, kept as
//! traits so comparison and formatting logic is testable without an RPC
//! connection — mirrors `EvmRpc` in the proxy resolver.

use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AssetConfig {
    pub price_feed: String,
    pub decimals: u8,
    pub borrow_collateral_factor: String,
    pub liquidate_collateral_factor: String,
    pub liquidation_factor: String,
    pub supply_cap: String,
}

#[async_trait]
pub trait ConfiguratorView: Send + Sync {
    /// Reads the asset's current on-chain configuration off the comet
    /// proxy itself (`getAssetInfoByAddress`). `None` when the asset is
    /// not yet configured (a pure addition rather than an update).
    async fn asset_config(&self, comet: &str, asset: &str) -> Option<AssetConfig>;

    /// The untrusted on-chain `symbol()` fallback.
    async fn symbol(&self, address: &str) -> Option<String>;
}

#[async_trait]
pub trait PriceFeedView: Send + Sync {
    async fn description(&self, feed: &str) -> Option<String>;
    async fn decimals(&self, feed: &str) -> Option<u8>;
    /// The raw `latestAnswer()` value, as a decimal string.
    async fn latest_answer(&self, feed: &str) -> Option<String>;

    async fn snapshot_ratio(&self, _feed: &str) -> Option<String> {
        None
    }
    async fn snapshot_timestamp(&self, _feed: &str) -> Option<u64> {
        None
    }
    async fn ratio_provider(&self, _feed: &str) -> Option<String> {
        None
    }
    async fn provider_ratio_at(&self, _provider: &str, _timestamp: u64) -> Option<String> {
        None
    }
}

#[async_trait]
pub trait CometView: Send + Sync {
    async fn tracking_index_scale(&self, comet: &str) -> Option<String>;
    async fn base_tracking_supply_speed(&self, comet: &str) -> Option<String>;
    async fn base_tracking_borrow_speed(&self, comet: &str) -> Option<String>;
}

#[async_trait]
pub trait PriceReference: Send + Sync {
    /// A reference USD price for a symbol, from whatever external price
    /// feed the caller wires in. `None` when unavailable — deviation
    /// reporting is skipped rather than failing the decode.
    async fn usd_price(&self, symbol: &str) -> Option<f64>;
}
