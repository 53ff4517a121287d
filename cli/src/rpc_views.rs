//! Live `eth_call`-backed implementations of the insight handlers' view
//! traits, talking to Comet/Configurator/Chainlink-shaped contracts
//! directly rather than through a full ABI document.

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::Address;
use async_trait::async_trait;

use govtrace_codec::selector;
use govtrace_handlers::views::{AssetConfig, CometView, ConfiguratorView, PriceFeedView, PriceReference};
use govtrace_proxy::EvmRpc;

fn encode_call(signature: &str, args: &[DynSolValue]) -> Vec<u8> {
    let mut out = selector(signature).to_vec();
    out.extend_from_slice(&DynSolValue::Tuple(args.to_vec()).abi_encode());
    out
}

fn parse_address(value: &str) -> Option<DynSolValue> {
    value.parse::<Address>().ok().map(DynSolValue::Address)
}

async fn call_decode(
    rpc: &dyn EvmRpc,
    target: &str,
    signature: &str,
    args: &[DynSolValue],
    outputs: &[DynSolType],
) -> Option<Vec<DynSolValue>> {
    let calldata = encode_call(signature, args);
    let returned = rpc.call(target, &calldata).await.ok()?;
    let ty = DynSolType::Tuple(outputs.to_vec());
    match ty.abi_decode(&returned).ok()? {
        DynSolValue::Tuple(values) => Some(values),
        other => Some(vec![other]),
    }
}

fn as_uint_string(value: &DynSolValue) -> Option<String> {
    match value {
        DynSolValue::Uint(n, _) => Some(n.to_string()),
        DynSolValue::Int(n, _) => Some(n.to_string()),
        _ => None,
    }
}

fn as_address_string(value: &DynSolValue) -> Option<String> {
    match value {
        DynSolValue::Address(a) => Some(format!("{a:#x}")),
        _ => None,
    }
}

/// Comet's `AssetInfo.scale` is always a power of ten (`10^decimals`), so
/// the digit count of its decimal string minus one recovers `decimals`.
fn scale_to_decimals(scale: &str) -> Option<u8> {
    if scale == "1" {
        return Some(0);
    }
    if !scale.starts_with('1') || !scale[1..].bytes().all(|b| b == b'0') {
        return None;
    }
    (scale.len() - 1).try_into().ok()
}

/// Reads Comet/Configurator/price-feed state over a single chain's RPC.
pub struct RpcViews<'a> {
    pub rpc: &'a dyn EvmRpc,
}

#[async_trait]
impl ConfiguratorView for RpcViews<'_> {
    /// Comet itself, not the Configurator, exposes a convenient
    /// single-asset getter (`getAssetInfoByAddress`); the Configurator's
    /// `getConfiguration(comet)` returns the whole asset array and would
    /// need client-side filtering for no benefit here.
    async fn asset_config(&self, comet: &str, asset: &str) -> Option<AssetConfig> {
        let asset_addr = parse_address(asset)?;
        let outputs = vec![
            DynSolType::Uint(8),
            DynSolType::Address,
            DynSolType::Address,
            DynSolType::Uint(64),
            DynSolType::Uint(64),
            DynSolType::Uint(64),
            DynSolType::Uint(64),
            DynSolType::Uint(128),
        ];
        let values =
            call_decode(self.rpc, comet, "getAssetInfoByAddress(address)", &[asset_addr], &outputs).await?;
        if values.len() != 8 {
            return None;
        }
        let scale = as_uint_string(&values[3])?;
        Some(AssetConfig {
            price_feed: as_address_string(&values[2])?,
            decimals: scale_to_decimals(&scale)?,
            borrow_collateral_factor: as_uint_string(&values[4])?,
            liquidate_collateral_factor: as_uint_string(&values[5])?,
            liquidation_factor: as_uint_string(&values[6])?,
            supply_cap: as_uint_string(&values[7])?,
        })
    }

    async fn symbol(&self, address: &str) -> Option<String> {
        let values = call_decode(self.rpc, address, "symbol()", &[], &[DynSolType::String]).await?;
        match values.into_iter().next()? {
            DynSolValue::String(s) => Some(s),
            _ => None,
        }
    }
}

#[async_trait]
impl CometView for RpcViews<'_> {
    async fn tracking_index_scale(&self, comet: &str) -> Option<String> {
        let values =
            call_decode(self.rpc, comet, "trackingIndexScale()", &[], &[DynSolType::Uint(64)]).await?;
        as_uint_string(values.first()?)
    }

    async fn base_tracking_supply_speed(&self, comet: &str) -> Option<String> {
        let values = call_decode(
            self.rpc,
            comet,
            "baseTrackingSupplySpeed()",
            &[],
            &[DynSolType::Uint(64)],
        )
        .await?;
        as_uint_string(values.first()?)
    }

    async fn base_tracking_borrow_speed(&self, comet: &str) -> Option<String> {
        let values = call_decode(
            self.rpc,
            comet,
            "baseTrackingBorrowSpeed()",
            &[],
            &[DynSolType::Uint(64)],
        )
        .await?;
        as_uint_string(values.first()?)
    }
}

#[async_trait]
impl PriceFeedView for RpcViews<'_> {
    async fn description(&self, feed: &str) -> Option<String> {
        let values = call_decode(self.rpc, feed, "description()", &[], &[DynSolType::String]).await?;
        match values.into_iter().next()? {
            DynSolValue::String(s) => Some(s),
            _ => None,
        }
    }

    async fn decimals(&self, feed: &str) -> Option<u8> {
        let values = call_decode(self.rpc, feed, "decimals()", &[], &[DynSolType::Uint(8)]).await?;
        match values.first()? {
            DynSolValue::Uint(n, _) => (*n).try_into().ok(),
            _ => None,
        }
    }

    async fn latest_answer(&self, feed: &str) -> Option<String> {
        let values = call_decode(self.rpc, feed, "latestAnswer()", &[], &[DynSolType::Int(256)]).await?;
        as_uint_string(values.first()?)
    }
}

/// No external USD price source is wired up for the CLI by default, so
/// price-deviation rows are skipped rather than computed against a stale
/// or invented reference.
pub struct NoPriceReference;

#[async_trait]
impl PriceReference for NoPriceReference {
    async fn usd_price(&self, _symbol: &str) -> Option<f64> {
        None
    }
}
