//! Configurator's `updateAsset`: one row per changed collateral field,
//! a hard warning on a zero supply cap, and an asset-symbol lookup that
//! flags itself when only an untrusted source could name the asset.

use async_trait::async_trait;

use govtrace_core::{ArgValue, CallInsight, CallInsightEntry, ChainId, DataSource};
use govtrace_metadata::reconcile::{resolve_longest, Candidate};
use govtrace_metadata::{CuratedMaps, StaticDeploymentIndex};

use crate::context::{HandlerContext, HandlerOutput};
use crate::error::HandlerError;
use crate::registry::Handler;
use crate::util::{as_address, as_decimal, tuple_field};
use crate::views::{AssetConfig, ConfiguratorView};

fn field_row(label: &str, old: Option<&str>, new: &str) -> CallInsightEntry {
    let value = match old {
        Some(old) if old != new => format!("{old} → {new}"),
        Some(_) => format!("{new} (unchanged)"),
        None => format!("{new} (new)"),
    };
    CallInsightEntry { label: label.to_string(), value, metadata: None, warning: false }
}

fn untrusted(source: &DataSource) -> bool {
    matches!(source, DataSource::OnChain { .. } | DataSource::EtherscanSourcecode { .. })
}

pub struct UpdateAssetHandler<'a> {
    configurator: &'a dyn ConfiguratorView,
    static_index: &'a StaticDeploymentIndex,
    curated: &'a CuratedMaps,
}

impl<'a> UpdateAssetHandler<'a> {
    pub fn new(
        configurator: &'a dyn ConfiguratorView,
        static_index: &'a StaticDeploymentIndex,
        curated: &'a CuratedMaps,
    ) -> Self {
        UpdateAssetHandler { configurator, static_index, curated }
    }

    async fn resolve_symbol(&self, chain_id: ChainId, asset: &str) -> Option<Candidate> {
        let mut candidates = Vec::new();
        if let Some(entry) = self.static_index.get(chain_id.0, asset) {
            if let Some(symbol) = &entry.token_symbol {
                candidates.push(Candidate {
                    value: symbol.clone(),
                    source: DataSource::StaticMetadata {
                        path: "static_index".into(),
                        key: asset.to_string(),
                        market: None,
                    },
                });
            }
        }
        if let Some(entry) = self.curated.token(chain_id.0, asset) {
            candidates.push(Candidate {
                value: entry.symbol.clone(),
                source: DataSource::Hardcoded { location: "curated_token_list".into(), reason: "curated".into() },
            });
        }
        if let Some(symbol) = self.configurator.symbol(asset).await {
            candidates.push(Candidate {
                value: symbol,
                source: DataSource::OnChain {
                    chain_id: chain_id.0,
                    address: asset.to_string(),
                    method: "symbol()".into(),
                    args: vec![],
                    cast_command: None,
                },
            });
        }
        resolve_longest(&candidates)
    }
}

#[async_trait]
impl Handler for UpdateAssetHandler<'_> {
    fn name(&self) -> &str {
        "update_asset"
    }

    fn matches(&self, ctx: &HandlerContext) -> bool {
        ctx.function_name() == Some("updateAsset")
    }

    async fn expand(&self, ctx: &HandlerContext) -> Result<HandlerOutput, HandlerError> {
        let func = ctx.parsed.as_ref().ok_or_else(|| HandlerError::MissingArg("parsed".into()))?;
        let configuration =
            func.arg("configuration").ok_or_else(|| HandlerError::MissingArg("configuration".into()))?;

        let comet = tuple_field(configuration, "cometProxy")
            .and_then(as_address)
            .ok_or_else(|| HandlerError::MissingArg("cometProxy".into()))?;
        let asset_config = tuple_field(configuration, "assetConfig")
            .ok_or_else(|| HandlerError::MissingArg("assetConfig".into()))?;

        let asset = tuple_field(asset_config, "asset")
            .and_then(as_address)
            .ok_or_else(|| HandlerError::MissingArg("asset".into()))?;
        let price_feed = tuple_field(asset_config, "priceFeed").and_then(as_address).unwrap_or("");
        let decimals = tuple_field(asset_config, "decimals").and_then(as_decimal).unwrap_or("0");
        let borrow_cf = tuple_field(asset_config, "borrowCollateralFactor").and_then(as_decimal).unwrap_or("0");
        let liquidate_cf = tuple_field(asset_config, "liquidateCollateralFactor").and_then(as_decimal).unwrap_or("0");
        let liquidation_factor = tuple_field(asset_config, "liquidationFactor").and_then(as_decimal).unwrap_or("0");
        let supply_cap = tuple_field(asset_config, "supplyCap").and_then(as_decimal).unwrap_or("0");

        let current = self.configurator.asset_config(comet, asset).await;

        let symbol = self.resolve_symbol(ctx.chain_id, asset).await;
        let display_name = symbol.as_ref().map(|c| c.value.clone()).unwrap_or_else(|| asset.to_string());

        let current_decimals = current.as_ref().map(|c| c.decimals.to_string());
        let mut entries = vec![
            field_row("Price Feed", current.as_ref().map(|c| c.price_feed.as_str()), price_feed),
            field_row("Decimals", current_decimals.as_deref(), decimals),
            field_row("Borrow Collateral Factor", current.as_ref().map(|c| c.borrow_collateral_factor.as_str()), borrow_cf),
            field_row("Liquidate Collateral Factor", current.as_ref().map(|c| c.liquidate_collateral_factor.as_str()), liquidate_cf),
            field_row("Liquidation Factor", current.as_ref().map(|c| c.liquidation_factor.as_str()), liquidation_factor),
            field_row("Supply Cap", current.as_ref().map(|c| c.supply_cap.as_str()), supply_cap),
        ];
        entries[5].warning = supply_cap == "0";
        if supply_cap == "0" {
            entries.push(CallInsightEntry {
                label: "⚠️ WARNING".to_string(),
                value: "supply cap is zero".to_string(),
                metadata: None,
                warning: true,
            });
        }

        if let Some(candidate) = &symbol {
            if untrusted(&candidate.source) {
                entries.push(CallInsightEntry {
                    label: "⚠️ WARNING".to_string(),
                    value: "unverified asset symbol".to_string(),
                    metadata: None,
                    warning: true,
                });
            }
        }

        let insight = CallInsight {
            title: format!("Asset Config: {display_name}"),
            entries,
            handler_source: Some(self.name().to_string()),
        };
        Ok(HandlerOutput::insights(vec![insight]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use govtrace_core::{DecodedFunction, ParamInfo};
    use govtrace_metadata::TokenListEntry;

    struct FixtureConfigurator {
        config: Option<AssetConfig>,
        symbol: Option<String>,
    }

    #[async_trait]
    impl ConfiguratorView for FixtureConfigurator {
        async fn asset_config(&self, _comet: &str, _asset: &str) -> Option<AssetConfig> {
            self.config.clone()
        }
        async fn symbol(&self, _address: &str) -> Option<String> {
            self.symbol.clone()
        }
    }

    fn tuple_param(name: &str) -> ParamInfo {
        ParamInfo { name: Some(name.into()), base_type: "tuple".into(), ty: "tuple".into(), components: None, array_children: None }
    }

    fn asset_config_arg(supply_cap: &str) -> ArgValue {
        ArgValue::Tuple(vec![
            ("cometProxy".into(), ArgValue::Address("0xComet".into())),
            (
                "assetConfig".into(),
                ArgValue::Tuple(vec![
                    ("asset".into(), ArgValue::Address("0xAsset".into())),
                    ("priceFeed".into(), ArgValue::Address("0xFeed".into())),
                    ("decimals".into(), ArgValue::Uint("6".into())),
                    ("borrowCollateralFactor".into(), ArgValue::Uint("750000000000000000".into())),
                    ("liquidateCollateralFactor".into(), ArgValue::Uint("800000000000000000".into())),
                    ("liquidationFactor".into(), ArgValue::Uint("950000000000000000".into())),
                    ("supplyCap".into(), ArgValue::Uint(supply_cap.into())),
                ]),
            ),
        ])
    }

    fn ctx(supply_cap: &str) -> HandlerContext {
        let func = DecodedFunction {
            name: "updateAsset".into(),
            signature: "updateAsset((address,(address,address,uint8,uint64,uint64,uint64,uint128)))".into(),
            selector: "0xdead".into(),
            args: vec![asset_config_arg(supply_cap)],
            arg_types: vec!["tuple".into()],
            arg_param_info: vec![tuple_param("configuration")],
            arg_sources: None,
            address_metadata: None,
        };
        HandlerContext {
            chain_id: ChainId::MAINNET,
            target: "0xConfigurator".into(),
            value_wei: "0".into(),
            raw_calldata: vec![],
            parsed: Some(func),
            track_sources: false,
        }
    }

    #[tokio::test]
    async fn zero_supply_cap_emits_a_hard_warning_row() {
        let configurator = FixtureConfigurator { config: None, symbol: Some("WETH".into()) };
        let static_index = StaticDeploymentIndex::new();
        let curated = CuratedMaps::new();
        let handler = UpdateAssetHandler::new(&configurator, &static_index, &curated);

        let output = handler.expand(&ctx("0")).await.unwrap();
        assert_eq!(output.insights.len(), 1);
        let insight = &output.insights[0];
        assert!(insight.entries.iter().any(|e| e.label == "⚠️ WARNING" && e.value.contains("supply cap")));
        assert!(insight.entries.iter().any(|e| e.label == "⚠️ WARNING" && e.value.contains("unverified")));
    }

    #[tokio::test]
    async fn trusted_symbol_source_suppresses_the_unverified_warning() {
        let configurator = FixtureConfigurator { config: None, symbol: Some("onchain-guess".into()) };
        let static_index = StaticDeploymentIndex::new();
        let mut curated = CuratedMaps::new();
        curated.insert_token(1, "0xAsset", TokenListEntry { symbol: "WETH".into(), name: None });
        let handler = UpdateAssetHandler::new(&configurator, &static_index, &curated);

        let output = handler.expand(&ctx("1000000")).await.unwrap();
        let insight = &output.insights[0];
        assert_eq!(insight.title, "Asset Config: WETH");
        assert!(!insight.entries.iter().any(|e| e.label == "⚠️ WARNING" && e.value.contains("unverified")));
        assert!(!insight.entries.iter().any(|e| e.value.contains("supply cap")));
    }

    #[tokio::test]
    async fn changed_field_renders_as_old_arrow_new() {
        let configurator = FixtureConfigurator {
            config: Some(AssetConfig {
                price_feed: "0xOldFeed".into(),
                decimals: 6,
                borrow_collateral_factor: "700000000000000000".into(),
                liquidate_collateral_factor: "800000000000000000".into(),
                liquidation_factor: "950000000000000000".into(),
                supply_cap: "500000".into(),
            }),
            symbol: None,
        };
        let static_index = StaticDeploymentIndex::new();
        let curated = CuratedMaps::new();
        let handler = UpdateAssetHandler::new(&configurator, &static_index, &curated);

        let output = handler.expand(&ctx("1000000")).await.unwrap();
        let insight = &output.insights[0];
        let supply_row = insight.entries.iter().find(|e| e.label == "Supply Cap").unwrap();
        assert_eq!(supply_row.value, "500000 → 1000000");
        let decimals_row = insight.entries.iter().find(|e| e.label == "Decimals").unwrap();
        assert_eq!(decimals_row.value, "6 (unchanged)");
    }
}
