//! `updateAssetPriceFeed` / `setBaseTokenPriceFeed`: reads the new feed's
//! description and latest answer, compares it against an external
//! reference price, and — for ratio-snapshot oracles — cross-checks the
//! snapshot against the ratio provider's current value.

use async_trait::async_trait;

use govtrace_core::{CallInsight, CallInsightEntry};

use crate::context::{HandlerContext, HandlerOutput};
use crate::error::HandlerError;
use crate::registry::Handler;
use crate::util::as_address;
use crate::views::{PriceFeedView, PriceReference};

const DEVIATION_WARNING_THRESHOLD: f64 = 0.05;

fn scaled_price(raw_answer: &str, decimals: u8) -> Option<f64> {
    let raw: f64 = raw_answer.parse().ok()?;
    Some(raw / 10f64.powi(decimals as i32))
}

fn parse_denominator(description: &str) -> Option<&str> {
    description.split('/').nth(1).map(|s| s.trim())
}

pub struct PriceFeedHandler<'a> {
    feed: &'a dyn PriceFeedView,
    reference: &'a dyn PriceReference,
}

impl<'a> PriceFeedHandler<'a> {
    pub fn new(feed: &'a dyn PriceFeedView, reference: &'a dyn PriceReference) -> Self {
        PriceFeedHandler { feed, reference }
    }
}

#[async_trait]
impl Handler for PriceFeedHandler<'_> {
    fn name(&self) -> &str {
        "price_feed"
    }

    fn matches(&self, ctx: &HandlerContext) -> bool {
        matches!(ctx.function_name(), Some("updateAssetPriceFeed") | Some("setBaseTokenPriceFeed"))
    }

    async fn expand(&self, ctx: &HandlerContext) -> Result<HandlerOutput, HandlerError> {
        let func = ctx.parsed.as_ref().ok_or_else(|| HandlerError::MissingArg("parsed".into()))?;
        let new_feed = func
            .arg("newPriceFeed")
            .or_else(|| func.arg("priceFeed"))
            .and_then(as_address)
            .ok_or_else(|| HandlerError::MissingArg("newPriceFeed".into()))?;

        let description = self.feed.description(new_feed).await;
        let decimals = self.feed.decimals(new_feed).await.unwrap_or(8);
        let raw_answer = self.feed.latest_answer(new_feed).await;

        let mut entries = Vec::new();
        entries.push(CallInsightEntry {
            label: "Price Feed".to_string(),
            value: new_feed.to_string(),
            metadata: None,
            warning: false,
        });

        let price = raw_answer.as_deref().and_then(|a| scaled_price(a, decimals));
        if let Some(price) = price {
            entries.push(CallInsightEntry {
                label: "Oracle Price".to_string(),
                value: format!("≈ {price:.2}"),
                metadata: None,
                warning: false,
            });
        }

        let symbol = description.as_deref().and_then(parse_denominator);
        if let (Some(symbol), Some(price)) = (symbol, price) {
            if let Some(reference_price) = self.reference.usd_price(symbol).await {
                let deviation = (price - reference_price).abs() / reference_price;
                entries.push(CallInsightEntry {
                    label: "Price Deviation".to_string(),
                    value: format!("{:.2}%", deviation * 100.0),
                    metadata: None,
                    warning: deviation > DEVIATION_WARNING_THRESHOLD,
                });
            }
        }

        if let Some(provider) = self.feed.ratio_provider(new_feed).await {
            let snapshot_ratio = self.feed.snapshot_ratio(new_feed).await;
            let snapshot_timestamp = self.feed.snapshot_timestamp(new_feed).await;
            if let (Some(snapshot_ratio), Some(timestamp)) = (snapshot_ratio, snapshot_timestamp) {
                let current_ratio = self.feed.provider_ratio_at(&provider, timestamp).await;
                let matches = current_ratio.as_deref() == Some(snapshot_ratio.as_str());
                entries.push(CallInsightEntry {
                    label: "Snapshot Ratio".to_string(),
                    value: if matches { format!("{snapshot_ratio} (matches provider)") } else { format!("{snapshot_ratio} (provider reports {current_ratio:?})") },
                    metadata: None,
                    warning: !matches,
                });
            }
        }

        let insight = CallInsight { title: "Price Feed Update".to_string(), entries, handler_source: Some(self.name().to_string()) };
        Ok(HandlerOutput::insights(vec![insight]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use govtrace_core::{ArgValue, ChainId, DecodedFunction, ParamInfo};

    struct FixtureFeed {
        description: String,
        decimals: u8,
        answer: String,
    }

    #[async_trait]
    impl PriceFeedView for FixtureFeed {
        async fn description(&self, _feed: &str) -> Option<String> {
            Some(self.description.clone())
        }
        async fn decimals(&self, _feed: &str) -> Option<u8> {
            Some(self.decimals)
        }
        async fn latest_answer(&self, _feed: &str) -> Option<String> {
            Some(self.answer.clone())
        }
    }

    struct FixtureReference(f64);

    #[async_trait]
    impl PriceReference for FixtureReference {
        async fn usd_price(&self, _symbol: &str) -> Option<f64> {
            Some(self.0)
        }
    }

    fn ctx() -> HandlerContext {
        let func = DecodedFunction {
            name: "setBaseTokenPriceFeed".into(),
            signature: "setBaseTokenPriceFeed(address,address)".into(),
            selector: "0xdead".into(),
            args: vec![ArgValue::Address("0xComet".into()), ArgValue::Address("0xNewFeed".into())],
            arg_types: vec!["address".into(), "address".into()],
            arg_param_info: vec![
                ParamInfo { name: Some("cometProxy".into()), base_type: "address".into(), ty: "address".into(), components: None, array_children: None },
                ParamInfo { name: Some("newPriceFeed".into()), base_type: "address".into(), ty: "address".into(), components: None, array_children: None },
            ],
            arg_sources: None,
            address_metadata: None,
        };
        HandlerContext { chain_id: ChainId::MAINNET, target: "0xConfigurator".into(), value_wei: "0".into(), raw_calldata: vec![], parsed: Some(func), track_sources: false }
    }

    #[tokio::test]
    async fn reports_oracle_price_and_deviation_under_threshold() {
        let feed = FixtureFeed { description: "USDC / USD".into(), decimals: 8, answer: "100010000".into() };
        let reference = FixtureReference(1.0);
        let handler = PriceFeedHandler::new(&feed, &reference);

        let output = handler.expand(&ctx()).await.unwrap();
        let insight = &output.insights[0];
        let price_row = insight.entries.iter().find(|e| e.label == "Oracle Price").unwrap();
        assert_eq!(price_row.value, "≈ 1.00");
        let deviation_row = insight.entries.iter().find(|e| e.label == "Price Deviation").unwrap();
        assert!(!deviation_row.warning);
    }

    #[tokio::test]
    async fn deviation_above_threshold_is_flagged() {
        let feed = FixtureFeed { description: "USDC / USD".into(), decimals: 8, answer: "110000000".into() };
        let reference = FixtureReference(1.0);
        let handler = PriceFeedHandler::new(&feed, &reference);

        let output = handler.expand(&ctx()).await.unwrap();
        let insight = &output.insights[0];
        let deviation_row = insight.entries.iter().find(|e| e.label == "Price Deviation").unwrap();
        assert!(deviation_row.warning);
    }
}
