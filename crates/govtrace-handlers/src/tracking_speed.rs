//! `setBaseTrackingSupplySpeed` / `setBaseTrackingBorrowSpeed`: scales the
//! raw speed by the market's tracking index scale into a human-readable
//! per-day figure and reports it against the current on-chain value.

use async_trait::async_trait;

use govtrace_core::{CallInsight, CallInsightEntry};

use crate::context::{HandlerContext, HandlerOutput};
use crate::error::HandlerError;
use crate::registry::Handler;
use crate::util::{as_address, as_decimal};
use crate::views::CometView;

const SECONDS_PER_DAY: f64 = 86_400.0;

fn per_day(raw_speed: &str, index_scale: &str) -> Option<f64> {
    let raw: f64 = raw_speed.parse().ok()?;
    let scale: f64 = index_scale.parse().ok()?;
    if scale == 0.0 {
        return None;
    }
    Some(raw / scale * SECONDS_PER_DAY)
}

pub struct TrackingSpeedHandler<'a> {
    comet: &'a dyn CometView,
}

impl<'a> TrackingSpeedHandler<'a> {
    pub fn new(comet: &'a dyn CometView) -> Self {
        TrackingSpeedHandler { comet }
    }
}

#[async_trait]
impl Handler for TrackingSpeedHandler<'_> {
    fn name(&self) -> &str {
        "tracking_speed"
    }

    fn matches(&self, ctx: &HandlerContext) -> bool {
        matches!(ctx.function_name(), Some("setBaseTrackingSupplySpeed") | Some("setBaseTrackingBorrowSpeed"))
    }

    async fn expand(&self, ctx: &HandlerContext) -> Result<HandlerOutput, HandlerError> {
        let func = ctx.parsed.as_ref().ok_or_else(|| HandlerError::MissingArg("parsed".into()))?;
        let is_supply = ctx.function_name() == Some("setBaseTrackingSupplySpeed");

        let comet = func.arg("cometProxy").and_then(as_address).ok_or_else(|| HandlerError::MissingArg("cometProxy".into()))?;
        let new_speed = func.arg("newSpeed").and_then(as_decimal).ok_or_else(|| HandlerError::MissingArg("newSpeed".into()))?;

        let index_scale = self.comet.tracking_index_scale(comet).await;
        let current_speed = if is_supply {
            self.comet.base_tracking_supply_speed(comet).await
        } else {
            self.comet.base_tracking_borrow_speed(comet).await
        };

        let mut entries = vec![CallInsightEntry {
            label: "New Speed (raw)".to_string(),
            value: new_speed.to_string(),
            metadata: None,
            warning: false,
        }];

        if let Some(scale) = &index_scale {
            if let Some(new_per_day) = per_day(new_speed, scale) {
                let value = match current_speed.as_deref().and_then(|s| per_day(s, scale)) {
                    Some(old_per_day) => format!("{old_per_day:.2} → {new_per_day:.2} tokens/day"),
                    None => format!("{new_per_day:.2} tokens/day"),
                };
                entries.push(CallInsightEntry {
                    label: if is_supply { "Supply Speed".to_string() } else { "Borrow Speed".to_string() },
                    value,
                    metadata: None,
                    warning: false,
                });
            }
        }

        let insight = CallInsight {
            title: if is_supply { "Tracking Supply Speed".to_string() } else { "Tracking Borrow Speed".to_string() },
            entries,
            handler_source: Some(self.name().to_string()),
        };
        Ok(HandlerOutput::insights(vec![insight]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use govtrace_core::{ArgValue, ChainId, DecodedFunction, ParamInfo};

    struct FixtureComet {
        index_scale: String,
        current_supply_speed: String,
    }

    #[async_trait]
    impl CometView for FixtureComet {
        async fn tracking_index_scale(&self, _comet: &str) -> Option<String> {
            Some(self.index_scale.clone())
        }
        async fn base_tracking_supply_speed(&self, _comet: &str) -> Option<String> {
            Some(self.current_supply_speed.clone())
        }
        async fn base_tracking_borrow_speed(&self, _comet: &str) -> Option<String> {
            None
        }
    }

    fn ctx(new_speed: &str) -> HandlerContext {
        let func = DecodedFunction {
            name: "setBaseTrackingSupplySpeed".into(),
            signature: "setBaseTrackingSupplySpeed(address,uint64)".into(),
            selector: "0xdead".into(),
            args: vec![ArgValue::Address("0xComet".into()), ArgValue::Uint(new_speed.into())],
            arg_types: vec!["address".into(), "uint64".into()],
            arg_param_info: vec![
                ParamInfo { name: Some("cometProxy".into()), base_type: "address".into(), ty: "address".into(), components: None, array_children: None },
                ParamInfo { name: Some("newSpeed".into()), base_type: "uint".into(), ty: "uint64".into(), components: None, array_children: None },
            ],
            arg_sources: None,
            address_metadata: None,
        };
        HandlerContext { chain_id: ChainId::MAINNET, target: "0xConfigurator".into(), value_wei: "0".into(), raw_calldata: vec![], parsed: Some(func), track_sources: false }
    }

    #[tokio::test]
    async fn reports_old_and_new_speed_scaled_to_per_day() {
        let comet = FixtureComet { index_scale: "1000000".into(), current_supply_speed: "10".into() };
        let handler = TrackingSpeedHandler::new(&comet);

        let output = handler.expand(&ctx("20")).await.unwrap();
        let insight = &output.insights[0];
        let row = insight.entries.iter().find(|e| e.label == "Supply Speed").unwrap();
        assert!(row.value.contains("→"));
    }
}
