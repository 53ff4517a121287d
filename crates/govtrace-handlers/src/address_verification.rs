//! Warns when a call target is absent from the static deployment index.
//! The dedup set is scoped per-proposal-per-address: every distinct
//! missing address gets exactly one warning per `decodeProposal` call,
//! never suppressed by sibling repeats and never shared across decodes.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use govtrace_core::{CallInsight, CallInsightEntry};
use govtrace_metadata::StaticDeploymentIndex;

use crate::context::{HandlerContext, HandlerOutput};
use crate::error::HandlerError;
use crate::registry::Handler;

pub struct AddressVerificationHandler<'a> {
    static_index: &'a StaticDeploymentIndex,
    seen: Mutex<HashSet<(u64, String)>>,
}

impl<'a> AddressVerificationHandler<'a> {
    pub fn new(static_index: &'a StaticDeploymentIndex) -> Self {
        AddressVerificationHandler { static_index, seen: Mutex::new(HashSet::new()) }
    }

    /// Call once at the start of each `decodeProposal` invocation so the
    /// dedup set never leaks across decodes.
    pub fn reset(&self) {
        self.seen.lock().unwrap().clear();
    }
}

#[async_trait]
impl Handler for AddressVerificationHandler<'_> {
    fn name(&self) -> &str {
        "address_verification"
    }

    fn matches(&self, ctx: &HandlerContext) -> bool {
        !self.static_index.contains(ctx.chain_id.0, &ctx.target)
    }

    async fn expand(&self, ctx: &HandlerContext) -> Result<HandlerOutput, HandlerError> {
        let key = (ctx.chain_id.0, ctx.target.to_lowercase());
        let mut seen = self.seen.lock().unwrap();
        if !seen.insert(key) {
            return Ok(HandlerOutput::default());
        }
        drop(seen);

        let insight = CallInsight {
            title: "Address Verification".to_string(),
            entries: vec![CallInsightEntry {
                label: "Unrecognized target".to_string(),
                value: ctx.target.clone(),
                metadata: None,
                warning: true,
            }],
            handler_source: Some(self.name().to_string()),
        };
        Ok(HandlerOutput::insights(vec![insight]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use govtrace_core::ChainId;

    fn ctx(target: &str) -> HandlerContext {
        HandlerContext {
            chain_id: ChainId::MAINNET,
            target: target.into(),
            value_wei: "0".into(),
            raw_calldata: vec![],
            parsed: None,
            track_sources: false,
        }
    }

    #[tokio::test]
    async fn warns_once_per_distinct_address_per_decode() {
        let index = StaticDeploymentIndex::new();
        let handler = AddressVerificationHandler::new(&index);

        let first = handler.expand(&ctx("0xUnknown")).await.unwrap();
        assert_eq!(first.insights.len(), 1);

        let second = handler.expand(&ctx("0xUnknown")).await.unwrap();
        assert!(second.insights.is_empty());

        let third = handler.expand(&ctx("0xOtherUnknown")).await.unwrap();
        assert_eq!(third.insights.len(), 1);
    }

    #[tokio::test]
    async fn reset_clears_the_dedup_set_for_a_new_decode() {
        let index = StaticDeploymentIndex::new();
        let handler = AddressVerificationHandler::new(&index);
        handler.expand(&ctx("0xUnknown")).await.unwrap();
        handler.reset();
        let after_reset = handler.expand(&ctx("0xUnknown")).await.unwrap();
        assert_eq!(after_reset.insights.len(), 1);
    }
}
