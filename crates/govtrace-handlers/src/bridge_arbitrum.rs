//! The Arbitrum delayed-inbox gateway: a single opaque calldata blob
//! destined for a named L2 receiver, wrapped in `createRetryableTicket`.

use std::collections::HashSet;

use async_trait::async_trait;

use govtrace_core::{CallEdge, ChainId, ChildRequest};

use crate::context::{HandlerContext, HandlerOutput};
use crate::error::HandlerError;
use crate::registry::Handler;
use crate::util::{as_address, as_decimal, decode_hex_bytes};

pub struct ArbitrumInboxHandler {
    gateways: HashSet<String>,
    destination_chain: ChainId,
}

impl ArbitrumInboxHandler {
    pub fn new(gateways: impl IntoIterator<Item = String>, destination_chain: ChainId) -> Self {
        ArbitrumInboxHandler {
            gateways: gateways.into_iter().map(|a| a.to_lowercase()).collect(),
            destination_chain,
        }
    }
}

#[async_trait]
impl Handler for ArbitrumInboxHandler {
    fn name(&self) -> &str {
        "arbitrum_inbox"
    }

    fn matches(&self, ctx: &HandlerContext) -> bool {
        self.gateways.contains(&ctx.target.to_lowercase()) && ctx.function_name() == Some("createRetryableTicket")
    }

    async fn expand(&self, ctx: &HandlerContext) -> Result<HandlerOutput, HandlerError> {
        let func = ctx.parsed.as_ref().ok_or_else(|| HandlerError::MissingArg("parsed".into()))?;

        let to = func
            .arg("to")
            .and_then(as_address)
            .ok_or_else(|| HandlerError::MissingArg("to".into()))?
            .to_string();
        let l2_call_value = func
            .arg("l2CallValue")
            .and_then(as_decimal)
            .ok_or_else(|| HandlerError::MissingArg("l2CallValue".into()))?
            .to_string();
        let data = func.arg("data").ok_or_else(|| HandlerError::MissingArg("data".into()))?;
        let data_hex = match data {
            govtrace_core::ArgValue::Bytes(s) => s.as_str(),
            _ => return Err(HandlerError::MissingArg("data".into())),
        };
        let calldata = decode_hex_bytes(data_hex).ok_or_else(|| HandlerError::Malformed("data is not valid hex".into()))?;

        let child = ChildRequest {
            edge: CallEdge::Bridge { label: "Arbitrum Bridge".to_string() },
            chain_id: self.destination_chain,
            target: to,
            value_wei: l2_call_value,
            raw_calldata: calldata,
        };
        Ok(HandlerOutput::children(vec![child]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use govtrace_core::{ArgValue, DecodedFunction, ParamInfo};

    fn decoded_call(to: &str, l2_call_value: &str, data: &str) -> DecodedFunction {
        DecodedFunction {
            name: "createRetryableTicket".into(),
            signature: "createRetryableTicket(address,uint256,uint256,address,address,uint256,uint256,bytes)".into(),
            selector: "0xdead".into(),
            args: vec![
                ArgValue::Address(to.into()),
                ArgValue::Uint(l2_call_value.into()),
                ArgValue::Bytes(data.into()),
            ],
            arg_types: vec!["address".into(), "uint256".into(), "bytes".into()],
            arg_param_info: vec![
                ParamInfo { name: Some("to".into()), base_type: "address".into(), ty: "address".into(), components: None, array_children: None },
                ParamInfo { name: Some("l2CallValue".into()), base_type: "uint".into(), ty: "uint256".into(), components: None, array_children: None },
                ParamInfo { name: Some("data".into()), base_type: "bytes".into(), ty: "bytes".into(), components: None, array_children: None },
            ],
            arg_sources: None,
            address_metadata: None,
        }
    }

    fn ctx(func: DecodedFunction) -> HandlerContext {
        HandlerContext {
            chain_id: ChainId::MAINNET,
            target: "0xGateway".into(),
            value_wei: "0".into(),
            raw_calldata: vec![],
            parsed: Some(func),
            track_sources: false,
        }
    }

    #[tokio::test]
    async fn expands_into_one_child_on_the_destination_chain() {
        let handler = ArbitrumInboxHandler::new(["0xgateway".to_string()], ChainId::ARBITRUM);
        let context = ctx(decoded_call("0xReceiver", "1000000000000000", "0xa9059cbb"));
        assert!(handler.matches(&context));

        let output = handler.expand(&context).await.unwrap();
        assert_eq!(output.children.len(), 1);
        let child = &output.children[0];
        assert_eq!(child.chain_id, ChainId::ARBITRUM);
        assert_eq!(child.target, "0xReceiver");
        assert_eq!(child.raw_calldata, vec![0xa9, 0x05, 0x9c, 0xbb]);
    }

    #[tokio::test]
    async fn does_not_match_other_functions() {
        let handler = ArbitrumInboxHandler::new(["0xgateway".to_string()], ChainId::ARBITRUM);
        let mut func = decoded_call("0xReceiver", "0", "0x");
        func.name = "depositEth".to_string();
        assert!(!handler.matches(&ctx(func)));
    }
}
