//! The mirror receiver side of a bridge: a destination-chain contract
//! that unpacks a batched payload and re-expands it as ordinary
//! multicall children, decoded the same way a local multicall would be.

use std::collections::HashSet;

use async_trait::async_trait;

use govtrace_core::{CallEdge, ChildRequest};

use crate::context::{HandlerContext, HandlerOutput};
use crate::error::HandlerError;
use crate::registry::Handler;
use crate::util::{as_address, as_array, as_bytes_hex, as_decimal, decode_hex_bytes};

const KNOWN_BATCH_FUNCTIONS: &[&str] = &["executeBatch", "multicall", "aggregate"];

pub struct ReceiverMulticallHandler {
    receivers: HashSet<String>,
}

impl ReceiverMulticallHandler {
    pub fn new(receivers: impl IntoIterator<Item = String>) -> Self {
        ReceiverMulticallHandler { receivers: receivers.into_iter().map(|a| a.to_lowercase()).collect() }
    }
}

#[async_trait]
impl Handler for ReceiverMulticallHandler {
    fn name(&self) -> &str {
        "receiver_multicall"
    }

    fn matches(&self, ctx: &HandlerContext) -> bool {
        self.receivers.contains(&ctx.target.to_lowercase())
            && ctx.function_name().map(|n| KNOWN_BATCH_FUNCTIONS.contains(&n)).unwrap_or(false)
    }

    async fn expand(&self, ctx: &HandlerContext) -> Result<HandlerOutput, HandlerError> {
        let func = ctx.parsed.as_ref().ok_or_else(|| HandlerError::MissingArg("parsed".into()))?;

        let targets = func.arg("targets").and_then(as_array).ok_or_else(|| HandlerError::MissingArg("targets".into()))?;
        let values = func.arg("values").and_then(as_array);
        let calldatas = func.arg("calldatas").and_then(as_array).ok_or_else(|| HandlerError::MissingArg("calldatas".into()))?;

        if targets.len() != calldatas.len() {
            return Err(HandlerError::Malformed("targets/calldatas length mismatch".into()));
        }

        let mut children = Vec::with_capacity(targets.len());
        for i in 0..targets.len() {
            let target = as_address(&targets[i]).ok_or_else(|| HandlerError::Malformed("targets[i] is not an address".into()))?;
            let value = values.and_then(|v| v.get(i)).and_then(as_decimal).unwrap_or("0");
            let calldata_hex = as_bytes_hex(&calldatas[i]).ok_or_else(|| HandlerError::Malformed("calldatas[i] is not bytes".into()))?;
            let raw_calldata = decode_hex_bytes(calldata_hex).ok_or_else(|| HandlerError::Malformed("calldatas[i] is not valid hex".into()))?;

            children.push(ChildRequest {
                edge: CallEdge::Multicall { index: i },
                chain_id: ctx.chain_id,
                target: target.to_string(),
                value_wei: value.to_string(),
                raw_calldata,
            });
        }
        Ok(HandlerOutput::children(children))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use govtrace_core::{ArgValue, ChainId, DecodedFunction, ParamInfo};

    fn array_param(name: &str) -> ParamInfo {
        ParamInfo { name: Some(name.into()), base_type: "array".into(), ty: "array".into(), components: None, array_children: None }
    }

    #[tokio::test]
    async fn re_expands_the_batch_on_the_same_chain() {
        let handler = ReceiverMulticallHandler::new(["0xreceiver".to_string()]);
        let func = DecodedFunction {
            name: "executeBatch".into(),
            signature: "executeBatch(address[],bytes[])".into(),
            selector: "0xdead".into(),
            args: vec![
                ArgValue::Array(vec![ArgValue::Address("0x1111111111111111111111111111111111111111".into())]),
                ArgValue::Array(vec![ArgValue::Bytes("0xabcd".into())]),
            ],
            arg_types: vec!["address[]".into(), "bytes[]".into()],
            arg_param_info: vec![array_param("targets"), array_param("calldatas")],
            arg_sources: None,
            address_metadata: None,
        };
        let ctx = HandlerContext {
            chain_id: ChainId::ARBITRUM,
            target: "0xReceiver".into(),
            value_wei: "0".into(),
            raw_calldata: vec![],
            parsed: Some(func),
            track_sources: false,
        };
        assert!(handler.matches(&ctx));
        let output = handler.expand(&ctx).await.unwrap();
        assert_eq!(output.children.len(), 1);
        assert_eq!(output.children[0].chain_id, ChainId::ARBITRUM);
        assert!(matches!(output.children[0].edge, CallEdge::Multicall { index: 0 }));
    }
}
