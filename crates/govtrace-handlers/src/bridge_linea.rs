//! The Linea message service's batch relay: an explicit
//! `(address[], uint256[], string[], bytes[])` quadruple, one child per
//! sub-action, each calldata prefixed with the selector its signature
//! derives.

use std::collections::HashSet;

use async_trait::async_trait;

use govtrace_core::{CallEdge, ChainId, ChildRequest};

use crate::context::{HandlerContext, HandlerOutput};
use crate::error::HandlerError;
use crate::registry::Handler;
use crate::util::{as_address, as_array, as_bytes_hex, as_decimal, as_str, decode_hex_bytes, selector4};

pub struct LineaBridgeHandler {
    gateways: HashSet<String>,
}

impl LineaBridgeHandler {
    pub fn new(gateways: impl IntoIterator<Item = String>) -> Self {
        LineaBridgeHandler { gateways: gateways.into_iter().map(|a| a.to_lowercase()).collect() }
    }
}

#[async_trait]
impl Handler for LineaBridgeHandler {
    fn name(&self) -> &str {
        "linea_bridge"
    }

    fn matches(&self, ctx: &HandlerContext) -> bool {
        self.gateways.contains(&ctx.target.to_lowercase()) && ctx.function_name() == Some("sendMessageBatch")
    }

    async fn expand(&self, ctx: &HandlerContext) -> Result<HandlerOutput, HandlerError> {
        let func = ctx.parsed.as_ref().ok_or_else(|| HandlerError::MissingArg("parsed".into()))?;

        let targets = func.arg("targets").and_then(as_array).ok_or_else(|| HandlerError::MissingArg("targets".into()))?;
        let values = func.arg("values").and_then(as_array).ok_or_else(|| HandlerError::MissingArg("values".into()))?;
        let signatures = func.arg("signatures").and_then(as_array).ok_or_else(|| HandlerError::MissingArg("signatures".into()))?;
        let calldatas = func.arg("calldatas").and_then(as_array).ok_or_else(|| HandlerError::MissingArg("calldatas".into()))?;

        if targets.len() != values.len() || targets.len() != signatures.len() || targets.len() != calldatas.len() {
            return Err(HandlerError::Malformed("targets/values/signatures/calldatas length mismatch".into()));
        }

        let mut children = Vec::with_capacity(targets.len());
        for i in 0..targets.len() {
            let target = as_address(&targets[i]).ok_or_else(|| HandlerError::Malformed("targets[i] is not an address".into()))?;
            let value = as_decimal(&values[i]).ok_or_else(|| HandlerError::Malformed("values[i] is not an integer".into()))?;
            let signature = as_str(&signatures[i]).ok_or_else(|| HandlerError::Malformed("signatures[i] is not a string".into()))?;
            let calldata_hex = as_bytes_hex(&calldatas[i]).ok_or_else(|| HandlerError::Malformed("calldatas[i] is not bytes".into()))?;
            let mut raw_calldata = selector4(signature).to_vec();
            raw_calldata.extend(decode_hex_bytes(calldata_hex).ok_or_else(|| HandlerError::Malformed("calldatas[i] is not valid hex".into()))?);

            children.push(ChildRequest {
                edge: CallEdge::Bridge { label: format!("Linea Bridge #{i}") },
                chain_id: ChainId::LINEA,
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
    use govtrace_core::{ArgValue, DecodedFunction, ParamInfo};

    fn array_param(name: &str, base_type: &str, ty: &str) -> ParamInfo {
        ParamInfo { name: Some(name.into()), base_type: base_type.into(), ty: ty.into(), components: None, array_children: None }
    }

    fn decoded_batch() -> DecodedFunction {
        DecodedFunction {
            name: "sendMessageBatch".into(),
            signature: "sendMessageBatch(address[],uint256[],string[],bytes[])".into(),
            selector: "0xdead".into(),
            args: vec![
                ArgValue::Array(vec![ArgValue::Address("0x1111111111111111111111111111111111111111".into()), ArgValue::Address("0x2222222222222222222222222222222222222222".into())]),
                ArgValue::Array(vec![ArgValue::Uint("0".into()), ArgValue::Uint("5".into())]),
                ArgValue::Array(vec![ArgValue::Str("transfer(address,uint256)".into()), ArgValue::Str("approve(address,uint256)".into())]),
                ArgValue::Array(vec![ArgValue::Bytes("0x1234".into()), ArgValue::Bytes("0x5678".into())]),
            ],
            arg_types: vec!["address[]".into(), "uint256[]".into(), "string[]".into(), "bytes[]".into()],
            arg_param_info: vec![
                array_param("targets", "array", "address[]"),
                array_param("values", "array", "uint256[]"),
                array_param("signatures", "array", "string[]"),
                array_param("calldatas", "array", "bytes[]"),
            ],
            arg_sources: None,
            address_metadata: None,
        }
    }

    #[tokio::test]
    async fn expands_one_child_per_sub_action_labeled_and_indexed() {
        let handler = LineaBridgeHandler::new(["0xgateway".to_string()]);
        let ctx = HandlerContext {
            chain_id: ChainId::MAINNET,
            target: "0xGateway".into(),
            value_wei: "0".into(),
            raw_calldata: vec![],
            parsed: Some(decoded_batch()),
            track_sources: false,
        };
        assert!(handler.matches(&ctx));

        let output = handler.expand(&ctx).await.unwrap();
        assert_eq!(output.children.len(), 2);
        assert_eq!(output.children[0].chain_id, ChainId::LINEA);
        match &output.children[0].edge {
            CallEdge::Bridge { label } => assert_eq!(label, "Linea Bridge #0"),
            _ => panic!("expected a bridge edge"),
        }
        assert_eq!(&output.children[0].raw_calldata[..4], &selector4("transfer(address,uint256)"));
        assert_eq!(&output.children[0].raw_calldata[4..], &[0x12, 0x34]);
    }
}
