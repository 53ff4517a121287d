//! `HandlerContext` is the immutable view a handler matches and expands
//! against; `HandlerOutput` is everything it may hand back to the engine.

use govtrace_core::{CallInsight, ChainId, ChildRequest, DecodedFunction};

#[derive(Debug, Clone)]
pub struct HandlerContext {
    pub chain_id: ChainId,
    pub target: String,
    pub value_wei: String,
    pub raw_calldata: Vec<u8>,
    pub parsed: Option<DecodedFunction>,
    pub track_sources: bool,
}

impl HandlerContext {
    /// The decoded function's name, if the call was ABI-decodable.
    pub fn function_name(&self) -> Option<&str> {
        self.parsed.as_ref().map(|f| f.name.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct HandlerOutput {
    pub children: Vec<ChildRequest>,
    pub insights: Vec<CallInsight>,
}

impl HandlerOutput {
    pub fn children(children: Vec<ChildRequest>) -> Self {
        HandlerOutput { children, insights: Vec::new() }
    }

    pub fn insights(insights: Vec<CallInsight>) -> Self {
        HandlerOutput { children: Vec::new(), insights }
    }
}
