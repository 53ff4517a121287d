//! The ordered handler list. `apply` runs every matching handler and
//! concatenates their outputs in registry order; a failing handler
//! degrades to a note rather than failing the node.

use async_trait::async_trait;

use crate::context::{HandlerContext, HandlerOutput};
use crate::error::HandlerError;
use govtrace_core::{CallInsight, ChildRequest};

#[async_trait]
pub trait Handler: Send + Sync {
    fn name(&self) -> &str;

    /// Pure; no I/O. Typical predicates: selector equality, target-address
    /// membership, or a combination.
    fn matches(&self, ctx: &HandlerContext) -> bool;

    /// May perform I/O. Must be deterministic given the same `ctx` and
    /// external state at call time. A child produced here is decoded by
    /// the engine, never by this handler itself.
    async fn expand(&self, ctx: &HandlerContext) -> Result<HandlerOutput, HandlerError>;
}

#[derive(Default)]
pub struct HandlerRegistry {
    handlers: Vec<Box<dyn Handler>>,
}

/// Everything one `apply` call produced, including the identity of any
/// handler whose `expand` failed so the caller can attach a diagnostic.
#[derive(Debug, Default)]
pub struct RegistryOutput {
    pub children: Vec<ChildRequest>,
    pub insights: Vec<CallInsight>,
    pub notes: Vec<String>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        HandlerRegistry { handlers: Vec::new() }
    }

    pub fn register(&mut self, handler: Box<dyn Handler>) -> &mut Self {
        self.handlers.push(handler);
        self
    }

    /// Runs every handler whose `matches` returns true, in registry
    /// order, concatenating their outputs.
    pub async fn apply(&self, ctx: &HandlerContext) -> RegistryOutput {
        let mut out = RegistryOutput::default();
        for handler in &self.handlers {
            if !handler.matches(ctx) {
                continue;
            }
            match handler.expand(ctx).await {
                Ok(output) => {
                    out.children.extend(output.children);
                    out.insights.extend(output.insights);
                }
                Err(err) => {
                    tracing::warn!(handler = handler.name(), %err, "handler expand failed");
                    out.notes.push(format!("handler \"{}\" failed: {err}", handler.name()));
                }
            }
        }
        out
    }
}
