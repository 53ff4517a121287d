pub mod chain;
pub mod config;
pub mod error;
pub mod proposal;
pub mod types;

pub use chain::ChainId;
pub use config::{ChainConfig, DecoderConfig};
pub use error::DecoderError;
pub use proposal::{
    AddressMetadata, CallEdge, CallEdgeNode, CallInsight, CallInsightEntry, CallNode,
    ChildRequest, DecodedFunction, Proposal, ProposalDetails,
};
pub use types::{ArgValue, DataSource, MaybeSourced, ParamInfo, Sourced};
