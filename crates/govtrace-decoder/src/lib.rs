//! The top-level `decodeProposal` engine.
//!
//! [`engine::Decoder`] threads chain context, proxy resolution, ABI
//! lookup, metadata enrichment, and handler fan-out through a recursive
//! descent over a proposal's action list — see [`engine::Decoder::decode`].

pub mod abi_resolution;
pub mod engine;
pub mod input;

pub use abi_resolution::{LocalAbiIndex, ResolvedAbi};
pub use engine::{DecodeOptions, Decoder, RpcProvider};
pub use input::{parse_proposal_json, parse_propose_calldata, DecoderInput, GovernorView};
