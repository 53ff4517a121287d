//! Multi-source address metadata reconciliation.
//!
//! [`resolver::MetadataResolver`] combines a bundled static deployment
//! index, curated hardcoded maps, an explorer client, and on-chain view
//! calls into one trust-ranked `AddressMetadata`, recursing through
//! proxies via `govtrace_proxy::ProxyResolver`.

pub mod curated;
pub mod error;
pub mod reconcile;
pub mod resolver;
pub mod static_index;

pub use curated::{BridgeArgSplit, CuratedMaps, TokenListEntry};
pub use error::MetadataError;
pub use resolver::MetadataResolver;
pub use static_index::{StaticDeploymentEntry, StaticDeploymentIndex};
