//! The handler registry: bridge-expansion and governance-insight
//! plug-ins matched against decoded calls.
//!
//! [`registry::HandlerRegistry`] holds an ordered list of
//! [`registry::Handler`] implementations. A failing handler degrades to
//! a note rather than aborting the decode — see [`error::HandlerError`].

pub mod address_verification;
pub mod bridge_arbitrum;
pub mod bridge_linea;
pub mod context;
pub mod error;
pub mod price_feed;
pub mod receiver_multicall;
pub mod registry;
pub mod tracking_speed;
pub mod update_asset;
pub mod util;
pub mod views;

pub use address_verification::AddressVerificationHandler;
pub use bridge_arbitrum::ArbitrumInboxHandler;
pub use bridge_linea::LineaBridgeHandler;
pub use context::{HandlerContext, HandlerOutput};
pub use error::HandlerError;
pub use price_feed::PriceFeedHandler;
pub use receiver_multicall::ReceiverMulticallHandler;
pub use registry::{Handler, HandlerRegistry, RegistryOutput};
pub use tracking_speed::TrackingSpeedHandler;
pub use update_asset::UpdateAssetHandler;
