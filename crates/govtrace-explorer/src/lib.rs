pub mod client;
pub mod error;
pub mod types;

pub use client::ExplorerClient;
pub use error::ExplorerError;
pub use types::{AbiFetch, AddressTagInfo, ContractNameResult, ContractNameSource, TokenPage};
