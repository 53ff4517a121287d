pub mod codec;
pub mod convert;
pub mod error;

pub use codec::{selector, Codec};
pub use error::CodecError;
