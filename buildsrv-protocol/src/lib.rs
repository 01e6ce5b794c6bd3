//! # buildsrv-protocol
//!
//! Response wire codec for the buildsrv compiler server.
//!
//! The server runs a compilation on behalf of a short-lived client and
//! sends back exactly one response per connection. This crate provides:
//! - Length-prefixed string and primitive encodings
//! - The response envelope (total length + type tag)
//! - The closed set of response variants and their bodies
//! - An incremental decoder with a message size bound

pub mod codec;
pub mod envelope;
pub mod error;
pub mod response;
pub mod wire;

pub use codec::{CodecLimits, Decoder, Encoder};
pub use envelope::{LENGTH_PREFIX_SIZE, TAG_SIZE};
pub use error::ProtocolError;
pub use response::{CompletedServerResponse, ResponseType, ServerResponse};

/// Default maximum `total_length` of a response (64 MiB).
pub const MAX_MESSAGE_SIZE: u32 = 64 * 1024 * 1024;
