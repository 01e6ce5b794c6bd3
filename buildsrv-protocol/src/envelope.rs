//! Response envelope.
//!
//! Every response shares one header:
//!
//! ```text
//! +----------------+-------------+-----------------------------+
//! | total_length   | tag         | body                        |
//! | u32 (4 bytes)  | i32 (4 B)   | total_length - 4 bytes      |
//! +----------------+-------------+-----------------------------+
//! ```
//!
//! `total_length` counts everything after itself (tag + body). The body
//! size is computed from the already-known field sizes, so the header can
//! be written before the body without a staging buffer.

use crate::error::ProtocolError;
use crate::response::{ResponseType, ServerResponse};
use crate::wire;
use crate::MAX_MESSAGE_SIZE;
use bytes::{BufMut, BytesMut};

/// Size of the `total_length` prefix.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Size of the response type tag.
pub const TAG_SIZE: usize = 4;

/// Returns the value of the `total_length` field for `response`.
pub fn frame_len(response: &ServerResponse) -> usize {
    TAG_SIZE + response.body_len()
}

/// Checks a declared or computed frame length against `max`.
pub fn check_frame_len(len: u64, max: u32) -> Result<(), ProtocolError> {
    if len > u64::from(max) {
        return Err(ProtocolError::OversizedLength { size: len, max });
    }
    Ok(())
}

/// Encodes `response` into a complete message.
pub fn encode_response(
    response: &ServerResponse,
    max_message_size: u32,
) -> Result<BytesMut, ProtocolError> {
    let frame_len = frame_len(response);
    check_frame_len(frame_len as u64, max_message_size)?;

    let mut buf = BytesMut::with_capacity(LENGTH_PREFIX_SIZE + frame_len);
    buf.put_u32_le(frame_len as u32);
    buf.put_i32_le(response.response_type().as_i32());
    response.write_body(&mut buf);
    debug_assert_eq!(buf.len(), LENGTH_PREFIX_SIZE + frame_len);

    tracing::trace!(
        response_type = %response.response_type(),
        frame_len,
        "encoded response"
    );
    Ok(buf)
}

/// Reads the `total_length` prefix without consuming it.
///
/// Returns `None` if fewer than four bytes are available.
pub fn peek_frame_len(buf: &[u8]) -> Option<u32> {
    let prefix: [u8; LENGTH_PREFIX_SIZE] = buf.get(..LENGTH_PREFIX_SIZE)?.try_into().ok()?;
    Some(u32::from_le_bytes(prefix))
}

/// Decodes the part of a message that follows the length prefix.
///
/// `frame` must be exactly `total_length` bytes; anything left after the
/// variant body is rejected.
pub fn decode_frame(mut frame: &[u8]) -> Result<ServerResponse, ProtocolError> {
    let tag = wire::read_i32(&mut frame)?;
    let response_type = ResponseType::try_from(tag).map_err(|e| {
        tracing::warn!(tag, "received unknown response type");
        e
    })?;

    let response = ServerResponse::parse_body(response_type, &mut frame)?;
    if !frame.is_empty() {
        return Err(ProtocolError::TrailingBytes { count: frame.len() });
    }

    tracing::trace!(%response_type, "decoded response");
    Ok(response)
}

/// Decodes one complete message: prefix, tag and body, nothing more.
pub fn decode_response(bytes: &[u8], max_message_size: u32) -> Result<ServerResponse, ProtocolError> {
    let mut buf = bytes;
    let frame_len = wire::read_u32(&mut buf)?;
    check_frame_len(u64::from(frame_len), max_message_size)?;

    let frame_len = frame_len as usize;
    wire::ensure_remaining(&buf, frame_len)?;
    let (frame, rest) = buf.split_at(frame_len);

    let response = decode_frame(frame)?;
    if !rest.is_empty() {
        return Err(ProtocolError::TrailingBytes { count: rest.len() });
    }
    Ok(response)
}

impl ServerResponse {
    /// Encodes this response with the default size limit.
    pub fn encode(&self) -> Result<BytesMut, ProtocolError> {
        encode_response(self, MAX_MESSAGE_SIZE)
    }

    /// Decodes one complete message with the default size limit.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        decode_response(bytes, MAX_MESSAGE_SIZE)
    }
}
