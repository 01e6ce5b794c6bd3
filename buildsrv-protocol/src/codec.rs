//! Encoder and decoder for response messages.
//!
//! [`Decoder`] is incremental: feed it bytes as they arrive from the pipe
//! and poll [`Decoder::decode_response`] until a full message is buffered.

use crate::envelope::{self, LENGTH_PREFIX_SIZE};
use crate::error::ProtocolError;
use crate::response::ServerResponse;
use crate::MAX_MESSAGE_SIZE;
use bytes::{Buf, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

/// Size limits applied by the encoder and decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecLimits {
    /// Largest accepted `total_length` value, in bytes.
    pub max_message_size: u32,
}

impl Default for CodecLimits {
    fn default() -> Self {
        Self {
            max_message_size: MAX_MESSAGE_SIZE,
        }
    }
}

impl CodecLimits {
    pub fn with_max_message_size(mut self, max: u32) -> Self {
        self.max_message_size = max;
        self
    }
}

/// Encodes responses into messages.
#[derive(Debug, Clone, Default)]
pub struct Encoder {
    limits: CodecLimits,
}

impl Encoder {
    pub fn new(limits: CodecLimits) -> Self {
        Self { limits }
    }

    pub fn encode_response(&self, response: &ServerResponse) -> Result<BytesMut, ProtocolError> {
        envelope::encode_response(response, self.limits.max_message_size)
    }

    /// Encodes a response and appends it to `dst`.
    pub fn encode_into(
        &self,
        response: &ServerResponse,
        dst: &mut BytesMut,
    ) -> Result<(), ProtocolError> {
        let encoded = self.encode_response(response)?;
        dst.extend_from_slice(&encoded);
        Ok(())
    }
}

/// Decodes messages into responses.
#[derive(Debug)]
pub struct Decoder {
    buffer: BytesMut,
    limits: CodecLimits,
}

impl Decoder {
    pub fn new() -> Self {
        Self::with_limits(CodecLimits::default())
    }

    pub fn with_limits(limits: CodecLimits) -> Self {
        Self {
            buffer: BytesMut::with_capacity(8192),
            limits,
        }
    }

    /// Appends data to the internal buffer.
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Appends bytes to the internal buffer.
    pub fn extend_bytes(&mut self, data: Bytes) {
        self.buffer.extend_from_slice(&data);
    }

    /// Attempts to decode the next response from the buffer.
    ///
    /// Returns `Ok(None)` while the message is incomplete. The declared
    /// length is checked against the limit as soon as the prefix arrives,
    /// so an oversized message fails before its body is buffered.
    pub fn decode_response(&mut self) -> Result<Option<ServerResponse>, ProtocolError> {
        let Some(frame_len) = envelope::peek_frame_len(&self.buffer) else {
            return Ok(None);
        };
        envelope::check_frame_len(u64::from(frame_len), self.limits.max_message_size)?;

        let frame_len = frame_len as usize;
        let total_len = LENGTH_PREFIX_SIZE + frame_len;
        if self.buffer.len() < total_len {
            tracing::trace!(
                buffered = self.buffer.len(),
                needed = total_len,
                "partial response buffered"
            );
            return Ok(None);
        }

        self.buffer.advance(LENGTH_PREFIX_SIZE);
        let frame = self.buffer.split_to(frame_len).freeze();
        envelope::decode_frame(&frame).map(Some)
    }

    /// Number of bytes the next message still needs, if its prefix is known.
    pub fn missing(&self) -> Option<usize> {
        let frame_len = envelope::peek_frame_len(&self.buffer)? as usize;
        Some((LENGTH_PREFIX_SIZE + frame_len).saturating_sub(self.buffer.len()))
    }

    /// Returns the number of bytes currently buffered.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Clears the internal buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}
