//! Primitive wire encodings.
//!
//! Integers are little-endian. Booleans are a single byte (0 = false, any
//! other value = true). Strings are length-prefixed:
//!
//! ```text
//! +-------------+-----------------------------------+
//! | count (u32) | count x UTF-16LE code unit (2 B)  |
//! +-------------+-----------------------------------+
//! ```
//!
//! There is no terminator and no escaping. A count of zero is the empty
//! string and consumes only the four count bytes.

use crate::error::ProtocolError;
use bytes::{Buf, BufMut};

/// Size of the string count prefix.
pub const STRING_COUNT_SIZE: usize = 4;

/// Size of one encoded character (a UTF-16 code unit).
pub const CHAR_SIZE: usize = 2;

/// Fails with `TruncatedStream` unless `needed` bytes remain in `buf`.
pub fn ensure_remaining<B: Buf>(buf: &B, needed: usize) -> Result<(), ProtocolError> {
    let available = buf.remaining();
    if available < needed {
        return Err(ProtocolError::TruncatedStream { needed, available });
    }
    Ok(())
}

pub fn read_u32<B: Buf>(buf: &mut B) -> Result<u32, ProtocolError> {
    ensure_remaining(buf, 4)?;
    Ok(buf.get_u32_le())
}

pub fn read_i32<B: Buf>(buf: &mut B) -> Result<i32, ProtocolError> {
    ensure_remaining(buf, 4)?;
    Ok(buf.get_i32_le())
}

pub fn read_bool<B: Buf>(buf: &mut B) -> Result<bool, ProtocolError> {
    ensure_remaining(buf, 1)?;
    Ok(buf.get_u8() != 0)
}

pub fn write_bool<B: BufMut>(buf: &mut B, value: bool) {
    buf.put_u8(u8::from(value));
}

/// Number of characters `value` occupies on the wire.
pub fn char_count(value: &str) -> usize {
    value.encode_utf16().count()
}

/// Encoded size of a length-prefixed string, prefix included.
pub fn string_len(value: &str) -> usize {
    STRING_COUNT_SIZE + char_count(value) * CHAR_SIZE
}

/// Writes `value` as a character count followed by its characters.
///
/// The caller is responsible for keeping the count within `u32`; the
/// envelope encoder checks the whole frame size before writing anything.
pub fn write_length_prefixed_string<B: BufMut>(buf: &mut B, value: &str) {
    buf.put_u32_le(char_count(value) as u32);
    for unit in value.encode_utf16() {
        buf.put_u16_le(unit);
    }
}

/// Reads a character count, then exactly that many characters.
pub fn read_length_prefixed_string<B: Buf>(buf: &mut B) -> Result<String, ProtocolError> {
    let count = read_u32(buf)? as usize;
    if count == 0 {
        return Ok(String::new());
    }

    let byte_len = count
        .checked_mul(CHAR_SIZE)
        .ok_or(ProtocolError::TruncatedStream {
            needed: usize::MAX,
            available: buf.remaining(),
        })?;
    ensure_remaining(buf, byte_len)?;

    let units: Vec<u16> = (0..count).map(|_| buf.get_u16_le()).collect();
    String::from_utf16(&units).map_err(|_| ProtocolError::InvalidUtf16)
}
