//! Protocol error types.

use thiserror::Error;

/// Errors raised while decoding (or, rarely, encoding) a server response.
///
/// Every variant aborts the current message. Nothing here is retried or
/// defaulted at the codec layer.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("truncated stream: need {needed} bytes, only {available} available")]
    TruncatedStream { needed: usize, available: usize },

    #[error("unknown response type tag: {0}")]
    UnknownTag(i32),

    #[error("invariant violation: {0}")]
    InvariantViolation(&'static str),

    #[error("message too large: {size} bytes (max {max})")]
    OversizedLength { size: u64, max: u32 },

    #[error("{count} unconsumed trailing bytes after response")]
    TrailingBytes { count: usize },

    #[error("invalid UTF-16 in length-prefixed string")]
    InvalidUtf16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_display() {
        let err = ProtocolError::TruncatedStream {
            needed: 12,
            available: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("12"));
        assert!(msg.contains("3"));

        let err = ProtocolError::UnknownTag(99);
        assert!(err.to_string().contains("99"));

        let err = ProtocolError::InvariantViolation("error output must be empty");
        assert!(err.to_string().contains("error output"));

        let err = ProtocolError::OversizedLength { size: 100, max: 50 };
        assert!(err.to_string().contains("100"));

        let err = ProtocolError::TrailingBytes { count: 1 };
        assert!(err.to_string().contains("trailing"));

        let err = ProtocolError::InvalidUtf16;
        assert!(err.to_string().contains("UTF-16"));
    }
}
