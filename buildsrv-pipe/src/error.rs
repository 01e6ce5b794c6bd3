//! Pipe error types.

use thiserror::Error;

/// Errors raised while moving a response across a stream.
#[derive(Debug, Error)]
pub enum PipeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] buildsrv_protocol::ProtocolError),

    #[error("connection closed")]
    ConnectionClosed,

    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl PipeError {
    /// Returns whether retrying the exchange on a fresh connection may help.
    ///
    /// Malformed responses are never retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            PipeError::Io(_) => true,
            PipeError::Timeout(_) => true,
            PipeError::ConnectionClosed => true,
            PipeError::Protocol(_) => false,
        }
    }
}
