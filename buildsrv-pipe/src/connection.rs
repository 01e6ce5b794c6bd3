//! One response exchange over a byte stream.
//!
//! The server side writes a single response with [`Connection::send_response`];
//! the client side reads it back with [`Connection::recv_response`]. The
//! stream can be anything tokio can read or write: a named pipe, a Unix
//! socket, a TCP stream, stdin.

use crate::config::{Config, PipeConfig};
use crate::error::PipeError;
use buildsrv_protocol::{Decoder, Encoder, ProtocolError, ServerResponse, LENGTH_PREFIX_SIZE};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// A stream carrying one response.
pub struct Connection<S> {
    stream: S,
    encoder: Encoder,
    decoder: Decoder,
    config: PipeConfig,
}

impl<S> Connection<S> {
    pub fn new(stream: S, config: &Config) -> Self {
        Self {
            stream,
            encoder: Encoder::new(config.codec),
            decoder: Decoder::with_limits(config.codec),
            config: config.pipe.clone(),
        }
    }
}

impl<S: AsyncRead + Unpin> Connection<S> {
    /// Reads one complete response.
    pub async fn recv_response(&mut self) -> Result<ServerResponse, PipeError> {
        let timeout = self.config.read_timeout();
        tokio::time::timeout(timeout, self.read_response())
            .await
            .map_err(|_| {
                tracing::debug!(?timeout, "read timeout");
                PipeError::Timeout(timeout)
            })?
    }

    async fn read_response(&mut self) -> Result<ServerResponse, PipeError> {
        let mut buf = vec![0u8; self.config.read_buffer_size];

        loop {
            if let Some(response) = self.decoder.decode_response()? {
                tracing::debug!(response_type = %response.response_type(), "received response");
                return Ok(response);
            }

            let n = self.stream.read(&mut buf).await?;
            tracing::trace!("read {} bytes from stream", n);

            if n == 0 {
                return Err(self.end_of_stream());
            }
            self.decoder.extend(&buf[..n]);
        }
    }

    fn end_of_stream(&self) -> PipeError {
        let available = self.decoder.buffered();
        if available == 0 {
            tracing::debug!("stream closed before any response bytes");
            return PipeError::ConnectionClosed;
        }

        let needed = available + self.decoder.missing().unwrap_or(LENGTH_PREFIX_SIZE - available);
        tracing::warn!(available, needed, "stream closed mid-response");
        PipeError::Protocol(ProtocolError::TruncatedStream { needed, available })
    }
}

impl<S: AsyncWrite + Unpin> Connection<S> {
    /// Writes one complete response and flushes it.
    pub async fn send_response(&mut self, response: &ServerResponse) -> Result<(), PipeError> {
        let encoded = self.encoder.encode_response(response)?;
        let timeout = self.config.write_timeout();

        tokio::time::timeout(timeout, async {
            self.stream.write_all(&encoded).await?;
            self.stream.flush().await
        })
        .await
        .map_err(|_| {
            tracing::debug!(?timeout, "write timeout");
            PipeError::Timeout(timeout)
        })??;

        tracing::debug!(
            response_type = %response.response_type(),
            bytes = encoded.len(),
            "sent response"
        );
        Ok(())
    }

    /// Shuts down the write half so the peer sees end-of-stream.
    pub async fn shutdown(&mut self) -> Result<(), PipeError> {
        self.stream.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_config() -> Config {
        let mut config = Config::default();
        config.pipe = config
            .pipe
            .with_read_timeout(Duration::from_secs(5))
            .with_write_timeout(Duration::from_secs(5));
        config
    }

    #[tokio::test]
    async fn test_send_then_receive() {
        let (server, client) = tokio::io::duplex(64);
        let config = test_config();

        let sender = tokio::spawn({
            let config = config.clone();
            async move {
                let mut conn = Connection::new(server, &config);
                let output = "Program.cs(3,1): error CS1022\n".repeat(20);
                conn.send_response(&ServerResponse::completed(1, true, output))
                    .await
                    .unwrap();
                conn.shutdown().await.unwrap();
            }
        });

        let mut conn = Connection::new(client, &config);
        let response = conn.recv_response().await.unwrap();
        sender.await.unwrap();

        let completed = response.as_completed().unwrap();
        assert_eq!(completed.return_code(), 1);
        assert!(completed.output().starts_with("Program.cs(3,1)"));
        assert_eq!(completed.error_output(), "");
    }

    #[tokio::test]
    async fn test_closed_before_response() {
        let (server, client) = tokio::io::duplex(64);
        drop(server);

        let mut conn = Connection::new(client, &test_config());
        let result = conn.recv_response().await;
        assert!(matches!(result, Err(PipeError::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_closed_mid_response() {
        let (mut server, client) = tokio::io::duplex(64);
        let bytes = ServerResponse::shutdown(1234).encode().unwrap();
        server.write_all(&bytes[..6]).await.unwrap();
        drop(server);

        let mut conn = Connection::new(client, &test_config());
        let result = conn.recv_response().await;
        assert!(matches!(
            result,
            Err(PipeError::Protocol(ProtocolError::TruncatedStream {
                needed: 12,
                available: 6
            }))
        ));
    }

    #[tokio::test]
    async fn test_closed_inside_length_prefix() {
        let (mut server, client) = tokio::io::duplex(64);
        server.write_all(&[8, 0]).await.unwrap();
        drop(server);

        let mut conn = Connection::new(client, &test_config());
        let result = conn.recv_response().await;
        assert!(matches!(
            result,
            Err(PipeError::Protocol(ProtocolError::TruncatedStream {
                needed: 4,
                available: 2
            }))
        ));
    }

    #[tokio::test]
    async fn test_oversized_response_rejected() {
        let (mut server, client) = tokio::io::duplex(64);
        let mut config = test_config();
        config.codec = config.codec.with_max_message_size(64);

        server.write_all(&(1u32 << 20).to_le_bytes()).await.unwrap();

        let mut conn = Connection::new(client, &config);
        let result = conn.recv_response().await;
        assert!(matches!(
            result,
            Err(PipeError::Protocol(ProtocolError::OversizedLength { .. }))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_timeout() {
        let (_server, client) = tokio::io::duplex(64);
        let mut config = test_config();
        config.pipe = config.pipe.with_read_timeout(Duration::from_secs(1));

        let mut conn = Connection::new(client, &config);
        let result = conn.recv_response().await;
        assert!(matches!(result, Err(PipeError::Timeout(_))));
    }
}
