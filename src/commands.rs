//! Command implementations.

use buildsrv_pipe::{Config, Connection, PipeError};
use buildsrv_protocol::{envelope, ServerResponse, LENGTH_PREFIX_SIZE};
use std::path::Path;
use tokio::io::{AsyncRead, AsyncWrite};

/// Writes a completed response to `out`, or stdout when no path is given.
pub async fn encode(
    config: &Config,
    response: &ServerResponse,
    out: Option<&Path>,
) -> Result<(), PipeError> {
    match out {
        Some(path) => {
            let file = tokio::fs::File::create(path).await?;
            write_to(file, config, response).await
        }
        None => write_to(tokio::io::stdout(), config, response).await,
    }
}

/// Reads one response from `input`, or stdin when no path is given.
pub async fn read_response(
    config: &Config,
    input: Option<&Path>,
) -> Result<ServerResponse, PipeError> {
    match input {
        Some(path) => read_file(path, config).await,
        None => read_from(tokio::io::stdin(), config).await,
    }
}

/// A file holds exactly one message, so it is decoded in one shot and any
/// bytes after the frame are rejected.
async fn read_file(path: &Path, config: &Config) -> Result<ServerResponse, PipeError> {
    let max = config.codec.max_message_size;
    let len = tokio::fs::metadata(path).await?.len();
    envelope::check_frame_len(len.saturating_sub(LENGTH_PREFIX_SIZE as u64), max)?;

    let bytes = tokio::fs::read(path).await?;
    if bytes.is_empty() {
        return Err(PipeError::ConnectionClosed);
    }
    tracing::debug!(path = %path.display(), len = bytes.len(), "decoding response file");
    Ok(envelope::decode_response(&bytes, max)?)
}

/// Renders a response as pretty JSON.
pub fn to_json(response: &ServerResponse) -> serde_json::Result<String> {
    serde_json::to_string_pretty(response)
}

async fn write_to<W: AsyncWrite + Unpin>(
    writer: W,
    config: &Config,
    response: &ServerResponse,
) -> Result<(), PipeError> {
    let mut conn = Connection::new(writer, config);
    conn.send_response(response).await?;
    conn.shutdown().await
}

async fn read_from<R: AsyncRead + Unpin>(
    reader: R,
    config: &Config,
) -> Result<ServerResponse, PipeError> {
    Connection::new(reader, config).recv_response().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use buildsrv_protocol::ProtocolError;

    #[tokio::test]
    async fn test_encode_then_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("response.bin");
        let config = Config::default();

        let response = ServerResponse::completed(-1, false, "fatal error CS2001");
        encode(&config, &response, Some(path.as_path())).await.unwrap();

        let decoded = read_response(&config, Some(path.as_path())).await.unwrap();
        assert_eq!(decoded, response);
    }

    #[tokio::test]
    async fn test_read_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.bin");
        std::fs::write(&path, b"").unwrap();

        let result = read_response(&Config::default(), Some(path.as_path())).await;
        assert!(matches!(result, Err(PipeError::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_read_unknown_tag_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unknown.bin");
        let mut bytes = 4u32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&17i32.to_le_bytes());
        std::fs::write(&path, &bytes).unwrap();

        let result = read_response(&Config::default(), Some(path.as_path())).await;
        assert!(matches!(
            result,
            Err(PipeError::Protocol(ProtocolError::UnknownTag(17)))
        ));
    }

    #[tokio::test]
    async fn test_read_file_rejects_trailing_junk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.bin");
        let mut bytes = ServerResponse::completed(0, true, "ok").encode().unwrap().to_vec();
        bytes.extend_from_slice(b"junk");
        std::fs::write(&path, &bytes).unwrap();

        let result = read_response(&Config::default(), Some(path.as_path())).await;
        assert!(matches!(
            result,
            Err(PipeError::Protocol(ProtocolError::TrailingBytes { count: 4 }))
        ));
    }

    #[tokio::test]
    async fn test_read_file_over_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.bin");
        let bytes = ServerResponse::completed(0, true, "x".repeat(64))
            .encode()
            .unwrap();
        std::fs::write(&path, &bytes).unwrap();

        let mut config = Config::default();
        config.codec = config.codec.with_max_message_size(32);
        let result = read_response(&config, Some(path.as_path())).await;
        assert!(matches!(
            result,
            Err(PipeError::Protocol(ProtocolError::OversizedLength { .. }))
        ));
    }

    #[test]
    fn test_to_json() {
        let json = to_json(&ServerResponse::completed(0, true, "ok")).unwrap();
        assert!(json.contains("\"type\": \"completed\""));
        assert!(json.contains("\"error_output\": \"\""));
    }
}
