//! Server response variants.
//!
//! A response is a closed set of kinds, each identified on the wire by its
//! [`ResponseType`] ordinal. The envelope (length + tag) lives in
//! [`crate::envelope`]; this module owns each variant's body.

use crate::error::ProtocolError;
use crate::wire;
use bytes::{Buf, BufMut};
use serde::Serialize;
use std::fmt;

/// Response discriminator. The ordinals are part of the wire contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum ResponseType {
    MismatchedVersion = 0,
    Completed = 1,
    Shutdown = 2,
    Rejected = 3,
}

impl ResponseType {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl TryFrom<i32> for ResponseType {
    type Error = ProtocolError;

    fn try_from(tag: i32) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(ResponseType::MismatchedVersion),
            1 => Ok(ResponseType::Completed),
            2 => Ok(ResponseType::Shutdown),
            3 => Ok(ResponseType::Rejected),
            other => Err(ProtocolError::UnknownTag(other)),
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseType::MismatchedVersion => write!(f, "MISMATCHED_VERSION"),
            ResponseType::Completed => write!(f, "COMPLETED"),
            ResponseType::Shutdown => write!(f, "SHUTDOWN"),
            ResponseType::Rejected => write!(f, "REJECTED"),
        }
    }
}

/// Outcome of a compilation the server ran on behalf of a client.
///
/// Body layout:
///
/// ```text
/// +-------------+-------------+----------------+---------------------+
/// | return_code | utf8_output | output         | error_output        |
/// | i32         | bool (1 B)  | prefixed str   | prefixed str (=="") |
/// +-------------+-------------+----------------+---------------------+
/// ```
///
/// The error output slot is still transmitted for compatibility but the
/// compiler never writes to it, so it is a constant here rather than a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedServerResponse {
    return_code: i32,
    utf8_output: bool,
    output: String,
}

impl CompletedServerResponse {
    /// The only value the error output slot may carry.
    pub const ERROR_OUTPUT: &'static str = "";

    /// Fixed part of the body: return code + utf8 flag.
    const FIXED_BODY_SIZE: usize = 4 + 1;

    pub fn new(return_code: i32, utf8_output: bool, output: impl Into<String>) -> Self {
        Self {
            return_code,
            utf8_output,
            output: output.into(),
        }
    }

    /// Exit code of the compiler process.
    pub fn return_code(&self) -> i32 {
        self.return_code
    }

    /// Whether `output` should be shown as UTF-8 rather than the legacy
    /// console encoding.
    pub fn utf8_output(&self) -> bool {
        self.utf8_output
    }

    /// Captured standard output of the compilation.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Always empty.
    pub fn error_output(&self) -> &'static str {
        Self::ERROR_OUTPUT
    }

    pub fn into_output(self) -> String {
        self.output
    }

    pub(crate) fn body_len(&self) -> usize {
        Self::FIXED_BODY_SIZE
            + wire::string_len(&self.output)
            + wire::string_len(Self::ERROR_OUTPUT)
    }

    pub(crate) fn write_body<B: BufMut>(&self, buf: &mut B) {
        buf.put_i32_le(self.return_code);
        wire::write_bool(buf, self.utf8_output);
        wire::write_length_prefixed_string(buf, &self.output);
        wire::write_length_prefixed_string(buf, Self::ERROR_OUTPUT);
    }

    pub(crate) fn parse_body<B: Buf>(buf: &mut B) -> Result<Self, ProtocolError> {
        let return_code = wire::read_i32(buf)?;
        let utf8_output = wire::read_bool(buf)?;
        let output = wire::read_length_prefixed_string(buf)?;

        // Any non-zero count is a violation; the characters are never decoded.
        let error_output_count = wire::read_u32(buf)?;
        if error_output_count != 0 {
            tracing::warn!(
                count = error_output_count,
                "completed response carries non-empty error output"
            );
            return Err(ProtocolError::InvariantViolation(
                "completed response error output must be empty",
            ));
        }

        Ok(Self::new(return_code, utf8_output, output))
    }
}

impl Serialize for CompletedServerResponse {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("CompletedServerResponse", 4)?;
        state.serialize_field("return_code", &self.return_code)?;
        state.serialize_field("utf8_output", &self.utf8_output)?;
        state.serialize_field("output", &self.output)?;
        state.serialize_field("error_output", self.error_output())?;
        state.end()
    }
}

/// A response sent from the server to a client, one per connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerResponse {
    /// The server speaks a different protocol version. Empty body.
    MismatchedVersion,
    /// A compilation ran to completion.
    Completed(CompletedServerResponse),
    /// The server accepted a shutdown request.
    Shutdown { server_process_id: i32 },
    /// The server refused the request. Empty body.
    Rejected,
}

impl ServerResponse {
    pub fn completed(return_code: i32, utf8_output: bool, output: impl Into<String>) -> Self {
        ServerResponse::Completed(CompletedServerResponse::new(
            return_code,
            utf8_output,
            output,
        ))
    }

    pub fn shutdown(server_process_id: i32) -> Self {
        ServerResponse::Shutdown { server_process_id }
    }

    pub fn response_type(&self) -> ResponseType {
        match self {
            ServerResponse::MismatchedVersion => ResponseType::MismatchedVersion,
            ServerResponse::Completed(_) => ResponseType::Completed,
            ServerResponse::Shutdown { .. } => ResponseType::Shutdown,
            ServerResponse::Rejected => ResponseType::Rejected,
        }
    }

    pub fn as_completed(&self) -> Option<&CompletedServerResponse> {
        match self {
            ServerResponse::Completed(completed) => Some(completed),
            _ => None,
        }
    }

    /// Size of the variant-specific body, tag excluded.
    pub fn body_len(&self) -> usize {
        match self {
            ServerResponse::MismatchedVersion | ServerResponse::Rejected => 0,
            ServerResponse::Completed(completed) => completed.body_len(),
            ServerResponse::Shutdown { .. } => 4,
        }
    }

    /// Writes the variant-specific body, tag excluded.
    pub fn write_body<B: BufMut>(&self, buf: &mut B) {
        match self {
            ServerResponse::MismatchedVersion | ServerResponse::Rejected => {}
            ServerResponse::Completed(completed) => completed.write_body(buf),
            ServerResponse::Shutdown { server_process_id } => buf.put_i32_le(*server_process_id),
        }
    }

    /// Parses the body of a response whose tag has already been read.
    pub fn parse_body<B: Buf>(
        response_type: ResponseType,
        buf: &mut B,
    ) -> Result<Self, ProtocolError> {
        match response_type {
            ResponseType::MismatchedVersion => Ok(ServerResponse::MismatchedVersion),
            ResponseType::Completed => {
                CompletedServerResponse::parse_body(buf).map(ServerResponse::Completed)
            }
            ResponseType::Shutdown => Ok(ServerResponse::Shutdown {
                server_process_id: wire::read_i32(buf)?,
            }),
            ResponseType::Rejected => Ok(ServerResponse::Rejected),
        }
    }
}

impl From<CompletedServerResponse> for ServerResponse {
    fn from(completed: CompletedServerResponse) -> Self {
        ServerResponse::Completed(completed)
    }
}
