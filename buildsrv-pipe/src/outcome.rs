//! What a client does with the response it received.

use buildsrv_protocol::ServerResponse;
use std::fmt;
use std::io::Write;

/// Why the server could not run the compilation for us.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    MismatchedVersion,
    Rejected,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::MismatchedVersion => write!(f, "server protocol version mismatch"),
            FallbackReason::Rejected => write!(f, "server rejected the request"),
        }
    }
}

/// Client-side interpretation of a [`ServerResponse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientOutcome {
    /// Relay the compiler's output and exit with its return code.
    Completed {
        exit_code: i32,
        utf8_output: bool,
        output: String,
    },
    /// Compile without the server.
    Fallback { reason: FallbackReason },
    /// The server acknowledged a shutdown request.
    ServerShutdown { server_process_id: i32 },
}

impl ClientOutcome {
    /// Process exit code for the client.
    pub fn exit_code(&self) -> i32 {
        match self {
            ClientOutcome::Completed { exit_code, .. } => *exit_code,
            ClientOutcome::Fallback { .. } => 1,
            ClientOutcome::ServerShutdown { .. } => 0,
        }
    }

    /// Writes the compiler output to `out`. Other outcomes write nothing.
    ///
    /// Output is always emitted as UTF-8; when the server did not ask for
    /// UTF-8 output it is still the same text, only the console hint differs.
    pub fn write_output<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        if let ClientOutcome::Completed {
            output,
            utf8_output,
            ..
        } = self
        {
            if !utf8_output {
                tracing::debug!("server requested legacy console encoding, writing UTF-8");
            }
            out.write_all(output.as_bytes())?;
            out.flush()?;
        }
        Ok(())
    }
}

impl From<ServerResponse> for ClientOutcome {
    fn from(response: ServerResponse) -> Self {
        match response {
            ServerResponse::Completed(completed) => ClientOutcome::Completed {
                exit_code: completed.return_code(),
                utf8_output: completed.utf8_output(),
                output: completed.into_output(),
            },
            ServerResponse::MismatchedVersion => ClientOutcome::Fallback {
                reason: FallbackReason::MismatchedVersion,
            },
            ServerResponse::Rejected => ClientOutcome::Fallback {
                reason: FallbackReason::Rejected,
            },
            ServerResponse::Shutdown { server_process_id } => {
                ClientOutcome::ServerShutdown { server_process_id }
            }
        }
    }
}
