//! Newline-delimited JSON transport.
//!
//! Reads one [`WireRequest`] per line and writes one
//! [`CallResponse`](seedbank_types::CallResponse) per line, in request
//! order. Blank lines are skipped. A line that does not parse gets an
//! `InvalidArguments` envelope and the loop carries on.

use seedbank_registry::dispatch::CODE_INVALID_ARGUMENTS;
use seedbank_types::{CallError, CallResponse, ErrorKind};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};

use crate::error::HostError;
use crate::request::WireRequest;
use crate::service::RegistryService;

/// Counters reported when the input stream ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServeStats {
    /// Lines answered, malformed ones included.
    pub responses: u64,
    /// Lines that could not be parsed as a request.
    pub malformed: u64,
}

/// Serve requests from `input` until end of stream.
///
/// # Errors
///
/// Returns [`HostError::Io`] if reading or writing fails, or
/// [`HostError::Encoding`] if a response cannot be serialized.
pub async fn serve<R, W>(
    service: &RegistryService,
    input: R,
    mut output: W,
) -> Result<ServeStats, HostError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut stats = ServeStats::default();
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = match WireRequest::parse_line(&line) {
            Ok(request) => service.handle(request).await,
            Err(e) => {
                stats.malformed = stats.malformed.saturating_add(1);
                warn!(error = %e, "Malformed request line");
                malformed(&e)
            }
        };

        let mut encoded = serde_json::to_vec(&response)?;
        encoded.push(b'\n');
        output.write_all(&encoded).await?;
        output.flush().await?;
        stats.responses = stats.responses.saturating_add(1);
    }

    info!(
        registry = service.name(),
        responses = stats.responses,
        malformed = stats.malformed,
        "Input closed"
    );
    Ok(stats)
}

fn malformed(error: &serde_json::Error) -> CallResponse {
    CallResponse::err(CallError {
        kind: ErrorKind::InvalidArguments,
        code: CODE_INVALID_ARGUMENTS,
        message: format!("malformed request: {error}"),
    })
}
