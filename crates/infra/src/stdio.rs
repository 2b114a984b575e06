//! Line-delimited JSON-RPC over an async reader/writer pair.

use crate::InfraResult;
use crate::rpc::RpcHandler;
use hybrid_rag_shared::{CancellationToken, ErrorClass, ErrorCode, ErrorEnvelope};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Why the serve loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdioExit {
    /// The reader reached end of input.
    Eof,
    /// The shutdown token fired.
    Cancelled,
}

/// Serve requests from `reader` until EOF or cancellation.
///
/// Blank lines are skipped. A line that is not UTF-8 gets a parse-error reply
/// and the loop keeps reading. Each reply is written as one compact JSON line
/// and flushed; notification replies (`{}`) are not written.
pub async fn serve_lines<R, W>(
    handler: &RpcHandler,
    mut reader: R,
    mut writer: W,
    shutdown: CancellationToken,
) -> InfraResult<StdioExit>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut frame = Vec::new();
    loop {
        frame.clear();
        let read = tokio::select! {
            () = shutdown.cancelled() => return Ok(StdioExit::Cancelled),
            read = reader.read_until(b'\n', &mut frame) => read?,
        };
        if read == 0 {
            return Ok(StdioExit::Eof);
        }
        if frame.trim_ascii().is_empty() {
            continue;
        }

        let reply = handler.handle_frame(frame.trim_ascii_end(), &shutdown).await;
        if is_suppressed(&reply) {
            continue;
        }
        let mut encoded = serde_json::to_vec(&reply).map_err(|error| {
            ErrorEnvelope::unexpected(
                ErrorCode::internal(),
                format!("failed to encode response: {error}"),
                ErrorClass::NonRetriable,
            )
        })?;
        encoded.push(b'\n');
        writer.write_all(&encoded).await?;
        writer.flush().await?;
    }
}

/// Serve on the process stdin/stdout.
pub async fn serve_stdio(
    handler: &RpcHandler,
    shutdown: CancellationToken,
) -> InfraResult<StdioExit> {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    tracing::info!("serving JSON-RPC on stdio");
    serve_lines(handler, stdin, stdout, shutdown).await
}

fn is_suppressed(reply: &Value) -> bool {
    reply.as_object().is_some_and(serde_json::Map::is_empty)
}
