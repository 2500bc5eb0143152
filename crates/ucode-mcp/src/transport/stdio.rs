//! Stdio transport: reads JSON-RPC from stdin, writes to stdout.

use std::future::Future;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::session::{Session, SessionBinding, SessionManager};
use crate::types::{McpError, McpResult, RequestId};

use super::framing;

/// Stdio transport for desktop MCP clients. Serves one implicit session.
pub struct StdioTransport {
    manager: Arc<SessionManager>,
}

impl StdioTransport {
    pub fn new(manager: Arc<SessionManager>) -> Self {
        Self { manager }
    }

    /// Serve stdin/stdout until EOF or Ctrl-C.
    pub async fn run(&self) -> McpResult<()> {
        let reader = BufReader::new(tokio::io::stdin());
        let writer = tokio::io::stdout();
        self.run_with(reader, writer, super::shutdown_signal()).await
    }

    /// Serve any line-oriented stream pair until EOF or `shutdown` resolves.
    /// The session is closed before this returns, on every path.
    pub async fn run_with<R, W, S>(&self, reader: R, writer: W, shutdown: S) -> McpResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
        S: Future<Output = ()>,
    {
        let session = self.manager.create(SessionBinding::Stdio);
        tracing::info!("Stdio transport started");

        let result = tokio::select! {
            served = serve(&session, reader, writer) => served,
            _ = shutdown => {
                tracing::info!("Shutting down stdio session");
                Ok(())
            }
        };

        self.manager.destroy(session.id());
        result
    }
}

async fn serve<R, W>(session: &Session, mut reader: R, mut writer: W) -> McpResult<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let bytes_read = reader
            .read_until(b'\n', &mut buf)
            .await
            .map_err(McpError::Io)?;

        if bytes_read == 0 {
            tracing::info!("EOF on stdin, shutting down");
            return Ok(());
        }

        let decoded = std::str::from_utf8(&buf)
            .map_err(|e| McpError::ParseError(format!("Invalid UTF-8: {e}")))
            .and_then(|line| {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    Ok(None)
                } else {
                    framing::parse_message(trimmed).map(Some)
                }
            });

        let framed = match decoded {
            Ok(None) => continue,
            Ok(Some(msg)) => match session.exchange(msg).await {
                Some(response) => framing::frame_message(&response)?,
                None => continue,
            },
            Err(e) => {
                tracing::warn!("Parse error: {e}");
                framing::frame_error(&e, RequestId::Null)?
            }
        };

        writer
            .write_all(framed.as_bytes())
            .await
            .map_err(McpError::Io)?;
        writer.flush().await.map_err(McpError::Io)?;
    }
}
