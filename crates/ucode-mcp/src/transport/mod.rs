//! Transport layer for MCP communication.

pub mod framing;
#[cfg(feature = "sse")]
pub mod http;
#[cfg(feature = "sse")]
pub mod sse;
pub mod stdio;
#[cfg(feature = "sse")]
pub mod streamable;

#[cfg(feature = "sse")]
pub use http::HttpTransport;
pub use stdio::StdioTransport;

/// Resolves on Ctrl-C. If the signal handler cannot be installed, never resolves.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for interrupt signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Interrupt received");
}
