//! Transport layer
//!
//! The server speaks MCP over stdio.

use std::future::Future;

use rmcp::ServiceExt;
use rmcp::transport::io::stdio;

use crate::server::ServerHandler;
use crate::{Error, Result};

/// Serve over stdio until the client disconnects or `shutdown` resolves
pub async fn run_transport(
    handler: ServerHandler,
    shutdown: impl Future<Output = ()> + Send,
) -> Result<()> {
    tokio::select! {
        result = run_stdio(handler) => result,
        () = shutdown => Ok(()),
    }
}

async fn run_stdio(handler: ServerHandler) -> Result<()> {
    let transport = stdio();
    let server = handler
        .serve(transport)
        .await
        .map_err(|e| Error::Transport(format!("Failed to start stdio transport: {e}")))?;

    server
        .waiting()
        .await
        .map_err(|e| Error::Transport(format!("Stdio transport error: {e}")))?;

    Ok(())
}
