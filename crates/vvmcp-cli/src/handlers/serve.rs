//! Serve command handler: the MCP stdio server.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use vvmcp_core::SpeechPort;
use vvmcp_mcp::serve_stdio;

use crate::bootstrap::CliContext;

/// Serve MCP on stdin/stdout until the client disconnects or Ctrl-C.
///
/// Speech still playing when the server exits is stopped.
pub async fn execute(ctx: &CliContext) -> Result<()> {
    let port: Arc<dyn SpeechPort> = ctx.service.clone();

    tokio::select! {
        result = serve_stdio(port) => result.context("MCP server failed")?,
        _ = tokio::signal::ctrl_c() => info!("Interrupted"),
    }

    ctx.service.queue().stop();
    Ok(())
}
