//! Speakers command handler.

use anyhow::{Context, Result};
use vvmcp_core::SpeechPort;

use crate::bootstrap::CliContext;

/// Print the engine's speaker catalogue as pretty JSON.
pub async fn execute(ctx: &CliContext) -> Result<()> {
    let speakers = ctx
        .service
        .list_speakers()
        .await
        .with_context(|| format!("Failed to fetch speakers from {}", ctx.settings.engine_base_url()))?;
    println!("{}", serde_json::to_string_pretty(&speakers)?);
    Ok(())
}
