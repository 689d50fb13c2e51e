//! Say command handler: speak from the shell and wait for playback.

use anyhow::{Context, Result};
use tracing::info;
use vvmcp_core::{SpeechPort, TurnRequest};

use crate::bootstrap::CliContext;

/// Speak each argument as one turn with the default speaker.
///
/// Returns whether every turn was synthesized and played.
pub async fn execute(ctx: &CliContext, text: Vec<String>) -> Result<bool> {
    let mut outcomes = ctx.service.queue().subscribe();

    let turns = text
        .into_iter()
        .map(|t| TurnRequest::new(t, None))
        .collect();
    let receipt = ctx.service.speak(turns).await?;
    info!(turns = receipt.turns, "Speaking");

    let outcome = tokio::select! {
        received = outcomes.recv() => received.context("Speech queue closed unexpectedly")?,
        _ = tokio::signal::ctrl_c() => {
            ctx.service.stop().await?;
            return Ok(false);
        }
    };

    if !outcome.succeeded() {
        eprintln!(
            "Speech incomplete: {} of {} turn(s) failed{}",
            outcome.failed_turns,
            outcome.turns,
            if outcome.cancelled { " (stopped)" } else { "" }
        );
    }
    Ok(outcome.succeeded())
}
