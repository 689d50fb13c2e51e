//! Check command handler: engine reachability and resolved settings.

use anyhow::Result;
use vvmcp_voice::{CommandPlayer, VoicevoxClient};

use crate::bootstrap::CliContext;

/// Print engine status, detected player and settings.
///
/// Returns whether the engine answered.
pub async fn execute(ctx: &CliContext) -> Result<bool> {
    let client = VoicevoxClient::from_settings(&ctx.settings)?;
    let reachable = match client.version().await {
        Ok(version) => {
            println!("Engine:   {} (version {version})", client.base_url());
            true
        }
        Err(e) => {
            println!("Engine:   {} unreachable: {e}", client.base_url());
            false
        }
    };

    match CommandPlayer::detect().player() {
        Some(player) => println!("Player:   {}", player.program().display()),
        None => println!("Player:   none found"),
    }

    println!("Settings:");
    println!("{}", serde_json::to_string_pretty(&ctx.settings)?);
    Ok(reachable)
}
