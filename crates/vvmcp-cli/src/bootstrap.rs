//! CLI bootstrap - the composition root.
//!
//! This module is the ONLY place where the speech stack is wired together:
//! settings from the environment and flags, the VOICEVOX client, the
//! platform player, the dialogue queue and the `SpeechService` on top.

use std::sync::Arc;

use anyhow::{Context, Result};
use vvmcp_core::{SpeakerId, SpeechSettings};
use vvmcp_voice::SpeechService;

use crate::parser::Cli;

/// Fully composed application context for CLI commands.
pub struct CliContext {
    pub settings: SpeechSettings,
    pub service: Arc<SpeechService>,
}

/// Read settings from the environment and apply command-line overrides.
pub fn load_settings(cli: &Cli) -> Result<SpeechSettings> {
    resolve_settings(cli, |key| std::env::var(key).ok())
}

/// Parse, override, then validate, so a flag can replace a bad variable.
fn resolve_settings<F>(cli: &Cli, lookup: F) -> Result<SpeechSettings>
where
    F: Fn(&str) -> Option<String>,
{
    let settings = SpeechSettings::from_lookup(lookup).context("Invalid VOICEVOX_* environment")?;
    let settings = apply_overrides(settings, cli);
    settings.validate().context("Invalid speech settings")?;
    Ok(settings)
}

/// Flags win over the environment.
pub fn apply_overrides(mut settings: SpeechSettings, cli: &Cli) -> SpeechSettings {
    if let Some(host) = &cli.host {
        settings.engine_host.clone_from(host);
    }
    if let Some(port) = cli.port {
        settings.engine_port = port;
    }
    if let Some(speaker) = cli.speaker {
        settings.default_speaker = SpeakerId(speaker);
    }
    settings
}

/// Build the speech service. Must run inside the Tokio runtime.
pub fn bootstrap(settings: SpeechSettings) -> Result<CliContext> {
    let service = SpeechService::from_settings(&settings).context("Failed to build speech service")?;
    Ok(CliContext {
        settings,
        service: Arc::new(service),
    })
}
