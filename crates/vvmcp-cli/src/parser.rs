//! Main CLI parser and top-level argument handling.
//!
//! Global options override the corresponding `VOICEVOX_*` settings for this
//! invocation.

use clap::Parser;

use crate::commands::Commands;

/// Command-line interface for the VOICEVOX speech server.
#[derive(Parser, Debug)]
#[command(name = "vvmcp")]
#[command(about = "Speak text through a VOICEVOX engine, as an MCP server or from the shell")]
#[command(version)]
pub struct Cli {
    /// Engine host
    #[arg(long, env = "VOICEVOX_HOST", global = true)]
    pub host: Option<String>,

    /// Engine port
    #[arg(long, env = "VOICEVOX_PORT", global = true)]
    pub port: Option<u16>,

    /// Default speaker (style id) for turns that do not name one
    #[arg(long, env = "VOICEVOX_DEFAULT_SPEAKER", global = true)]
    pub speaker: Option<u32>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// The command to run; `serve` when none was given.
    pub fn subcommand(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve)
    }
}
