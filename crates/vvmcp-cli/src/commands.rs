//! Available subcommands.

use clap::Subcommand;

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the MCP server on stdin/stdout (default)
    Serve,

    /// Print the engine's speakers as JSON
    Speakers,

    /// Speak text aloud and wait until playback finishes
    Say {
        /// One turn per argument, spoken in order
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Check the engine connection and show the resolved settings
    Check,
}
