//! Command handlers.
//!
//! Handlers follow one pattern:
//! - Signature: `pub async fn execute(ctx: &CliContext, ...) -> Result<_>`
//! - Thin wrappers that call the `SpeechPort` / engine client and format
//!   output for the terminal.
//!
//! Stdout belongs to the MCP protocol while serving; only the one-shot
//! commands print to it.

pub mod check;
pub mod say;
pub mod serve;
pub mod speakers;
