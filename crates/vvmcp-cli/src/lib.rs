//! `vvmcp` command-line interface.
//!
//! The binary is an MCP stdio server by default; `speakers`, `say` and
//! `check` are one-shot commands against the same speech stack.
#![deny(unused_crate_dependencies)]

// Used by the binary only
use dotenvy as _;
use tracing_subscriber as _;

pub mod bootstrap;
pub mod commands;
pub mod handlers;
pub mod parser;

// Re-export primary types for convenient access
pub use bootstrap::{CliContext, apply_overrides, bootstrap, load_settings};
pub use commands::Commands;
pub use parser::Cli;
