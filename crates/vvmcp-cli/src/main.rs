//! CLI entry point - the composition root.
//!
//! Logging goes to stderr: while serving MCP, stdout carries protocol
//! frames only.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use vvmcp_cli::{Cli, Commands, bootstrap, handlers, load_settings};

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load environment variables (before clap reads its env fallbacks)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = load_settings(&cli)?;
    let ctx = bootstrap(settings)?;

    let succeeded = match cli.subcommand() {
        Commands::Serve => {
            handlers::serve::execute(&ctx).await?;
            true
        }
        Commands::Speakers => {
            handlers::speakers::execute(&ctx).await?;
            true
        }
        Commands::Say { text } => handlers::say::execute(&ctx, text).await?,
        Commands::Check => handlers::check::execute(&ctx).await?,
    };

    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
