//! Ninebets CLI - Command-line interface
//!
//! Runs the API server and talks to a running one.

mod client;
mod commands;

use std::path::Path;

use clap::Parser;
use ninebets_core::tracing_setup::{CliLogLevel, init_tracing};

#[derive(Parser)]
#[command(name = "ninebets")]
#[command(about = "Round-based color and number prediction game")]
struct Cli {
    /// Console log level (the run log always captures everything)
    #[arg(long, global = true, value_enum, default_value = "info")]
    log_level: CliLogLevel,

    #[command(subcommand)]
    command: commands::Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.into(), Path::new("logs"))?;

    commands::handle_command(cli.command).await
}
