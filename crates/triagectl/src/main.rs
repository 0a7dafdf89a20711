//! Triage Control - collect machine diagnostics for a support technician
//!
//! Runs every fact collector, prints what needs attention, and writes the
//! incident log for the ticket.

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use triage_common::TriageConfig;
use triagectl::cli::{Cli, Commands};
use triagectl::commands;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Diagnostics go to stderr so --json output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("triagectl v{} starting", env!("CARGO_PKG_VERSION"));

    let config = TriageConfig::load_from_path(&cli.config_path())?;

    match cli.command() {
        Commands::Run(args) => commands::run(&config, &args),
        Commands::Config => commands::config(&config),
    }
}
