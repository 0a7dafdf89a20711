//! CLI - Command-line argument parsing
//!
//! Keeps argument parsing separate from execution logic.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use triage_common::config::CONFIG_FILE;

/// Triage - machine diagnostics for support technicians
#[derive(Parser, Debug)]
#[command(name = "triagectl")]
#[command(
    about = "Triage - collect machine diagnostics and report what needs attention",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to ./triage.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level filter when RUST_LOG is unset (e.g. debug, triage_common=trace)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Collect all facts and print the summary (default)
    Run(RunArgs),

    /// Print the effective configuration as TOML
    Config,
}

#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct RunArgs {
    /// Mount points to check for free space (repeatable)
    #[arg(long = "mount", value_name = "PATH")]
    pub mounts: Vec<PathBuf>,

    /// Write the incident log here instead of the configured path
    #[arg(long, value_name = "PATH")]
    pub export: Option<PathBuf>,

    /// Also write incidents as JSON
    #[arg(long, value_name = "PATH")]
    pub export_json: Option<PathBuf>,

    /// Print the run report as JSON instead of the summary
    #[arg(long)]
    pub json: bool,

    /// Record collection failures without printing warnings
    #[arg(long, short)]
    pub quiet: bool,

    /// Collect independent facts in parallel
    #[arg(long)]
    pub parallel: bool,

    /// Per-strategy timeout in milliseconds (overrides config)
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,
}

impl Cli {
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
    }

    /// Subcommand to execute; a bare `triagectl` is `triagectl run`
    pub fn command(&self) -> Commands {
        match &self.command {
            Some(Commands::Run(args)) => Commands::Run(args.clone()),
            Some(Commands::Config) => Commands::Config,
            None => Commands::Run(RunArgs::default()),
        }
    }
}

impl RunArgs {
    /// Mounts to check; `/` when none were given
    pub fn effective_mounts(&self) -> Vec<PathBuf> {
        if self.mounts.is_empty() {
            vec![PathBuf::from("/")]
        } else {
            self.mounts.clone()
        }
    }
}
