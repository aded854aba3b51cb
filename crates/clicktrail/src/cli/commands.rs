//! CLI command definitions.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Replay command arguments.
#[derive(Debug, Args)]
pub struct ReplayCommand {
    /// JSON-lines file of host events (`-` for stdin)
    pub file: PathBuf,

    /// Print the summary as JSON
    #[arg(short, long)]
    pub json: bool,

    /// Replay at most this many events
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Log events locally instead of posting them
    #[arg(long)]
    pub dry_run: bool,
}

/// Ping command arguments.
#[derive(Debug, Args)]
pub struct PingCommand {
    /// Ping the errors endpoint instead of the interactions endpoint
    #[arg(short, long)]
    pub errors: bool,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        file: Option<PathBuf>,
    },
}
