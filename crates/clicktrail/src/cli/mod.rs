//! Command-line interface for clicktrail.
//!
//! This module provides the CLI structure for the `clicktrail` binary and the
//! replay helpers it drives.

mod commands;
pub mod replay;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{ConfigCommand, PingCommand, ReplayCommand, StatusCommand};

/// clicktrail - Interaction and error tracking
///
/// Replays recorded host events through the tracker, checks the collection
/// endpoints, and inspects configuration.
#[derive(Debug, Parser)]
#[command(name = "clicktrail")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Replay a JSON-lines file of host events and print the summary
    Replay(ReplayCommand),

    /// Send one synthetic event to a collection endpoint
    Ping(PingCommand),

    /// Show mode, endpoints and buffer size
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
