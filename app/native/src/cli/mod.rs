//! CLI module for Mantle.
//!
//! This module provides the command-line interface: configuration checking,
//! schema output and running the tiling service against a simulated host.

mod commands;
mod output;

use clap::Parser;
pub use commands::{Cli, Commands, SimulateArgs};

use crate::error::MantleResult;

/// Runs the CLI.
///
/// Parses command-line arguments and executes the appropriate command.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn run() -> MantleResult<()> {
    let cli = Cli::parse();
    cli.execute()
}
