//! CLI command definitions using Clap.
//!
//! This module defines all CLI commands and their arguments, organized into
//! submodules:
//!
//! - `config_cmd` - Configuration check
//! - `simulate` - Running the tiling service against a simulated host

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::error::MantleResult;
use crate::{config, logging, schema};

pub mod config_cmd;
pub mod simulate;

pub use simulate::SimulateArgs;

/// Application version from Cargo.toml.
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Mantle CLI - tiling orchestrator with spring-animated window placement.
#[derive(Parser, Debug)]
#[command(name = "mantle")]
#[command(author, version = APP_VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a custom configuration file.
    ///
    /// Overrides the default configuration file search paths.
    /// Supports JSONC format (JSON with comments).
    #[arg(long, short, global = true, value_name = "PATH", env = "MANTLE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    ///
    /// `RUST_LOG` overrides this when set.
    #[arg(long, short, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum Commands {
    /// Validate the configuration file.
    ///
    /// Lists the search paths, loads the active configuration and reports the
    /// first invalid value, if any.
    CheckConfig {
        /// Print the effective configuration after validation.
        #[arg(long)]
        print: bool,
    },

    /// Output the configuration JSON Schema.
    ///
    /// Outputs a JSON Schema to stdout that describes the structure of the
    /// configuration file. Can be redirected to a file for use with editors
    /// that support JSON Schema validation.
    Schema,

    /// Run the tiling service against a simulated host.
    ///
    /// Creates screens, processes and randomly placed windows in memory, runs
    /// the orchestration (and animation) loops for a while and prints the final
    /// frame of every window.
    #[command(after_long_help = r"Examples:
  mantle simulate                          # 5 windows, 2 processes, animated
  mantle simulate --direct -w 8 -p 3       # direct placement
  mantle simulate --screens 2 --seed 42    # two screens side by side
  mantle simulate --latency-ms 50 --json   # slow host, JSON output")]
    Simulate(SimulateArgs),
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command execution fails.
    pub fn execute(&self) -> MantleResult<()> {
        logging::init(self.verbose);

        match &self.command {
            Commands::CheckConfig { print } => config_cmd::execute(self.config.as_deref(), *print),

            Commands::Schema => {
                println!("{}", schema::generate_schema_json());
                Ok(())
            }

            Commands::Simulate(args) => {
                let (config, path) = config::load_or_default(self.config.as_deref())?;
                if let Some(path) = path {
                    tracing::info!(path = %path.display(), "using configuration file");
                }
                simulate::execute(args, &config)
            }
        }
    }
}
