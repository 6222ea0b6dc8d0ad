//! Configuration check command.
//!
//! Lists the search paths, loads the configuration the same way the service would
//! and reports whether it is valid.

use std::path::Path;

use colored::Colorize;

use crate::cli::output::{format_bool, print_highlighted_json};
use crate::config::{self, config_paths};
use crate::error::MantleResult;

/// Runs `mantle check-config`.
///
/// # Errors
///
/// Returns an error if the configuration cannot be read, parsed or validated.
pub fn execute(custom_path: Option<&Path>, print: bool) -> MantleResult<()> {
    if custom_path.is_none() {
        show_search_paths();
    }

    let (config, loaded_from) = config::load_or_default(custom_path)?;

    match loaded_from {
        Some(path) => println!("{} {} is valid", format_bool(true), path.display()),
        None => println!("{} No configuration file found, using defaults", format_bool(true)),
    }

    if print {
        let value = serde_json::to_value(&config).map_err(config::ConfigError::from)?;
        println!();
        print_highlighted_json(&value);
    }

    Ok(())
}

/// Prints the configuration search paths in priority order, marking the active one.
fn show_search_paths() {
    println!("{}\n", "Configuration file search paths (in priority order):".bold());

    let mut found_config = false;
    for (i, path) in config_paths().iter().enumerate() {
        let marker = match (path.exists(), found_config) {
            (true, false) => {
                found_config = true;
                " (active)".green().to_string()
            }
            (true, true) => " (exists)".dimmed().to_string(),
            (false, _) => String::new(),
        };
        println!("  {}. {}{marker}", i + 1, path.display());
    }

    println!();
}
