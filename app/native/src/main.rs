#![allow(clippy::multiple_crate_versions)]

//! Mantle - tiling orchestrator with spring-animated window placement.
//!
//! The binary is a thin wrapper around `mantle_lib::cli`.

fn main() {
    if let Err(err) = mantle_lib::cli::run() {
        eprintln!("mantle: {err}");
        std::process::exit(1);
    }
}
