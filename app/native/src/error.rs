//! Error types for Mantle.
//!
//! Host failures are handled inside a layout cycle and never reach the CLI. Only
//! configuration and IO errors are wrapped by `MantleError`.

use thiserror::Error;

use crate::config::ConfigError;

/// Result type for CLI-level operations.
pub type MantleResult<T> = Result<T, MantleError>;

/// Errors that can occur during application execution.
#[derive(Debug, Error)]
pub enum MantleError {
    /// Invalid command arguments.
    #[error("{0}")]
    InvalidArguments(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
