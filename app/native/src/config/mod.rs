//! Configuration module for Mantle.
//!
//! This module provides configuration types and loading functionality.
//!
//! The configuration file supports JSONC format (JSON with comments).
//! Both single-line (`//`) and multi-line (`/* */`) comments are allowed.

pub mod types;

use std::path::{Path, PathBuf};

pub use types::{
    ApplyMode, ConfigError, MantleConfig, SpringConfig, TilingConfig, WindowFilterConfig,
    config_paths, load_config, load_config_from_path,
};

/// Loads the configuration, falling back to defaults when no file exists.
///
/// An explicit `path` must exist. Without one, the default search paths are tried
/// and a missing file yields the default configuration.
///
/// Returns the configuration and the path it was loaded from, if any.
///
/// # Errors
///
/// Returns an error if an explicit path does not exist, or if a configuration file
/// exists but cannot be read, parsed or validated.
pub fn load_or_default(path: Option<&Path>) -> Result<(MantleConfig, Option<PathBuf>), ConfigError> {
    if let Some(path) = path {
        let config = load_config_from_path(path)?;
        return Ok((config, Some(path.to_path_buf())));
    }

    match load_config() {
        Ok((config, path)) => Ok((config, Some(path))),
        Err(ConfigError::NotFound) => {
            tracing::debug!("no configuration file found, using defaults");
            Ok((MantleConfig::default(), None))
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_load_or_default_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{ "tiling": { "padding": 4 } }"#).unwrap();

        let (config, path) = load_or_default(Some(file.path())).unwrap();
        assert_eq!(config.tiling.padding, 4.0);
        assert_eq!(path.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_load_or_default_explicit_missing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("config.jsonc");
        assert!(matches!(load_or_default(Some(&missing)), Err(ConfigError::NotFound)));
    }

    #[test]
    fn test_config_error() {
        let err = ConfigError::NotFound;
        assert!(err.to_string().contains("No configuration file found"));
    }
}
