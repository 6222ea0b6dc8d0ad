//! Root configuration type and loading.
//!
//! The configuration file supports JSONC format (JSON with comments).
//! Both single-line (`//`) and multi-line (`/* */`) comments are stripped
//! before parsing.

use std::fs;
use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::tiling::TilingConfig;

/// Supported configuration file names, in priority order.
const CONFIG_FILE_NAMES: [&str; 2] = ["config.jsonc", "config.json"];

/// Configuration file names looked up directly in the home directory.
const HOME_CONFIG_FILE_NAMES: [&str; 2] = [".mantle.jsonc", ".mantle.json"];

/// Name of the application configuration directory.
const CONFIG_DIR_NAME: &str = "mantle";

/// Errors that can occur when loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No configuration file was found in any of the expected locations.
    #[error(
        "No configuration file found. Expected at ~/.config/mantle/config.jsonc or ~/.mantle.jsonc"
    )]
    NotFound,

    /// The configuration file exists but could not be read.
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file contains invalid JSON.
    #[error("Failed to parse configuration file: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is outside its accepted range.
    #[error("Invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct MantleConfig {
    /// Tiling layout and animation configuration.
    ///
    /// Example:
    /// ```json
    /// {
    ///   "tiling": {
    ///     "masterRatio": 0.5,
    ///     "padding": 10,
    ///     "mode": "animated"
    ///   }
    /// }
    /// ```
    pub tiling: TilingConfig,
}

impl MantleConfig {
    /// Checks every value against its accepted range.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let tiling = &self.tiling;

        if !(tiling.master_ratio > 0.0 && tiling.master_ratio < 1.0) {
            return Err(invalid("tiling.masterRatio", format!("{} is not in (0, 1)", tiling.master_ratio)));
        }
        if !(tiling.padding >= 0.0 && tiling.padding.is_finite()) {
            return Err(invalid("tiling.padding", format!("{} is negative", tiling.padding)));
        }
        if tiling.poll_interval_ms == 0 {
            return Err(invalid("tiling.pollIntervalMs", "must be at least 1".to_string()));
        }
        if !(tiling.spring.stiffness > 0.0 && tiling.spring.stiffness.is_finite()) {
            return Err(invalid("tiling.spring.stiffness", "must be positive".to_string()));
        }
        if !(tiling.spring.damping > 0.0 && tiling.spring.damping < 1.0) {
            return Err(invalid(
                "tiling.spring.damping",
                format!("{} is not in (0, 1)", tiling.spring.damping),
            ));
        }
        if !(tiling.spring.threshold_pixels > 0.0 && tiling.spring.threshold_pixels.is_finite()) {
            return Err(invalid("tiling.spring.thresholdPixels", "must be positive".to_string()));
        }
        if tiling.spring.ticks_per_second == 0 || tiling.spring.ticks_per_second > 1000 {
            return Err(invalid(
                "tiling.spring.ticksPerSecond",
                format!("{} is not in 1..=1000", tiling.spring.ticks_per_second),
            ));
        }
        if tiling.filter.min_coordinate > tiling.filter.max_coordinate {
            return Err(invalid(
                "tiling.filter.minCoordinate",
                "must not exceed maxCoordinate".to_string(),
            ));
        }

        Ok(())
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}

/// Returns the list of configuration file paths to search, in priority order.
///
/// 1. `$XDG_CONFIG_HOME/mantle/` (when set)
/// 2. `~/.config/mantle/`
/// 3. The platform configuration directory (`~/Library/Application Support/mantle/` on macOS)
/// 4. `~/.mantle.jsonc`, `~/.mantle.json`
///
/// Within each directory `config.jsonc` is preferred over `config.json`.
#[must_use]
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    let push_dir = |dir: PathBuf, paths: &mut Vec<PathBuf>| {
        for filename in CONFIG_FILE_NAMES {
            let path = dir.join(filename);
            // XDG_CONFIG_HOME is often ~/.config itself
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    };

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        push_dir(PathBuf::from(xdg_config).join(CONFIG_DIR_NAME), &mut paths);
    }

    if let Some(home) = dirs::home_dir() {
        push_dir(home.join(".config").join(CONFIG_DIR_NAME), &mut paths);
    }

    if let Some(config_dir) = dirs::config_dir() {
        push_dir(config_dir.join(CONFIG_DIR_NAME), &mut paths);
    }

    if let Some(home) = dirs::home_dir() {
        for filename in HOME_CONFIG_FILE_NAMES {
            paths.push(home.join(filename));
        }
    }

    paths
}

/// Loads the configuration from the first available config file.
///
/// # Errors
///
/// Returns `ConfigError::NotFound` if no configuration file exists in any of the expected
/// locations, or the errors of [`load_config_from_path`] for the file that was found.
pub fn load_config() -> Result<(MantleConfig, PathBuf), ConfigError> {
    for path in config_paths() {
        if path.exists() {
            let config = load_config_from_path(&path)?;
            return Ok((config, path));
        }
    }

    Err(ConfigError::NotFound)
}

/// Loads and validates the configuration from a specific file.
///
/// A leading `~` in the path is expanded to the home directory.
///
/// # Errors
///
/// Returns `ConfigError::NotFound` if the file does not exist, `ConfigError::Io` if it
/// could not be read, `ConfigError::Parse` if it is not valid JSONC and
/// `ConfigError::Invalid` if a value is out of range.
pub fn load_config_from_path(path: &Path) -> Result<MantleConfig, ConfigError> {
    let expanded = PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref());
    if !expanded.exists() {
        return Err(ConfigError::NotFound);
    }

    let file = fs::File::open(&expanded)?;
    let reader = json_comments::StripComments::new(file);
    let config: MantleConfig = serde_json::from_reader(reader)?;
    config.validate()?;

    tracing::debug!(path = %expanded.display(), "loaded configuration");
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::config::ApplyMode;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".jsonc").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(MantleConfig::default().validate().is_ok());
    }

    #[test]
    fn test_load_config_from_path_strips_comments() {
        let file = write_config(
            r#"{
                // tiling options
                "tiling": {
                    /* wider master */
                    "masterRatio": 0.65,
                    "mode": "direct"
                }
            }"#,
        );

        let config = load_config_from_path(file.path()).unwrap();
        assert_eq!(config.tiling.master_ratio, 0.65);
        assert_eq!(config.tiling.mode, ApplyMode::Direct);
        assert_eq!(config.tiling.padding, 10.0);
    }

    #[test]
    fn test_load_config_from_path_empty_object_uses_defaults() {
        let file = write_config("{}");
        assert_eq!(load_config_from_path(file.path()).unwrap(), MantleConfig::default());
    }

    #[test]
    fn test_load_config_from_path_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config_from_path(&dir.path().join("nope.jsonc"));
        assert!(matches!(result, Err(ConfigError::NotFound)));
    }

    #[test]
    fn test_load_config_from_path_parse_error() {
        let file = write_config(r#"{ "tiling": { "masterRatio": "wide" } }"#);
        assert!(matches!(load_config_from_path(file.path()), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_from_path_rejects_invalid_values() {
        let file = write_config(r#"{ "tiling": { "masterRatio": 1.5 } }"#);
        match load_config_from_path(file.path()) {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, "tiling.masterRatio"),
            other => panic!("expected invalid value error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_each_field() {
        let cases: [(&str, fn(&mut MantleConfig)); 8] = [
            ("tiling.masterRatio", |c| c.tiling.master_ratio = 0.0),
            ("tiling.padding", |c| c.tiling.padding = -1.0),
            ("tiling.pollIntervalMs", |c| c.tiling.poll_interval_ms = 0),
            ("tiling.spring.stiffness", |c| c.tiling.spring.stiffness = 0.0),
            ("tiling.spring.damping", |c| c.tiling.spring.damping = 1.0),
            ("tiling.spring.thresholdPixels", |c| c.tiling.spring.threshold_pixels = 0.0),
            ("tiling.spring.ticksPerSecond", |c| c.tiling.spring.ticks_per_second = 0),
            ("tiling.filter.minCoordinate", |c| c.tiling.filter.min_coordinate = 60_000.0),
        ];

        for (expected, mutate) in cases {
            let mut config = MantleConfig::default();
            mutate(&mut config);
            match config.validate() {
                Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, expected),
                other => panic!("{expected}: expected invalid value error, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_config_paths_prefers_jsonc() {
        let paths = config_paths();
        // No paths at all only without a home directory
        if let Some(first) = paths.first() {
            assert!(first.ends_with("mantle/config.jsonc"));
        }
    }

    #[test]
    fn test_config_error_display() {
        assert!(ConfigError::NotFound.to_string().contains("No configuration file found"));
        let err = ConfigError::Invalid { field: "tiling.padding", reason: "-1 is negative".into() };
        assert_eq!(err.to_string(), "Invalid value for `tiling.padding`: -1 is negative");
    }
}
