//! Configuration types for Mantle.
//!
//! This module provides all configuration types organized by domain.
//! The configuration file supports JSONC format (JSON with comments).

pub mod root;
pub mod tiling;

// Root config types
pub use root::{ConfigError, MantleConfig, config_paths, load_config, load_config_from_path};
// Tiling types
pub use tiling::{ApplyMode, SpringConfig, TilingConfig, WindowFilterConfig};
