//! Tiling configuration types.
//!
//! Layout parameters, the application mode, spring physics and the window frame
//! filter, all under the `tiling` key of the configuration file.

use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tiling::animation::SpringParams;
use crate::tiling::layout::LayoutParams;
use crate::tiling::state::Rect;

/// How planned frames reach the windows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ApplyMode {
    /// Every cycle places windows at their target frame immediately.
    Direct,
    /// Windows spring toward their target frame at a fixed tick rate.
    #[default]
    Animated,
}

/// Spring physics for animated mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct SpringConfig {
    /// Velocity gained per pixel of remaining distance, per tick.
    /// Default: 0.12
    pub stiffness: f64,

    /// Fraction of velocity kept after each tick. Lower values stop faster.
    /// Default: 0.8
    pub damping: f64,

    /// Distance and speed (in pixels) under which an axis counts as settled.
    /// Default: 0.5
    pub threshold_pixels: f64,

    /// Animation ticks per second.
    /// Default: 60
    pub ticks_per_second: u32,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            stiffness: 0.12,
            damping: 0.8,
            threshold_pixels: 0.5,
            ticks_per_second: 60,
        }
    }
}

/// Frame bounds a window must satisfy to be tiled.
///
/// Windows smaller than the minimum size, or positioned far outside any plausible
/// display arrangement, are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct WindowFilterConfig {
    /// Minimum window width in pixels.
    /// Default: 50
    pub min_width: f64,

    /// Minimum window height in pixels.
    /// Default: 50
    pub min_height: f64,

    /// Lowest accepted x or y origin.
    /// Default: -10000
    pub min_coordinate: f64,

    /// Highest accepted x or y origin.
    /// Default: 50000
    pub max_coordinate: f64,
}

impl Default for WindowFilterConfig {
    fn default() -> Self {
        Self {
            min_width: 50.0,
            min_height: 50.0,
            min_coordinate: -10_000.0,
            max_coordinate: 50_000.0,
        }
    }
}

impl WindowFilterConfig {
    /// Whether a frame is large enough and within the accepted coordinate range.
    #[must_use]
    pub fn accepts_frame(&self, frame: &Rect) -> bool {
        let range = self.min_coordinate..=self.max_coordinate;
        frame.width >= self.min_width
            && frame.height >= self.min_height
            && range.contains(&frame.x)
            && range.contains(&frame.y)
    }
}

/// Tiling configuration.
///
/// Example:
/// ```json
/// {
///   "tiling": {
///     "masterRatio": 0.6,
///     "padding": 12,
///     "pollIntervalMs": 128,
///     "mode": "animated",
///     "spring": { "stiffness": 0.12, "damping": 0.8 }
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct TilingConfig {
    /// Fraction of the usable screen width given to the master window.
    /// Must be strictly between 0 and 1.
    /// Default: 0.5
    pub master_ratio: f64,

    /// Gap in pixels around the screen edge and between windows.
    /// Default: 10
    pub padding: f64,

    /// Milliseconds between layout cycles.
    /// Default: 128
    pub poll_interval_ms: u64,

    /// How windows are moved: "direct" or "animated".
    /// Default: "animated"
    pub mode: ApplyMode,

    /// Spring physics for animated mode.
    pub spring: SpringConfig,

    /// Frame bounds a window must satisfy to be tiled.
    pub filter: WindowFilterConfig,
}

impl Default for TilingConfig {
    fn default() -> Self {
        Self {
            master_ratio: 0.5,
            padding: 10.0,
            poll_interval_ms: 128,
            mode: ApplyMode::default(),
            spring: SpringConfig::default(),
            filter: WindowFilterConfig::default(),
        }
    }
}

impl TilingConfig {
    /// Layout parameters for the planner.
    #[must_use]
    pub const fn layout_params(&self) -> LayoutParams {
        LayoutParams {
            master_ratio: self.master_ratio,
            padding: self.padding,
        }
    }

    /// Physics parameters for the spring integrator.
    #[must_use]
    pub const fn spring_params(&self) -> SpringParams {
        SpringParams {
            stiffness: self.spring.stiffness,
            damping: self.spring.damping,
            threshold: self.spring.threshold_pixels,
        }
    }

    /// Period of the orchestration loop.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration { Duration::from_millis(self.poll_interval_ms) }

    /// Period of the animation tick loop.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(1) / self.spring.ticks_per_second.max(1)
    }
}
