//! Master layout - one master window with remaining windows in a stack.
//!
//! The first window is the "master" and takes `master_ratio` of the usable width.
//! Remaining windows share the column to its right, stacked top to bottom.
//!
//! ```text
//! ┌──────────┬─────┐
//! │          │  2  │
//! │  Master  ├─────┤
//! │          │  3  │
//! └──────────┴─────┘
//! ```
//!
//! `padding` is applied once around the screen edge and once between every pair of
//! adjacent windows, so the gaps between windows equal the gap to the screen edge.
//! Frames are not rounded.

use smallvec::SmallVec;

use super::LAYOUT_INLINE_CAP;
use crate::tiling::state::Rect;

/// Frames in window order (master first).
pub type MasterFrames = SmallVec<[Rect; LAYOUT_INLINE_CAP]>;

/// Computes master-stack frames for `count` windows on a screen.
///
/// # Arguments
///
/// * `count` - Number of windows on the screen (first one is master)
/// * `screen_frame` - The visible frame of the screen
/// * `master_ratio` - Fraction of the usable width given to the master, in `(0, 1)`
/// * `padding` - Gap around the edge and between windows, in pixels
#[allow(clippy::cast_precision_loss)] // Window counts won't exceed f64 precision
#[must_use]
pub fn layout(count: usize, screen_frame: &Rect, master_ratio: f64, padding: f64) -> MasterFrames {
    let mut result = MasterFrames::new();
    if count == 0 {
        return result;
    }

    let usable = screen_frame.inset(padding);

    // Single window - takes the whole usable area
    if count == 1 {
        result.push(usable);
        return result;
    }

    // Master window (left side)
    let master_width = usable.width * master_ratio;
    result.push(Rect::new(usable.x, usable.y, master_width, usable.height));

    // Stack windows (right side, stacked vertically)
    let stack_count = count - 1;
    let stack_x = usable.x + master_width + padding;
    let stack_width = usable.width - master_width - padding;
    let total_stack_gap = padding * (stack_count - 1) as f64;
    let stack_height = (usable.height - total_stack_gap) / stack_count as f64;

    for i in 0..stack_count {
        let y = usable.y + i as f64 * (stack_height + padding);
        result.push(Rect::new(stack_x, y, stack_width, stack_height));
    }

    result
}

// ============================================================================
// Tests
// ============================================================================
