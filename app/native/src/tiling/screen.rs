//! Window to screen assignment.
//!
//! A window belongs to the first screen (in enumeration order) whose visible frame
//! contains the window's center point, edges included. When no screen contains it
//! (the window straddles a gap between monitors, or the frame was rounded past an
//! edge) the window falls back to the first enumerated screen.
//!
//! This is a first-match rule, not a nearest-match rule: two screens whose
//! inclusive bounds share an edge both contain a center lying on that edge, and the
//! one enumerated first wins.

use super::state::{PlacementRecord, Rect, ScreenRef, WindowInfo};

/// Returns the index of the screen a frame belongs to.
///
/// Returns `None` only when `screens` is empty.
#[must_use]
pub fn assign_screen(frame: &Rect, screens: &[ScreenRef]) -> Option<usize> {
    if screens.is_empty() {
        return None;
    }

    let (cx, cy) = frame.center();
    let index = screens
        .iter()
        .position(|screen| screen.visible_frame.contains_point_inclusive(cx, cy))
        .unwrap_or(0);

    Some(index)
}

/// Builds placement records for every window.
///
/// Returns an empty list when there are no screens.
#[must_use]
pub fn assign_all(windows: Vec<WindowInfo>, screens: &[ScreenRef]) -> Vec<PlacementRecord> {
    windows
        .into_iter()
        .filter_map(|window| {
            let screen = assign_screen(&window.frame, screens)?;
            Some(PlacementRecord { window, screen })
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
