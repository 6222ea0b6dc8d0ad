//! Core value types shared by the tiling pipeline.
//!
//! These types form the per-cycle data model:
//! - `ProcessHandle` is a connected client process (ID from the host)
//! - `WindowKey` identifies a window across cycles (owning PID + host object reference)
//! - `WindowInfo` is a window that passed validation, with the attributes layout needs
//! - `ScreenRef` is a display and its usable frame
//!
//! None of these carry identity beyond a single cycle except `WindowKey`, which is
//! also the key of the animation registry.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Process identifier as reported by the host.
pub type Pid = i32;

// ============================================================================
// Geometry Types
// ============================================================================

/// A rectangle with position and size.
///
/// The origin convention (top-left or bottom-left) belongs to the host; nothing in
/// the tiling core depends on it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle.
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Get the center point of this rectangle.
    #[must_use]
    pub fn center(&self) -> (f64, f64) { (self.x + self.width / 2.0, self.y + self.height / 2.0) }

    /// Check if this rectangle contains a point, counting all four edges as inside.
    #[must_use]
    pub fn contains_point_inclusive(&self, x: f64, y: f64) -> bool {
        x >= self.x && y >= self.y && x <= self.x + self.width && y <= self.y + self.height
    }

    /// Shrink the rectangle by `amount` on every side.
    #[must_use]
    pub fn inset(&self, amount: f64) -> Self {
        Self::new(
            self.x + amount,
            self.y + amount,
            2.0f64.mul_add(-amount, self.width),
            2.0f64.mul_add(-amount, self.height),
        )
    }

    /// Round every field to the nearest integer (device pixels).
    #[must_use]
    pub fn rounded(&self) -> Self {
        Self::new(self.x.round(), self.y.round(), self.width.round(), self.height.round())
    }

    /// The four fields as an array, in `x, y, width, height` order.
    #[must_use]
    pub const fn to_array(self) -> [f64; 4] { [self.x, self.y, self.width, self.height] }

    /// Build a rectangle from `x, y, width, height` components.
    #[must_use]
    pub const fn from_array(values: [f64; 4]) -> Self {
        Self::new(values[0], values[1], values[2], values[3])
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{x: {}, y: {}, w: {}, h: {}}}", self.x, self.y, self.width, self.height)
    }
}

// ============================================================================
// Identity Types
// ============================================================================

/// Opaque reference to an object living in a client process (window, screen, app).
///
/// Only equality is meaningful. The numeric value is whatever the host reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef(pub u64);

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{:#x}", self.0) }
}

/// A connected client process.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessHandle {
    /// Process identifier.
    pub pid: Pid,

    /// Display name reported at registration.
    pub name: String,
}

impl ProcessHandle {
    /// Create a new process handle.
    #[must_use]
    pub fn new(pid: Pid, name: impl Into<String>) -> Self { Self { pid, name: name.into() } }
}

/// Stable identity of a window: owning process plus host object reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowKey {
    pub pid: Pid,
    pub window: ObjectRef,
}

impl WindowKey {
    /// Create a new window key.
    #[must_use]
    pub const fn new(pid: Pid, window: ObjectRef) -> Self { Self { pid, window } }
}

impl fmt::Display for WindowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.pid, self.window)
    }
}

// ============================================================================
// Per-cycle Types
// ============================================================================

/// A window that passed validation during discovery.
///
/// Only windows that are visible, not minimized, able to become key and have an
/// acceptable frame are turned into a `WindowInfo`; the remaining attributes are
/// what the filter and the planner need.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WindowInfo {
    /// Window identity.
    pub key: WindowKey,

    /// Current frame as reported by the host.
    pub frame: Rect,

    /// Whether the style mask has the resizable bit set.
    pub resizable: bool,

    /// Host window number; 0 when the query failed.
    pub ordinal: i64,
}

/// A display and its usable area.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScreenRef {
    /// Host object reference of the screen.
    pub reference: ObjectRef,

    /// Usable frame (excluding menu bar, dock and similar reserved regions).
    pub visible_frame: Rect,
}

impl ScreenRef {
    /// Create a new screen reference.
    #[must_use]
    pub const fn new(reference: ObjectRef, visible_frame: Rect) -> Self {
        Self { reference, visible_frame }
    }
}

/// A window together with the index of the screen it was assigned to.
///
/// Built once per cycle, consumed by the planner and discarded.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacementRecord {
    pub window: WindowInfo,

    /// Index into the cycle's screen list.
    pub screen: usize,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    mod rect_tests {
        use super::*;

        #[test]
        fn test_rect_new() {
            let rect = Rect::new(10.0, 20.0, 100.0, 200.0);
            assert_eq!(rect.x, 10.0);
            assert_eq!(rect.y, 20.0);
            assert_eq!(rect.width, 100.0);
            assert_eq!(rect.height, 200.0);
        }

        #[test]
        fn test_rect_center() {
            assert_eq!(Rect::new(0.0, 0.0, 100.0, 100.0).center(), (50.0, 50.0));
            assert_eq!(Rect::new(10.0, 20.0, 100.0, 100.0).center(), (60.0, 70.0));
        }

        #[test]
        fn test_rect_contains_point_inclusive_edges() {
            let rect = Rect::new(10.0, 10.0, 100.0, 100.0);
            assert!(rect.contains_point_inclusive(50.0, 50.0));
            assert!(rect.contains_point_inclusive(10.0, 10.0));
            assert!(rect.contains_point_inclusive(110.0, 110.0));
            assert!(!rect.contains_point_inclusive(110.5, 50.0));
            assert!(!rect.contains_point_inclusive(5.0, 50.0));
        }

        #[test]
        fn test_rect_inset() {
            let rect = Rect::new(0.0, 0.0, 1000.0, 800.0).inset(10.0);
            assert_eq!(rect, Rect::new(10.0, 10.0, 980.0, 780.0));
        }

        #[test]
        fn test_rect_rounded() {
            let rect = Rect::new(10.4, 20.5, 99.6, -0.4).rounded();
            assert_eq!(rect, Rect::new(10.0, 21.0, 100.0, -0.0));
        }

        #[test]
        fn test_rect_array_conversion() {
            let rect = Rect::new(1.0, 2.0, 3.0, 4.0);
            assert_eq!(rect.to_array(), [1.0, 2.0, 3.0, 4.0]);
            assert_eq!(Rect::from_array(rect.to_array()), rect);
        }
    }

    #[test]
    fn test_window_key_display() {
        let key = WindowKey::new(42, ObjectRef(0x1f));
        assert_eq!(key.to_string(), "42:0x1f");
    }

    #[test]
    fn test_window_key_identity() {
        let a = WindowKey::new(1, ObjectRef(7));
        let b = WindowKey::new(1, ObjectRef(7));
        let c = WindowKey::new(2, ObjectRef(7));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
