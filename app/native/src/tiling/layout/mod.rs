//! Layout planning for the tiling pipeline.
//!
//! The planner takes the cycle's placement records, groups them by assigned screen
//! and runs the master-stack algorithm on each group. The output is a
//! [`LayoutPlan`]: an ordered list of target frames keyed by window.
//!
//! # Determinism
//!
//! Windows reach the planner in whatever order the discovery queries produced them.
//! To make the plan independent of that order, each screen group is sorted by
//! ascending process ID, then ascending window number. The sort is stable, so two
//! windows of the same process with the same window number keep discovery order.
//!
//! # Performance
//!
//! Plans use `SmallVec` to avoid heap allocations for up to 16 windows (the
//! common case), since a plan is rebuilt on every orchestration cycle.

pub mod master;

use smallvec::SmallVec;

use crate::tiling::state::{PlacementRecord, Rect, ScreenRef, WindowKey};

// ============================================================================
// Layout Result
// ============================================================================

/// Inline capacity for layout results.
pub const LAYOUT_INLINE_CAP: usize = 16;

/// Parameters of the master-stack layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutParams {
    /// Fraction of the usable width given to the master window, in `(0, 1)`.
    pub master_ratio: f64,

    /// Gap around the screen edge and between windows, in pixels.
    pub padding: f64,
}

impl Default for LayoutParams {
    fn default() -> Self { Self { master_ratio: 0.5, padding: 10.0 } }
}

/// A single target frame in a plan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanEntry {
    pub key: WindowKey,
    pub frame: Rect,
}

/// Target frames for one cycle.
///
/// Entries are ordered by screen (enumeration order), then by position in the
/// layout (master first). A window appears at most once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutPlan {
    entries: SmallVec<[PlanEntry; LAYOUT_INLINE_CAP]>,
}

impl LayoutPlan {
    /// Creates an empty plan.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Number of windows in the plan.
    #[must_use]
    pub fn len(&self) -> usize { self.entries.len() }

    /// Whether the plan is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Target frame for a window, if it is part of the plan.
    #[must_use]
    pub fn get(&self, key: &WindowKey) -> Option<Rect> {
        self.entries.iter().find(|entry| entry.key == *key).map(|entry| entry.frame)
    }

    /// Iterates over the entries in plan order.
    pub fn iter(&self) -> impl Iterator<Item = &PlanEntry> { self.entries.iter() }

    fn push(&mut self, key: WindowKey, frame: Rect) { self.entries.push(PlanEntry { key, frame }); }
}

impl<'a> IntoIterator for &'a LayoutPlan {
    type Item = &'a PlanEntry;
    type IntoIter = std::slice::Iter<'a, PlanEntry>;

    fn into_iter(self) -> Self::IntoIter { self.entries.iter() }
}

// ============================================================================
// Main Layout Function
// ============================================================================

/// Computes the layout plan for a cycle.
///
/// # Arguments
///
/// * `records` - Windows with their assigned screen index
/// * `screens` - The cycle's screens, in enumeration order
/// * `params` - Master ratio and padding
///
/// Records pointing at a screen index that does not exist are ignored.
#[must_use]
pub fn plan(records: &[PlacementRecord], screens: &[ScreenRef], params: &LayoutParams) -> LayoutPlan {
    let mut plan = LayoutPlan::new();

    for (index, screen) in screens.iter().enumerate() {
        let mut group: SmallVec<[&PlacementRecord; LAYOUT_INLINE_CAP]> =
            records.iter().filter(|record| record.screen == index).collect();

        if group.is_empty() {
            continue;
        }

        group.sort_by_key(|record| (record.window.key.pid, record.window.ordinal));

        let frames =
            master::layout(group.len(), &screen.visible_frame, params.master_ratio, params.padding);

        for (record, frame) in group.iter().zip(frames) {
            plan.push(record.window.key, frame);
        }
    }

    plan
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::tiling::state::{ObjectRef, WindowInfo};

    fn record(pid: i32, window: u64, ordinal: i64, screen: usize) -> PlacementRecord {
        PlacementRecord {
            window: WindowInfo {
                key: WindowKey::new(pid, ObjectRef(window)),
                frame: Rect::new(0.0, 0.0, 300.0, 300.0),
                resizable: true,
                ordinal,
            },
            screen,
        }
    }

    fn single_screen() -> Vec<ScreenRef> {
        vec![ScreenRef::new(ObjectRef(1), Rect::new(0.0, 0.0, 1000.0, 800.0))]
    }

    #[test]
    fn test_plan_empty() {
        let plan = plan(&[], &single_screen(), &LayoutParams::default());
        assert!(plan.is_empty());
    }

    #[test]
    fn test_plan_lowest_pid_is_master() {
        let params = LayoutParams { master_ratio: 0.6, padding: 10.0 };
        let records = vec![record(5, 50, 0, 0), record(2, 20, 0, 0)];

        let plan = plan(&records, &single_screen(), &params);

        let master = WindowKey::new(2, ObjectRef(20));
        let stack = WindowKey::new(5, ObjectRef(50));
        assert_eq!(plan.get(&master), Some(Rect::new(10.0, 10.0, 588.0, 780.0)));
        assert_eq!(plan.get(&stack), Some(Rect::new(608.0, 10.0, 382.0, 780.0)));
        assert_eq!(plan.iter().next().map(|e| e.key), Some(master));
    }

    #[test]
    fn test_plan_single_window_fills_inset_screen() {
        let params = LayoutParams { master_ratio: 0.5, padding: 25.0 };
        let plan = plan(&[record(9, 1, 0, 0)], &single_screen(), &params);
        assert_eq!(plan.len(), 1);
        assert_eq!(
            plan.get(&WindowKey::new(9, ObjectRef(1))),
            Some(Rect::new(25.0, 25.0, 950.0, 750.0))
        );
    }

    #[test]
    fn test_plan_independent_of_record_order() {
        let params = LayoutParams { master_ratio: 0.55, padding: 8.0 };
        let screens = vec![
            ScreenRef::new(ObjectRef(1), Rect::new(0.0, 25.0, 1440.0, 875.0)),
            ScreenRef::new(ObjectRef(2), Rect::new(1440.0, 0.0, 1920.0, 1080.0)),
        ];
        let records = vec![
            record(30, 3, 0, 0),
            record(10, 1, 0, 1),
            record(20, 2, 0, 0),
            record(40, 4, 0, 1),
            record(5, 5, 0, 0),
        ];

        let expected = plan(&records, &screens, &params);

        let mut reversed = records.clone();
        reversed.reverse();
        assert_eq!(plan(&reversed, &screens, &params), expected);

        let mut rotated = records;
        rotated.rotate_left(2);
        assert_eq!(plan(&rotated, &screens, &params), expected);
    }

    #[test]
    fn test_plan_same_process_ordered_by_window_number() {
        let params = LayoutParams::default();
        let first = vec![record(7, 100, 3, 0), record(7, 200, 1, 0), record(7, 300, 2, 0)];
        let mut second = first.clone();
        second.reverse();

        let a = plan(&first, &single_screen(), &params);
        let b = plan(&second, &single_screen(), &params);
        assert_eq!(a, b);

        let order: Vec<u64> = a.iter().map(|entry| entry.key.window.0).collect();
        assert_eq!(order, vec![200, 300, 100]);
    }

    #[test]
    fn test_plan_groups_per_screen() {
        let params = LayoutParams { master_ratio: 0.5, padding: 0.0 };
        let screens = vec![
            ScreenRef::new(ObjectRef(1), Rect::new(0.0, 0.0, 1000.0, 1000.0)),
            ScreenRef::new(ObjectRef(2), Rect::new(1000.0, 0.0, 1000.0, 1000.0)),
        ];
        let records = vec![record(1, 1, 0, 0), record(2, 2, 0, 1), record(3, 3, 0, 1)];

        let plan = plan(&records, &screens, &params);
        assert_eq!(plan.len(), 3);

        // Alone on the first screen
        assert_eq!(plan.get(&WindowKey::new(1, ObjectRef(1))), Some(Rect::new(0.0, 0.0, 1000.0, 1000.0)));
        // Master and stack on the second screen
        assert_eq!(plan.get(&WindowKey::new(2, ObjectRef(2))), Some(Rect::new(1000.0, 0.0, 500.0, 1000.0)));
        assert_eq!(plan.get(&WindowKey::new(3, ObjectRef(3))), Some(Rect::new(1500.0, 0.0, 500.0, 1000.0)));
    }

    #[test]
    fn test_plan_ignores_unknown_screen_index() {
        let plan = plan(&[record(1, 1, 0, 4)], &single_screen(), &LayoutParams::default());
        assert!(plan.is_empty());
    }
}
