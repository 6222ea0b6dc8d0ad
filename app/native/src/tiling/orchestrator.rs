//! One layout cycle: discover, assign, plan, apply.
//!
//! The orchestrator owns no timer. Each call to [`LayoutOrchestrator::run_cycle`]
//! performs a full pass from scratch; nothing discovered in one cycle is reused in
//! the next, apart from the spring store used in animated mode.
//!
//! A cycle short-circuits (and reports a [`SkipReason`]) when there are no
//! processes, no screens or no tileable windows. Failed queries never abort a cycle;
//! they only drop the item they belong to.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use super::aggregate::join_ok;
use super::animation::{SharedIntegrator, SpringIntegrator, TargetUpdate};
use super::discovery::{discover_screens, discover_windows};
use super::layout::{self, LayoutParams, LayoutPlan};
use super::screen::assign_all;
use super::state::{PlacementRecord, Pid, Rect, ScreenRef, WindowKey};
use crate::config::{ApplyMode, TilingConfig, WindowFilterConfig};
use crate::host::{WindowHost, selectors};

// ============================================================================
// Cycle Results
// ============================================================================

/// Why a cycle stopped before planning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The host could not list processes.
    EnumerationFailed(String),
    NoProcesses,
    NoScreens,
    /// No window passed validation and the resizable filter.
    NoWindows,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EnumerationFailed(err) => write!(f, "process enumeration failed: {err}"),
            Self::NoProcesses => write!(f, "no processes"),
            Self::NoScreens => write!(f, "no screens"),
            Self::NoWindows => write!(f, "no tileable windows"),
        }
    }
}

/// Summary of one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub processes: usize,
    pub screens: usize,

    /// Windows that passed validation.
    pub windows_discovered: usize,

    /// Validated windows that are also resizable.
    pub windows_tiled: usize,

    pub plan_entries: usize,

    /// Direct mode: successful place commands. Animated mode: springs created or
    /// retargeted.
    pub applied: usize,

    /// Springs dropped because their process vanished or no longer lists the
    /// window.
    pub springs_purged: usize,

    pub skipped: Option<SkipReason>,
}

impl CycleReport {
    /// Whether the cycle reached the planning stage.
    #[must_use]
    pub const fn completed(&self) -> bool { self.skipped.is_none() }
}

/// The planning half of a cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CyclePlan {
    pub screens: Vec<ScreenRef>,
    pub records: Vec<PlacementRecord>,
    pub plan: LayoutPlan,
}

impl CyclePlan {
    /// Frame a window had when it was discovered this cycle.
    #[must_use]
    pub fn discovered_frame(&self, key: &WindowKey) -> Option<Rect> {
        self.records
            .iter()
            .find(|record| record.window.key == *key)
            .map(|record| record.window.frame)
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Runs layout cycles against a host.
pub struct LayoutOrchestrator<H: WindowHost + ?Sized> {
    host: Arc<H>,
    params: LayoutParams,
    filter: WindowFilterConfig,
    mode: ApplyMode,
    springs: SharedIntegrator,
}

impl<H: WindowHost + ?Sized> LayoutOrchestrator<H> {
    /// Creates an orchestrator with its own spring store.
    #[must_use]
    pub fn new(host: Arc<H>, config: &TilingConfig) -> Self {
        let springs = SpringIntegrator::shared(config.spring_params());
        Self::with_springs(host, config, springs)
    }

    /// Creates an orchestrator that feeds an existing spring store.
    #[must_use]
    pub fn with_springs(host: Arc<H>, config: &TilingConfig, springs: SharedIntegrator) -> Self {
        Self {
            host,
            params: config.layout_params(),
            filter: config.filter.clone(),
            mode: config.mode,
            springs,
        }
    }

    /// The spring store targets are written to in animated mode.
    #[must_use]
    pub const fn springs(&self) -> &SharedIntegrator { &self.springs }

    #[must_use]
    pub const fn mode(&self) -> ApplyMode { self.mode }

    /// Discovers screens and windows and computes the layout plan.
    ///
    /// Always returns a report; the plan is `None` when the cycle was skipped.
    pub async fn plan_cycle(&self) -> (CycleReport, Option<CyclePlan>) {
        let host = &*self.host;
        let mut report = CycleReport::default();

        let processes = match host.enumerate_processes().await {
            Ok(processes) => processes,
            Err(err) => {
                report.skipped = Some(SkipReason::EnumerationFailed(err.to_string()));
                return (report, None);
            }
        };
        report.processes = processes.len();

        if self.mode == ApplyMode::Animated {
            let live: HashSet<Pid> = processes.iter().map(|process| process.pid).collect();
            report.springs_purged = self.springs.lock().retain_processes(&live);
        }

        if processes.is_empty() {
            report.skipped = Some(SkipReason::NoProcesses);
            return (report, None);
        }

        let screens = discover_screens(host, &processes).await;
        report.screens = screens.len();
        if screens.is_empty() {
            report.skipped = Some(SkipReason::NoScreens);
            return (report, None);
        }

        let discovery = discover_windows(host, &processes, &self.filter).await;
        report.windows_discovered = discovery.windows.len();

        if self.mode == ApplyMode::Animated {
            report.springs_purged += self.springs.lock().retain_listed(&discovery.listed);
        }

        let tileable: Vec<_> = discovery.windows.into_iter().filter(|window| window.resizable).collect();
        report.windows_tiled = tileable.len();
        if tileable.is_empty() {
            report.skipped = Some(SkipReason::NoWindows);
            return (report, None);
        }

        let records = assign_all(tileable, &screens);
        let plan = layout::plan(&records, &screens, &self.params);
        report.plan_entries = plan.len();

        (report, Some(CyclePlan { screens, records, plan }))
    }

    /// Runs one full cycle and applies the result.
    pub async fn run_cycle(&self) -> CycleReport {
        let (mut report, cycle) = self.plan_cycle().await;

        if let Some(cycle) = cycle {
            report.applied = match self.mode {
                ApplyMode::Direct => self.apply_direct(&cycle).await,
                ApplyMode::Animated => self.apply_animated(&cycle),
            };
        }

        match &report.skipped {
            Some(reason) => tracing::trace!(
                processes = report.processes,
                screens = report.screens,
                reason = %reason,
                "layout cycle skipped"
            ),
            None => tracing::debug!(
                processes = report.processes,
                screens = report.screens,
                windows = report.windows_discovered,
                tiled = report.windows_tiled,
                applied = report.applied,
                "layout cycle complete"
            ),
        }

        report
    }

    /// Places every planned window at its rounded target frame.
    async fn apply_direct(&self, cycle: &CyclePlan) -> usize {
        let host = &*self.host;
        let placed = join_ok("place window", &cycle.plan, |entry| async move {
            let key = entry.key;
            selectors::set_frame(host, key.pid, key.window, entry.frame.rounded(), false).await
        })
        .await;

        placed.len()
    }

    /// Hands every planned frame to the spring store.
    fn apply_animated(&self, cycle: &CyclePlan) -> usize {
        let current: HashMap<WindowKey, Rect> = cycle
            .records
            .iter()
            .map(|record| (record.window.key, record.window.frame))
            .collect();

        let mut springs = self.springs.lock();
        let mut applied = 0;
        for entry in &cycle.plan {
            let initial = current.get(&entry.key).copied().unwrap_or(entry.frame);
            if springs.set_target(entry.key, entry.frame, initial) != TargetUpdate::Unchanged {
                applied += 1;
            }
        }

        applied
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{SimWindow, SimulatedHost};
    use crate::tiling::animation::Phase;

    fn config(mode: ApplyMode) -> TilingConfig {
        TilingConfig { master_ratio: 0.6, padding: 10.0, mode, ..TilingConfig::default() }
    }

    fn window(x: f64) -> SimWindow { SimWindow::new(Rect::new(x, 100.0, 300.0, 300.0)) }

    fn host_with_screen() -> Arc<SimulatedHost> {
        let host = Arc::new(SimulatedHost::new());
        host.add_screen(Rect::new(0.0, 0.0, 1000.0, 800.0));
        host
    }

    #[tokio::test]
    async fn test_run_cycle_direct_places_windows() {
        let host = host_with_screen();
        host.add_process(5, "Five");
        host.add_process(2, "Two");
        let five = host.add_window(5, window(100.0)).unwrap();
        let two = host.add_window(2, window(500.0)).unwrap();

        let orchestrator = LayoutOrchestrator::new(Arc::clone(&host), &config(ApplyMode::Direct));
        let report = orchestrator.run_cycle().await;

        assert!(report.completed());
        assert_eq!(report.plan_entries, 2);
        assert_eq!(report.applied, 2);
        assert_eq!(host.frame(&two), Some(Rect::new(10.0, 10.0, 588.0, 780.0)));
        assert_eq!(host.frame(&five), Some(Rect::new(608.0, 10.0, 382.0, 780.0)));
        assert!(orchestrator.springs().lock().is_empty());
    }

    #[tokio::test]
    async fn test_run_cycle_direct_rounds_frames() {
        let host = Arc::new(SimulatedHost::new());
        host.add_screen(Rect::new(0.0, 0.0, 1001.0, 801.0));
        host.add_process(1, "A");
        host.add_process(2, "B");
        host.add_process(3, "C");
        for pid in 1..=3 {
            host.add_window(pid, window(0.0)).unwrap();
        }

        let orchestrator = LayoutOrchestrator::new(Arc::clone(&host), &config(ApplyMode::Direct));
        orchestrator.run_cycle().await;

        for placement in host.placements() {
            assert_eq!(placement.frame, placement.frame.rounded());
            assert!(!placement.animate);
        }
    }

    #[tokio::test]
    async fn test_run_cycle_animated_sets_targets() {
        let host = host_with_screen();
        host.add_process(1, "App");
        let key = host.add_window(1, window(100.0)).unwrap();

        let orchestrator = LayoutOrchestrator::new(Arc::clone(&host), &config(ApplyMode::Animated));
        let report = orchestrator.run_cycle().await;
        assert_eq!(report.applied, 1);
        assert!(host.placements().is_empty());

        {
            let springs = orchestrator.springs().lock();
            let state = springs.state(&key).unwrap();
            assert_eq!(state.current(), Rect::new(100.0, 100.0, 300.0, 300.0));
            assert_eq!(state.target(), Rect::new(10.0, 10.0, 980.0, 780.0));
            assert_eq!(state.phase(), Phase::Animating);
        }

        // Same plan again: nothing to retarget
        let report = orchestrator.run_cycle().await;
        assert_eq!(report.applied, 0);
    }

    #[tokio::test]
    async fn test_run_cycle_purges_springs_of_vanished_processes() {
        let host = host_with_screen();
        host.add_process(1, "A");
        host.add_process(2, "B");
        let a = host.add_window(1, window(0.0)).unwrap();
        let b = host.add_window(2, window(400.0)).unwrap();

        let orchestrator = LayoutOrchestrator::new(Arc::clone(&host), &config(ApplyMode::Animated));
        orchestrator.run_cycle().await;
        assert_eq!(orchestrator.springs().lock().len(), 2);

        host.remove_process(2);
        let report = orchestrator.run_cycle().await;
        assert_eq!(report.springs_purged, 1);

        let springs = orchestrator.springs().lock();
        assert!(springs.state(&a).is_some());
        assert!(springs.state(&b).is_none());
        // The survivor is retargeted to fill the screen
        assert_eq!(springs.state(&a).unwrap().target(), Rect::new(10.0, 10.0, 980.0, 780.0));
    }

    #[tokio::test]
    async fn test_run_cycle_purges_springs_of_closed_windows() {
        let host = host_with_screen();
        host.add_process(1, "App");
        let kept = host.add_window(1, window(0.0)).unwrap();
        let closed = host.add_window(1, window(400.0)).unwrap();
        let minimized = host.add_window(1, window(600.0)).unwrap();

        let orchestrator = LayoutOrchestrator::new(Arc::clone(&host), &config(ApplyMode::Animated));
        orchestrator.run_cycle().await;
        assert_eq!(orchestrator.springs().lock().len(), 3);

        host.remove_window(&closed);
        host.update_window(&minimized, |window| window.minimized = true);
        let report = orchestrator.run_cycle().await;
        assert_eq!(report.springs_purged, 1);

        let springs = orchestrator.springs().lock();
        assert!(springs.state(&kept).is_some());
        assert!(springs.state(&closed).is_none());
        assert!(springs.state(&minimized).is_some());
    }

    #[tokio::test]
    async fn test_run_cycle_skip_reasons() {
        let host = Arc::new(SimulatedHost::new());
        let orchestrator = LayoutOrchestrator::new(Arc::clone(&host), &config(ApplyMode::Direct));
        assert_eq!(orchestrator.run_cycle().await.skipped, Some(SkipReason::NoProcesses));

        host.add_process(1, "App");
        let report = orchestrator.run_cycle().await;
        assert_eq!(report.skipped, Some(SkipReason::NoScreens));
        assert_eq!(report.processes, 1);

        host.add_screen(Rect::new(0.0, 0.0, 1000.0, 800.0));
        host.add_window(1, window(0.0).fixed_size()).unwrap();
        let report = orchestrator.run_cycle().await;
        assert_eq!(report.skipped, Some(SkipReason::NoWindows));
        assert_eq!(report.windows_discovered, 1);
        assert_eq!(report.windows_tiled, 0);
        assert!(host.placements().is_empty());
    }

    #[tokio::test]
    async fn test_plan_cycle_partial_screen_failure_falls_back() {
        let host = Arc::new(SimulatedHost::new());
        let left = host.add_screen(Rect::new(0.0, 0.0, 1000.0, 800.0));
        host.add_screen(Rect::new(1000.0, 0.0, 1000.0, 800.0));
        host.add_process(1, "App");
        // Lives on the right screen, whose frame query will fail
        host.add_window(1, window(1200.0)).unwrap();
        host.fail_object(left, selectors::VISIBLE_FRAME);

        let orchestrator = LayoutOrchestrator::new(Arc::clone(&host), &config(ApplyMode::Direct));
        let (report, cycle) = orchestrator.plan_cycle().await;
        let cycle = cycle.unwrap();

        assert_eq!(report.screens, 1);
        assert_eq!(cycle.records[0].screen, 0);
        assert_eq!(cycle.plan.iter().next().unwrap().frame, Rect::new(1010.0, 10.0, 980.0, 780.0));
    }

    #[tokio::test]
    async fn test_plan_cycle_excludes_failed_window_queries() {
        let host = host_with_screen();
        host.add_process(1, "App");
        let good = host.add_window(1, window(0.0)).unwrap();
        let bad = host.add_window(1, window(300.0)).unwrap();
        host.fail_object(bad.window, selectors::IS_VISIBLE);

        let orchestrator = LayoutOrchestrator::new(Arc::clone(&host), &config(ApplyMode::Direct));
        let (report, cycle) = orchestrator.plan_cycle().await;
        let cycle = cycle.unwrap();

        assert_eq!(report.windows_discovered, 1);
        assert!(cycle.plan.get(&good).is_some());
        assert!(cycle.plan.get(&bad).is_none());
        assert_eq!(cycle.discovered_frame(&good), Some(Rect::new(0.0, 100.0, 300.0, 300.0)));
    }

    #[test]
    fn test_skip_reason_display() {
        assert_eq!(SkipReason::NoScreens.to_string(), "no screens");
        assert!(
            SkipReason::EnumerationFailed("gone".into()).to_string().contains("gone")
        );
    }
}
