//! Screen and window discovery across connected processes.
//!
//! Discovery is a tree of joins:
//!
//! ```text
//! processes ──join──▶ per process: windows ──join──▶ per window:
//!                                                   validity (4-way join)
//!                                                   then metadata (3-way join)
//! ```
//!
//! A failed query drops the item it belongs to and nothing else. Results come back
//! in enumeration order at every level.

use std::collections::{HashMap, HashSet};

use futures::FutureExt;
use futures::future::BoxFuture;

use super::aggregate::{join_all, join_all_true, join_ok};
use super::state::{ObjectRef, Pid, ProcessHandle, ScreenRef, WindowInfo, WindowKey};
use crate::config::WindowFilterConfig;
use crate::host::{WindowHost, selectors};

// ============================================================================
// Screens
// ============================================================================

/// Enumerates screens and their visible frames.
///
/// The first process (in the given order) that reports at least one screen is
/// used as the reference. Screens whose visible frame cannot be queried are
/// omitted. Returns an empty list if no process reports a screen.
pub async fn discover_screens<H: WindowHost + ?Sized>(
    host: &H,
    processes: &[ProcessHandle],
) -> Vec<ScreenRef> {
    for process in processes {
        let pid = process.pid;
        let references = match selectors::screens(host, pid).await {
            Ok(references) if !references.is_empty() => references,
            Ok(_) => {
                tracing::trace!(pid, "process reported no screens");
                continue;
            }
            Err(err) => {
                tracing::debug!(pid, error = %err, "screen enumeration failed");
                continue;
            }
        };

        return join_ok("visible frame", references, |reference| async move {
            let frame = selectors::visible_frame(host, pid, reference).await?;
            Ok::<_, crate::host::HostError>(ScreenRef::new(reference, frame))
        })
        .await;
    }

    Vec::new()
}

// ============================================================================
// Windows
// ============================================================================

/// Windows found in one discovery pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowDiscovery {
    /// Valid windows, grouped by process in process order, then in the order each
    /// process listed them.
    pub windows: Vec<WindowInfo>,

    /// Every window each process listed, valid or not. Processes whose listing
    /// failed are absent.
    pub listed: HashMap<Pid, HashSet<ObjectRef>>,
}

/// Discovers the valid windows of every process.
pub async fn discover_windows<H: WindowHost + ?Sized>(
    host: &H,
    processes: &[ProcessHandle],
    filter: &WindowFilterConfig,
) -> WindowDiscovery {
    let per_process = join_all(processes, |process| {
        discover_process_windows(host, process.pid, filter)
    })
    .await;

    let mut discovery = WindowDiscovery::default();
    for (pid, listed, windows) in per_process {
        discovery.listed.insert(pid, listed.into_iter().collect());
        discovery.windows.extend(windows);
    }
    discovery
}

async fn discover_process_windows<H: WindowHost + ?Sized>(
    host: &H,
    pid: Pid,
    filter: &WindowFilterConfig,
) -> Option<(Pid, Vec<ObjectRef>, Vec<WindowInfo>)> {
    let app = selectors::shared_application(host, pid)
        .await
        .inspect_err(|err| tracing::debug!(pid, error = %err, "application lookup failed"))
        .ok()?;

    let listed = selectors::windows(host, pid, app)
        .await
        .inspect_err(|err| tracing::debug!(pid, error = %err, "window enumeration failed"))
        .ok()?;

    let windows =
        join_all(listed.iter().copied(), |window| inspect_window(host, pid, window, filter)).await;
    Some((pid, listed, windows))
}

/// Validates a window and collects the attributes the planner needs.
///
/// Returns `None` if the window fails validation or its frame cannot be read. A
/// failed style mask query counts as not resizable and a failed window number
/// query as ordinal 0.
pub async fn inspect_window<H: WindowHost + ?Sized>(
    host: &H,
    pid: Pid,
    window: ObjectRef,
    filter: &WindowFilterConfig,
) -> Option<WindowInfo> {
    if !is_window_valid(host, pid, window, filter).await {
        return None;
    }

    let (style_mask, number, frame) = futures::join!(
        selectors::style_mask(host, pid, window),
        selectors::window_number(host, pid, window),
        selectors::frame(host, pid, window),
    );

    let key = WindowKey::new(pid, window);
    let frame = frame
        .inspect_err(|err| tracing::debug!(%key, error = %err, "frame query failed"))
        .ok()?;

    Some(WindowInfo {
        key,
        frame,
        resizable: style_mask.is_ok_and(selectors::is_resizable),
        ordinal: number.unwrap_or(0),
    })
}

/// Whether a window is visible, not minimized, has an acceptable frame and can
/// become key.
///
/// All four checks run concurrently and always complete; a failed query counts
/// as a failed check.
pub async fn is_window_valid<H: WindowHost + ?Sized>(
    host: &H,
    pid: Pid,
    window: ObjectRef,
    filter: &WindowFilterConfig,
) -> bool {
    let checks: Vec<BoxFuture<'_, bool>> = vec![
        async move { selectors::is_visible(host, pid, window).await.unwrap_or(false) }.boxed(),
        async move { !selectors::is_minimized(host, pid, window).await.unwrap_or(true) }.boxed(),
        async move {
            selectors::frame(host, pid, window)
                .await
                .is_ok_and(|frame| filter.accepts_frame(&frame))
        }
        .boxed(),
        async move { selectors::can_become_key(host, pid, window).await.unwrap_or(false) }.boxed(),
    ];

    join_all_true(checks).await
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::host::{SimWindow, SimulatedHost};
    use crate::tiling::state::Rect;

    fn frame() -> Rect { Rect::new(100.0, 100.0, 400.0, 300.0) }

    async fn processes(host: &SimulatedHost) -> Vec<ProcessHandle> {
        host.enumerate_processes().await.unwrap()
    }

    #[tokio::test]
    async fn test_discover_screens_uses_first_answering_process() {
        let host = SimulatedHost::new();
        host.add_process(1, "Broken");
        host.add_process(2, "Fine");
        let main = host.add_screen(Rect::new(0.0, 0.0, 1440.0, 900.0));
        host.fail_process(1, selectors::SCREENS);

        let screens = discover_screens(&host, &processes(&host).await).await;
        assert_eq!(screens, vec![ScreenRef::new(main, Rect::new(0.0, 0.0, 1440.0, 900.0))]);
    }

    #[tokio::test]
    async fn test_discover_screens_omits_failed_frames() {
        let host = SimulatedHost::new();
        host.add_process(1, "App");
        let left = host.add_screen(Rect::new(0.0, 0.0, 1000.0, 800.0));
        host.add_screen_without_frame();
        let right = host.add_screen(Rect::new(1000.0, 0.0, 1000.0, 800.0));

        let screens = discover_screens(&host, &processes(&host).await).await;
        let references: Vec<ObjectRef> = screens.iter().map(|s| s.reference).collect();
        assert_eq!(references, vec![left, right]);
    }

    #[tokio::test]
    async fn test_discover_screens_without_processes_or_screens() {
        let host = SimulatedHost::new();
        assert!(discover_screens(&host, &[]).await.is_empty());

        host.add_process(1, "App");
        assert!(discover_screens(&host, &processes(&host).await).await.is_empty());
    }

    #[tokio::test]
    async fn test_is_window_valid_checks_all_conditions() {
        let host = SimulatedHost::new();
        host.add_process(1, "App");
        let filter = WindowFilterConfig::default();

        let cases = [
            (SimWindow::new(frame()), true),
            (SimWindow::new(frame()).hidden(), false),
            (SimWindow::new(frame()).minimized(), false),
            (SimWindow::new(frame()).panel(), false),
            (SimWindow::new(Rect::new(0.0, 0.0, 40.0, 300.0)), false),
            (SimWindow::new(Rect::new(60_000.0, 0.0, 400.0, 300.0)), false),
            (SimWindow::new(frame()).fixed_size(), true),
        ];

        for (window, expected) in cases {
            let key = host.add_window(1, window.clone()).unwrap();
            assert_eq!(
                is_window_valid(&host, 1, key.window, &filter).await,
                expected,
                "{window:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_is_window_valid_failed_query_is_invalid() {
        let host = SimulatedHost::new();
        host.add_process(1, "App");
        let key = host.add_window(1, SimWindow::new(frame())).unwrap();
        host.fail_object(key.window, selectors::CAN_BECOME_KEY_WINDOW);

        assert!(!is_window_valid(&host, 1, key.window, &WindowFilterConfig::default()).await);
    }

    #[tokio::test]
    async fn test_inspect_window_metadata_fallbacks() {
        let host = SimulatedHost::new();
        host.add_process(1, "App");
        let key = host.add_window(1, SimWindow::new(frame()).with_number(12)).unwrap();
        let filter = WindowFilterConfig::default();

        let info = inspect_window(&host, 1, key.window, &filter).await.unwrap();
        assert_eq!(info.key, key);
        assert_eq!(info.frame, frame());
        assert!(info.resizable);
        assert_eq!(info.ordinal, 12);

        host.fail_object(key.window, selectors::WINDOW_NUMBER);
        host.fail_object(key.window, selectors::STYLE_MASK);
        let info = inspect_window(&host, 1, key.window, &filter).await.unwrap();
        assert_eq!(info.ordinal, 0);
        assert!(!info.resizable);
    }

    #[tokio::test]
    async fn test_discover_windows_skips_failed_processes() {
        let host = SimulatedHost::new();
        host.add_process(1, "A");
        host.add_process(2, "B");
        host.add_process(3, "C");
        let a = host.add_window(1, SimWindow::new(frame())).unwrap();
        host.add_window(2, SimWindow::new(frame())).unwrap();
        let c1 = host.add_window(3, SimWindow::new(frame())).unwrap();
        host.add_window(3, SimWindow::new(frame()).hidden()).unwrap();
        let c3 = host.add_window(3, SimWindow::new(frame())).unwrap();
        host.fail_process(2, selectors::WINDOWS);

        let discovery =
            discover_windows(&host, &processes(&host).await, &WindowFilterConfig::default()).await;
        let keys: Vec<WindowKey> = discovery.windows.iter().map(|w| w.key).collect();
        assert_eq!(keys, vec![a, c1, c3]);
    }

    #[tokio::test]
    async fn test_discover_windows_lists_invalid_windows_too() {
        let host = SimulatedHost::new();
        host.add_process(1, "A");
        host.add_process(2, "B");
        let shown = host.add_window(1, SimWindow::new(frame())).unwrap();
        let minimized = host.add_window(1, SimWindow::new(frame()).minimized()).unwrap();
        host.add_window(2, SimWindow::new(frame())).unwrap();
        host.fail_process(2, selectors::WINDOWS);

        let discovery =
            discover_windows(&host, &processes(&host).await, &WindowFilterConfig::default()).await;

        assert_eq!(discovery.windows.len(), 1);
        assert_eq!(discovery.listed.len(), 1);
        assert_eq!(
            discovery.listed.get(&1),
            Some(&HashSet::from([shown.window, minimized.window]))
        );
        assert!(!discovery.listed.contains_key(&2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_discover_windows_order_independent_of_latency() {
        let mut results = Vec::new();

        for seed in 0..8 {
            let host = SimulatedHost::new().with_latency(Duration::from_millis(30)).with_seed(seed);
            for pid in [4, 1, 3] {
                host.add_process(pid, format!("app-{pid}"));
                for n in 0..3 {
                    host.add_window(pid, SimWindow::new(frame()).with_number(n)).unwrap();
                }
            }

            let discovery =
                discover_windows(&host, &processes(&host).await, &WindowFilterConfig::default())
                    .await;
            results.push(discovery.windows);
        }

        assert_eq!(results[0].len(), 9);
        assert!(results.iter().all(|windows| *windows == results[0]));
    }
}
