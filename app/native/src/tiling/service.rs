//! Long-running tiling service.
//!
//! [`TilingService::start`] spawns two tokio tasks:
//!
//! - the orchestration loop, which runs one layout cycle per poll interval;
//! - the animation loop (animated mode only), which ticks the spring store at a
//!   fixed rate and sends the resulting place commands to the host.
//!
//! Both loops use `tokio::time::interval` with missed ticks skipped, and each
//! iteration is awaited inside the loop, so cycles never overlap: a cycle that
//! outlives the poll interval delays the next one instead of running beside it.
//!
//! The loops share only the spring store. [`TilingService::shutdown`] signals both
//! loops through a `watch` channel, which also interrupts an in-flight cycle, and
//! waits for them to exit. Dropping the service without calling `shutdown` closes
//! the channel, which stops the loops as well.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::aggregate::join_all_spawned;
use super::animation::{PlaceCommand, SharedIntegrator, SpringIntegrator};
use super::orchestrator::{CycleReport, LayoutOrchestrator};
use super::state::WindowKey;
use crate::config::{ApplyMode, TilingConfig};
use crate::host::{HostError, WindowHost, selectors};

/// Counters and the latest cycle report, shared with the loops.
#[derive(Debug, Default)]
pub struct ServiceStats {
    cycles: AtomicU64,
    ticks: AtomicU64,
    placements: AtomicU64,
    last_report: Mutex<Option<CycleReport>>,
}

impl ServiceStats {
    /// Number of completed layout cycles.
    #[must_use]
    pub fn cycles(&self) -> u64 { self.cycles.load(Ordering::Relaxed) }

    /// Number of animation ticks that produced at least one command.
    #[must_use]
    pub fn ticks(&self) -> u64 { self.ticks.load(Ordering::Relaxed) }

    /// Number of place commands issued by the animation loop.
    #[must_use]
    pub fn placements(&self) -> u64 { self.placements.load(Ordering::Relaxed) }

    /// Report of the most recent completed cycle.
    #[must_use]
    pub fn last_report(&self) -> Option<CycleReport> { self.last_report.lock().clone() }
}

/// Handle to the running orchestration and animation loops.
#[derive(Debug)]
pub struct TilingService {
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
    springs: SharedIntegrator,
    stats: Arc<ServiceStats>,
}

impl TilingService {
    /// Starts the service on the current tokio runtime.
    ///
    /// The first layout cycle runs immediately.
    #[must_use]
    pub fn start<H>(host: Arc<H>, config: &TilingConfig) -> Self
    where
        H: WindowHost + ?Sized + 'static,
    {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let springs = SpringIntegrator::shared(config.spring_params());
        let stats = Arc::new(ServiceStats::default());

        let orchestrator = LayoutOrchestrator::with_springs(Arc::clone(&host), config, Arc::clone(&springs));
        let mut tasks = vec![tokio::spawn(orchestration_loop(
            orchestrator,
            config.poll_interval(),
            shutdown_rx.clone(),
            Arc::clone(&stats),
        ))];

        if config.mode == ApplyMode::Animated {
            tasks.push(tokio::spawn(animation_loop(
                host,
                Arc::clone(&springs),
                config.tick_interval(),
                shutdown_rx,
                Arc::clone(&stats),
            )));
        }

        tracing::info!(
            mode = ?config.mode,
            poll_ms = config.poll_interval_ms,
            "tiling service started"
        );

        Self { shutdown, tasks, springs, stats }
    }

    /// The spring store shared by both loops.
    #[must_use]
    pub const fn springs(&self) -> &SharedIntegrator { &self.springs }

    /// Service counters.
    #[must_use]
    pub fn stats(&self) -> &ServiceStats { &self.stats }

    /// Stops both loops and waits for them to exit.
    pub async fn shutdown(self) {
        // Receivers may already be gone if a loop exited on its own
        let _ = self.shutdown.send(true);

        for task in self.tasks {
            if let Err(err) = task.await {
                tracing::warn!(error = %err, "tiling task did not exit cleanly");
            }
        }

        tracing::info!("tiling service stopped");
    }
}

fn ticker(period: Duration) -> tokio::time::Interval {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

async fn orchestration_loop<H>(
    orchestrator: LayoutOrchestrator<H>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
    stats: Arc<ServiceStats>,
) where
    H: WindowHost + ?Sized,
{
    let mut ticker = ticker(period);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {}
        }

        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            report = orchestrator.run_cycle() => {
                stats.cycles.fetch_add(1, Ordering::Relaxed);
                *stats.last_report.lock() = Some(report);
            }
        }
    }

    tracing::debug!("orchestration loop stopped");
}

async fn animation_loop<H>(
    host: Arc<H>,
    springs: SharedIntegrator,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
    stats: Arc<ServiceStats>,
) where
    H: WindowHost + ?Sized + 'static,
{
    let mut ticker = ticker(period);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {}
        }

        let commands = springs.lock().tick();
        if commands.is_empty() {
            continue;
        }

        stats.ticks.fetch_add(1, Ordering::Relaxed);
        stats.placements.fetch_add(commands.len() as u64, Ordering::Relaxed);

        let stale = tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            stale = place_all(&host, commands) => stale,
        };

        if !stale.is_empty() {
            let mut springs = springs.lock();
            for key in &stale {
                springs.forget(key);
            }
            tracing::debug!(count = stale.len(), "dropped springs of closed windows");
        }
    }

    tracing::debug!("animation loop stopped");
}

/// Sends place commands concurrently and returns the keys of windows that no
/// longer exist.
///
/// Each command runs as its own task, so a slow process cannot hold back the
/// commands of the others on a multi-threaded runtime.
async fn place_all<H>(host: &Arc<H>, commands: Vec<PlaceCommand>) -> Vec<WindowKey>
where
    H: WindowHost + ?Sized + 'static,
{
    join_all_spawned(commands, |command| {
        let host = Arc::clone(host);
        async move {
            let key = command.key;
            match selectors::set_frame(&*host, key.pid, key.window, command.frame, false).await {
                Ok(()) => None,
                Err(HostError::UnknownObject(_) | HostError::ProcessGone(_)) => Some(key),
                Err(err) => {
                    tracing::debug!(%key, error = %err, "place command failed");
                    None
                }
            }
        }
    })
    .await
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{SimWindow, SimulatedHost};
    use crate::tiling::state::Rect;

    fn config(mode: ApplyMode) -> TilingConfig { TilingConfig { mode, ..TilingConfig::default() } }

    fn host() -> Arc<SimulatedHost> {
        let host = Arc::new(SimulatedHost::new());
        host.add_screen(Rect::new(0.0, 0.0, 1000.0, 800.0));
        host.add_process(1, "App");
        host
    }

    #[tokio::test(start_paused = true)]
    async fn test_direct_service_places_and_stops() {
        let host = host();
        let key = host.add_window(1, SimWindow::new(Rect::new(0.0, 0.0, 300.0, 300.0))).unwrap();

        let service = TilingService::start(Arc::clone(&host), &config(ApplyMode::Direct));
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(host.frame(&key), Some(Rect::new(10.0, 10.0, 980.0, 780.0)));
        let cycles = service.stats().cycles();
        assert!(cycles >= 2, "only {cycles} cycles ran");
        assert!(service.stats().last_report().unwrap().completed());

        service.shutdown().await;
        let placed = host.placements().len();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(host.placements().len(), placed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_animated_service_converges() {
        let host = host();
        let key = host.add_window(1, SimWindow::new(Rect::new(0.0, 0.0, 300.0, 300.0))).unwrap();

        let service = TilingService::start(Arc::clone(&host), &config(ApplyMode::Animated));
        tokio::time::sleep(Duration::from_secs(5)).await;

        let target = Rect::new(10.0, 10.0, 980.0, 780.0);
        assert_eq!(host.frame(&key), Some(target));
        assert!(service.springs().lock().is_resting(&key));

        // Intermediate frames were issued, not just the final one
        let placements = host.placements();
        assert!(placements.len() > 2);
        assert!(placements.iter().all(|placement| !placement.animate));
        assert_eq!(placements.last().map(|placement| placement.frame), Some(target));

        // Once resting, ticks stop producing commands
        let settled = placements.len();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(host.placements().len(), settled);

        service.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_animation_loop_forgets_closed_windows() {
        let host = host();
        let key = host.add_window(1, SimWindow::new(Rect::new(0.0, 0.0, 300.0, 300.0))).unwrap();

        let mut tiling = config(ApplyMode::Animated);
        tiling.poll_interval_ms = 10_000;
        let service = TilingService::start(Arc::clone(&host), &tiling);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(service.springs().lock().state(&key).is_some());

        host.remove_window(&key);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(service.springs().lock().state(&key).is_none());

        service.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_service_stops_loops() {
        let host = host();
        host.add_window(1, SimWindow::new(Rect::new(0.0, 0.0, 300.0, 300.0))).unwrap();

        let service = TilingService::start(Arc::clone(&host), &config(ApplyMode::Direct));
        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(service);
        tokio::time::sleep(Duration::from_millis(10)).await;

        let calls = host.call_count();
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(host.call_count(), calls);
    }
}
