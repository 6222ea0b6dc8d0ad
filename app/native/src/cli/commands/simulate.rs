//! Simulate command.
//!
//! Runs the tiling service against an in-memory [`SimulatedHost`] populated with
//! random windows, then prints where every window ended up.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use colored::Colorize;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Modify, Style};
use tabled::{Table, Tabled};

use crate::cli::output::{format_rect, print_highlighted_json, truncate};
use crate::config::{ApplyMode, MantleConfig, TilingConfig};
use crate::error::{MantleError, MantleResult};
use crate::host::{SimWindow, SimulatedHost};
use crate::tiling::animation::Phase;
use crate::tiling::{CycleReport, Pid, Rect, TilingService, WindowKey};

/// Width of each simulated screen.
const SCREEN_WIDTH: f64 = 1440.0;

/// Height of each simulated screen's visible frame.
const SCREEN_HEIGHT: f64 = 875.0;

/// Height reserved at the top of each simulated screen.
const MENU_BAR_HEIGHT: f64 = 25.0;

/// First pid handed out to simulated processes.
const FIRST_PID: Pid = 100;

/// Arguments of `mantle simulate`.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct SimulateArgs {
    /// How long to run the service, in milliseconds.
    #[arg(long, short, default_value_t = 2000, value_name = "MS")]
    pub duration_ms: u64,

    /// Number of simulated client processes.
    #[arg(long, short, default_value_t = 2)]
    pub processes: u16,

    /// Total number of windows, spread across the processes.
    #[arg(long, short, default_value_t = 5)]
    pub windows: u16,

    /// Number of screens, laid out side by side.
    #[arg(long, default_value_t = 1)]
    pub screens: u8,

    /// Seed for window placement and reply latency.
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Upper bound of the random delay before each host reply, in milliseconds.
    #[arg(long, default_value_t = 5, value_name = "MS")]
    pub latency_ms: u64,

    /// Place windows directly instead of animating them.
    #[arg(long)]
    pub direct: bool,

    /// Output the result as JSON.
    #[arg(long, short)]
    pub json: bool,
}

impl Default for SimulateArgs {
    fn default() -> Self {
        Self {
            duration_ms: 2000,
            processes: 2,
            windows: 5,
            screens: 1,
            seed: 0,
            latency_ms: 5,
            direct: false,
            json: false,
        }
    }
}

impl SimulateArgs {
    fn validate(&self) -> MantleResult<()> {
        if self.duration_ms == 0 {
            return Err(MantleError::InvalidArguments("--duration-ms must be positive".to_string()));
        }
        if self.processes == 0 {
            return Err(MantleError::InvalidArguments("--processes must be at least 1".to_string()));
        }
        if self.screens == 0 {
            return Err(MantleError::InvalidArguments("--screens must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// A simulated window and where it ended up.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedWindow {
    pub key: WindowKey,
    pub app: String,
    pub initial: Rect,
    pub placed: Rect,
    pub phase: Option<Phase>,
}

/// Outcome of a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationOutcome {
    pub mode: ApplyMode,
    pub cycles: u64,
    pub ticks: u64,
    pub placements: u64,
    pub last_report: Option<CycleReport>,
    pub windows: Vec<SimulatedWindow>,
}

/// Runs `mantle simulate`.
///
/// # Errors
///
/// Returns an error if the arguments are out of range or the runtime cannot be built.
pub fn execute(args: &SimulateArgs, config: &MantleConfig) -> MantleResult<()> {
    let outcome = simulate(args, config)?;

    if args.json {
        print_highlighted_json(&outcome_json(&outcome));
    } else {
        print_outcome(&outcome);
    }

    Ok(())
}

/// Builds the simulated world, runs the service for the requested duration and
/// collects the final frames.
///
/// # Errors
///
/// Returns an error if the arguments are out of range or the runtime cannot be built.
pub fn simulate(args: &SimulateArgs, config: &MantleConfig) -> MantleResult<SimulationOutcome> {
    args.validate()?;

    let mut tiling = config.tiling.clone();
    if args.direct {
        tiling.mode = ApplyMode::Direct;
    }

    let (host, apps) = build_host(args);
    let host = Arc::new(host);
    let initial = host.windows();

    let runtime = tokio::runtime::Builder::new_current_thread().enable_time().build()?;
    let (mut outcome, phases) = runtime.block_on(run_service(
        Arc::clone(&host),
        &tiling,
        Duration::from_millis(args.duration_ms),
    ));

    outcome.windows = initial
        .into_iter()
        .map(|(key, initial)| SimulatedWindow {
            key,
            app: apps.get(&key.pid).cloned().unwrap_or_default(),
            initial,
            placed: host.frame(&key).unwrap_or(initial),
            phase: phases.get(&key).copied().flatten(),
        })
        .collect();

    Ok(outcome)
}

/// Runs the service and returns its counters plus the spring phase of every
/// window, sampled just before shutdown.
async fn run_service(
    host: Arc<SimulatedHost>,
    tiling: &TilingConfig,
    duration: Duration,
) -> (SimulationOutcome, HashMap<WindowKey, Option<Phase>>) {
    tracing::info!(?duration, mode = ?tiling.mode, "starting simulation");

    let keys: Vec<WindowKey> = host.windows().into_iter().map(|(key, _)| key).collect();
    let service = TilingService::start(host, tiling);
    tokio::time::sleep(duration).await;

    let phases = {
        let springs = service.springs().lock();
        keys.into_iter().map(|key| (key, springs.phase(&key))).collect()
    };

    let stats = service.stats();
    let outcome = SimulationOutcome {
        mode: tiling.mode,
        cycles: stats.cycles(),
        ticks: stats.ticks(),
        placements: stats.placements(),
        last_report: stats.last_report(),
        windows: Vec::new(),
    };

    service.shutdown().await;
    (outcome, phases)
}

/// Populates a simulated host with screens side by side and randomly placed windows.
///
/// Returns the host and the display name of every process.
fn build_host(args: &SimulateArgs) -> (SimulatedHost, HashMap<Pid, String>) {
    let host = SimulatedHost::new()
        .with_latency(Duration::from_millis(args.latency_ms))
        .with_seed(args.seed);
    let mut rng = StdRng::seed_from_u64(args.seed);

    let screens: Vec<Rect> = (0..args.screens)
        .map(|index| Rect::new(f64::from(index) * SCREEN_WIDTH, MENU_BAR_HEIGHT, SCREEN_WIDTH, SCREEN_HEIGHT))
        .collect();
    for screen in &screens {
        host.add_screen(*screen);
    }

    let mut apps = HashMap::new();
    let pids: Vec<Pid> = (0..args.processes).map(|index| FIRST_PID + Pid::from(index)).collect();
    for (index, pid) in pids.iter().enumerate() {
        let name = format!("App {}", index + 1);
        host.add_process(*pid, name.clone());
        apps.insert(*pid, name);
    }

    for number in 0..args.windows {
        let pid = pids[usize::from(number) % pids.len()];
        let screen = screens[rng.random_range(0..screens.len())];
        let width = rng.random_range(200.0..screen.width * 0.8).round();
        let height = rng.random_range(150.0..screen.height * 0.8).round();
        let frame = Rect::new(
            screen.x + rng.random_range(0.0..screen.width - width),
            screen.y + rng.random_range(0.0..screen.height - height),
            width,
            height,
        )
        .rounded();

        host.add_window(pid, SimWindow::new(frame).with_number(i64::from(number) + 1));
    }

    tracing::debug!(
        screens = screens.len(),
        processes = pids.len(),
        windows = args.windows,
        "simulated host ready"
    );

    (host, apps)
}

fn print_outcome(outcome: &SimulationOutcome) {
    #[derive(Tabled)]
    struct WindowRow {
        #[tabled(rename = "Window")]
        key: String,
        #[tabled(rename = "App")]
        app: String,
        #[tabled(rename = "Initial")]
        initial: String,
        #[tabled(rename = "Final")]
        placed: String,
        #[tabled(rename = "Spring")]
        phase: String,
    }

    let rows: Vec<WindowRow> = outcome
        .windows
        .iter()
        .map(|window| WindowRow {
            key: window.key.to_string(),
            app: truncate(&window.app, 20),
            initial: format_rect(&window.initial),
            placed: format_rect(&window.placed),
            phase: match window.phase {
                Some(Phase::Resting) => "resting".green().to_string(),
                Some(Phase::Animating) => "animating".yellow().to_string(),
                None => "-".dimmed().to_string(),
            },
        })
        .collect();

    if rows.is_empty() {
        println!("No windows were simulated.");
    } else {
        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(2..4)).with(Alignment::right()))
            .to_string();
        println!("{table}");
    }

    println!(
        "\n{} mode: {} cycles, {} animation ticks, {} placements",
        format!("{:?}", outcome.mode).bold(),
        outcome.cycles,
        outcome.ticks,
        outcome.placements,
    );

    if let Some(reason) = outcome.last_report.as_ref().and_then(|report| report.skipped.as_ref()) {
        println!("Last cycle skipped: {}", reason.to_string().yellow());
    }
}

fn outcome_json(outcome: &SimulationOutcome) -> serde_json::Value {
    let windows: Vec<serde_json::Value> = outcome
        .windows
        .iter()
        .map(|window| {
            serde_json::json!({
                "pid": window.key.pid,
                "window": window.key.window.0,
                "app": window.app,
                "initial": window.initial,
                "final": window.placed,
                "resting": window.phase.map(|phase| phase == Phase::Resting),
            })
        })
        .collect();

    serde_json::json!({
        "mode": outcome.mode,
        "cycles": outcome.cycles,
        "ticks": outcome.ticks,
        "placements": outcome.placements,
        "windows": windows,
    })
}
