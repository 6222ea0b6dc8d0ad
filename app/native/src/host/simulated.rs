//! In-memory host with randomized latency and failure injection.
//!
//! `SimulatedHost` models a set of connected processes sharing one display
//! arrangement. Every call sleeps for a random delay (bounded by the configured
//! maximum latency) before it is resolved against the current state, so replies
//! complete in arbitrary order and observe changes made while they were in flight.
//!
//! All setup methods take `&self`; the host is meant to be shared behind an `Arc`
//! between the service under test and the code that mutates the world.

use std::time::Duration;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::selectors::{
    APPLICATION_CLASS, CAN_BECOME_KEY_WINDOW, FRAME, IS_MINIATURIZED, IS_VISIBLE, SCREEN_CLASS,
    SCREENS, SET_FRAME, SHARED_APPLICATION, STYLE_MASK, VISIBLE_FRAME, WINDOW_NUMBER, WINDOWS,
};
use super::{HostError, HostResult, QueryArg, QueryTarget, QueryValue, ReturnType, WindowHost};
use crate::tiling::state::{ObjectRef, Pid, ProcessHandle, Rect, WindowKey};

/// Style mask of a regular titled, closable, miniaturizable, resizable window.
const DEFAULT_STYLE_MASK: u64 = 0b1111;

/// First object reference handed out; keeps references away from zero.
const FIRST_OBJECT_REF: u64 = 0x1000;

// ============================================================================
// Public Types
// ============================================================================

/// Attributes of a simulated window.
#[derive(Debug, Clone, PartialEq)]
pub struct SimWindow {
    pub frame: Rect,
    pub visible: bool,
    pub minimized: bool,
    pub can_become_key: bool,
    pub style_mask: u64,
    pub number: i64,
}

impl SimWindow {
    /// A visible, resizable, focusable window with the given frame.
    #[must_use]
    pub const fn new(frame: Rect) -> Self {
        Self {
            frame,
            visible: true,
            minimized: false,
            can_become_key: true,
            style_mask: DEFAULT_STYLE_MASK,
            number: 0,
        }
    }

    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    #[must_use]
    pub const fn minimized(mut self) -> Self {
        self.minimized = true;
        self
    }

    #[must_use]
    pub const fn panel(mut self) -> Self {
        self.can_become_key = false;
        self
    }

    /// Clears the resizable bit.
    #[must_use]
    pub const fn fixed_size(mut self) -> Self {
        self.style_mask &= !super::selectors::STYLE_MASK_RESIZABLE;
        self
    }

    #[must_use]
    pub const fn with_number(mut self, number: i64) -> Self {
        self.number = number;
        self
    }
}

/// A `setFrame:display:animate:` command received by the simulated host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimPlacement {
    pub key: WindowKey,
    pub frame: Rect,
    pub animate: bool,
}

// ============================================================================
// World State
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum FailureRule {
    Selector(String),
    Object(ObjectRef, String),
    Process(Pid, String),
}

impl FailureRule {
    fn matches(&self, pid: Pid, target: QueryTarget, selector: &str) -> bool {
        match self {
            Self::Selector(name) => name == selector,
            Self::Object(object, name) => target == QueryTarget::Object(*object) && name == selector,
            Self::Process(rule_pid, name) => *rule_pid == pid && name == selector,
        }
    }
}

#[derive(Debug)]
struct SimProcess {
    handle: ProcessHandle,
    app: ObjectRef,
    windows: Vec<(ObjectRef, SimWindow)>,
}

#[derive(Debug)]
struct SimScreen {
    reference: ObjectRef,
    visible_frame: Option<Rect>,
}

#[derive(Debug)]
struct World {
    next_ref: u64,
    processes: Vec<SimProcess>,
    screens: Vec<SimScreen>,
    failures: Vec<FailureRule>,
    placements: Vec<SimPlacement>,
    calls: usize,
}

impl World {
    const fn new() -> Self {
        Self {
            next_ref: FIRST_OBJECT_REF,
            processes: Vec::new(),
            screens: Vec::new(),
            failures: Vec::new(),
            placements: Vec::new(),
            calls: 0,
        }
    }

    fn allocate(&mut self) -> ObjectRef {
        let reference = ObjectRef(self.next_ref);
        self.next_ref += 0x10;
        reference
    }

    fn process(&self, pid: Pid) -> HostResult<&SimProcess> {
        self.processes
            .iter()
            .find(|process| process.handle.pid == pid)
            .ok_or(HostError::ProcessGone(pid))
    }

    fn process_mut(&mut self, pid: Pid) -> Option<&mut SimProcess> {
        self.processes.iter_mut().find(|process| process.handle.pid == pid)
    }

    fn window_mut(&mut self, key: &WindowKey) -> Option<&mut SimWindow> {
        self.process_mut(key.pid)?
            .windows
            .iter_mut()
            .find(|(reference, _)| *reference == key.window)
            .map(|(_, window)| window)
    }

    fn check(&mut self, pid: Pid, target: QueryTarget, selector: &str) -> HostResult<()> {
        self.calls += 1;
        self.process(pid)?;
        if self.failures.iter().any(|rule| rule.matches(pid, target, selector)) {
            return Err(HostError::Transport(format!("injected failure for `{selector}`")));
        }
        Ok(())
    }

    fn resolve(&mut self, pid: Pid, target: QueryTarget, selector: &str) -> HostResult<QueryValue> {
        self.check(pid, target, selector)?;
        let process = self.process(pid)?;

        let object = match target {
            QueryTarget::Class(APPLICATION_CLASS) if selector == SHARED_APPLICATION => {
                return Ok(QueryValue::Object(process.app));
            }
            QueryTarget::Class(SCREEN_CLASS) if selector == SCREENS => {
                let screens = self.screens.iter().map(|screen| screen.reference).collect();
                return Ok(QueryValue::Objects(screens));
            }
            QueryTarget::Class(_) => return Err(HostError::UnsupportedSelector(selector.to_string())),
            QueryTarget::Object(object) => object,
        };

        if object == process.app {
            return match selector {
                WINDOWS => Ok(QueryValue::Objects(
                    process.windows.iter().map(|(reference, _)| *reference).collect(),
                )),
                _ => Err(HostError::UnsupportedSelector(selector.to_string())),
            };
        }

        if let Some(screen) = self.screens.iter().find(|screen| screen.reference == object) {
            return match selector {
                VISIBLE_FRAME => Ok(screen.visible_frame.map_or(QueryValue::Null, QueryValue::Rect)),
                _ => Err(HostError::UnsupportedSelector(selector.to_string())),
            };
        }

        let Some((_, window)) = process.windows.iter().find(|(reference, _)| *reference == object)
        else {
            return Err(HostError::UnknownObject(object));
        };

        match selector {
            IS_VISIBLE => Ok(QueryValue::Bool(window.visible)),
            IS_MINIATURIZED => Ok(QueryValue::Bool(window.minimized)),
            CAN_BECOME_KEY_WINDOW => Ok(QueryValue::Bool(window.can_become_key)),
            FRAME => Ok(QueryValue::Rect(window.frame)),
            STYLE_MASK => Ok(QueryValue::UInt(window.style_mask)),
            WINDOW_NUMBER => Ok(QueryValue::Int(window.number)),
            _ => Err(HostError::UnsupportedSelector(selector.to_string())),
        }
    }

    fn execute(
        &mut self,
        pid: Pid,
        target: QueryTarget,
        selector: &str,
        args: &[QueryArg],
    ) -> HostResult<()> {
        self.check(pid, target, selector)?;

        let QueryTarget::Object(object) = target else {
            return Err(HostError::UnsupportedSelector(selector.to_string()));
        };
        if selector != SET_FRAME {
            return Err(HostError::UnsupportedSelector(selector.to_string()));
        }

        let (frame, animate) = match args {
            [QueryArg::Rect(frame), _, QueryArg::Bool(animate)] => (*frame, *animate),
            _ => return Err(HostError::Transport(format!("bad arguments for `{selector}`"))),
        };

        let key = WindowKey::new(pid, object);
        let window = self.window_mut(&key).ok_or(HostError::UnknownObject(object))?;
        window.frame = frame;

        tracing::trace!(%key, %frame, animate, "simulated placement");
        self.placements.push(SimPlacement { key, frame, animate });
        Ok(())
    }
}

// ============================================================================
// Simulated Host
// ============================================================================

/// In-memory [`WindowHost`].
#[derive(Debug)]
pub struct SimulatedHost {
    world: Mutex<World>,
    rng: Mutex<StdRng>,
    max_latency: Duration,
}

impl Default for SimulatedHost {
    fn default() -> Self { Self::new() }
}

impl SimulatedHost {
    /// Creates an empty host that replies without delay.
    #[must_use]
    pub fn new() -> Self {
        Self {
            world: Mutex::new(World::new()),
            rng: Mutex::new(StdRng::seed_from_u64(0)),
            max_latency: Duration::ZERO,
        }
    }

    /// Sets the upper bound of the random per-call delay.
    #[must_use]
    pub fn with_latency(mut self, max_latency: Duration) -> Self {
        self.max_latency = max_latency;
        self
    }

    /// Seeds the delay generator.
    #[must_use]
    pub fn with_seed(self, seed: u64) -> Self {
        *self.rng.lock() = StdRng::seed_from_u64(seed);
        self
    }

    fn next_delay(&self) -> Duration {
        if self.max_latency.is_zero() {
            return Duration::ZERO;
        }
        let max = u64::try_from(self.max_latency.as_micros()).unwrap_or(u64::MAX);
        Duration::from_micros(self.rng.lock().random_range(0..=max))
    }

    // ------------------------------------------------------------------------
    // World setup
    // ------------------------------------------------------------------------

    /// Adds a screen. Screens are reported in insertion order.
    pub fn add_screen(&self, visible_frame: Rect) -> ObjectRef {
        let mut world = self.world.lock();
        let reference = world.allocate();
        world.screens.push(SimScreen { reference, visible_frame: Some(visible_frame) });
        reference
    }

    /// Adds a screen whose visible frame query returns nil.
    pub fn add_screen_without_frame(&self) -> ObjectRef {
        let mut world = self.world.lock();
        let reference = world.allocate();
        world.screens.push(SimScreen { reference, visible_frame: None });
        reference
    }

    /// Connects a process and returns its application object.
    ///
    /// Connecting an already connected PID returns the existing application object.
    pub fn add_process(&self, pid: Pid, name: impl Into<String>) -> ObjectRef {
        let mut world = self.world.lock();
        if let Some(process) = world.process_mut(pid) {
            return process.app;
        }

        let app = world.allocate();
        world.processes.push(SimProcess {
            handle: ProcessHandle::new(pid, name),
            app,
            windows: Vec::new(),
        });
        app
    }

    /// Adds a window to a connected process.
    ///
    /// Returns `None` if the process is not connected.
    pub fn add_window(&self, pid: Pid, window: SimWindow) -> Option<WindowKey> {
        let mut world = self.world.lock();
        world.process(pid).ok()?;
        let reference = world.allocate();
        world.process_mut(pid)?.windows.push((reference, window));
        Some(WindowKey::new(pid, reference))
    }

    /// Disconnects a process. Returns whether it was connected.
    pub fn remove_process(&self, pid: Pid) -> bool {
        let mut world = self.world.lock();
        let before = world.processes.len();
        world.processes.retain(|process| process.handle.pid != pid);
        world.processes.len() != before
    }

    /// Closes a window. Returns whether it existed.
    pub fn remove_window(&self, key: &WindowKey) -> bool {
        let mut world = self.world.lock();
        let Some(process) = world.process_mut(key.pid) else {
            return false;
        };
        let before = process.windows.len();
        process.windows.retain(|(reference, _)| *reference != key.window);
        process.windows.len() != before
    }

    /// Mutates a window in place. Returns whether it existed.
    pub fn update_window(&self, key: &WindowKey, update: impl FnOnce(&mut SimWindow)) -> bool {
        self.world.lock().window_mut(key).map(update).is_some()
    }

    // ------------------------------------------------------------------------
    // Failure injection
    // ------------------------------------------------------------------------

    /// Makes every call of `selector` fail.
    pub fn fail_selector(&self, selector: &str) {
        self.world.lock().failures.push(FailureRule::Selector(selector.to_string()));
    }

    /// Makes calls of `selector` on `object` fail.
    pub fn fail_object(&self, object: ObjectRef, selector: &str) {
        self.world.lock().failures.push(FailureRule::Object(object, selector.to_string()));
    }

    /// Makes calls of `selector` inside process `pid` fail.
    pub fn fail_process(&self, pid: Pid, selector: &str) {
        self.world.lock().failures.push(FailureRule::Process(pid, selector.to_string()));
    }

    /// Removes every injected failure.
    pub fn clear_failures(&self) { self.world.lock().failures.clear(); }

    // ------------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------------

    /// Current frame of a window.
    #[must_use]
    pub fn frame(&self, key: &WindowKey) -> Option<Rect> {
        self.world.lock().window_mut(key).map(|window| window.frame)
    }

    /// Every window of every connected process with its current frame, in
    /// connection order.
    #[must_use]
    pub fn windows(&self) -> Vec<(WindowKey, Rect)> {
        let world = self.world.lock();
        world
            .processes
            .iter()
            .flat_map(|process| {
                process.windows.iter().map(|(reference, window)| {
                    (WindowKey::new(process.handle.pid, *reference), window.frame)
                })
            })
            .collect()
    }

    /// Placement commands received so far.
    #[must_use]
    pub fn placements(&self) -> Vec<SimPlacement> { self.world.lock().placements.clone() }

    /// Forgets the recorded placement commands.
    pub fn clear_placements(&self) { self.world.lock().placements.clear(); }

    /// Number of queries and commands received so far.
    #[must_use]
    pub fn call_count(&self) -> usize { self.world.lock().calls }
}

impl WindowHost for SimulatedHost {
    fn enumerate_processes(&self) -> BoxFuture<'_, HostResult<Vec<ProcessHandle>>> {
        let delay = self.next_delay();
        Box::pin(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let world = self.world.lock();
            Ok(world.processes.iter().map(|process| process.handle.clone()).collect())
        })
    }

    fn query<'a>(
        &'a self,
        pid: Pid,
        target: QueryTarget,
        selector: &'a str,
        _args: Vec<QueryArg>,
        _returns: ReturnType,
    ) -> BoxFuture<'a, HostResult<QueryValue>> {
        let delay = self.next_delay();
        Box::pin(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            self.world.lock().resolve(pid, target, selector)
        })
    }

    fn command<'a>(
        &'a self,
        pid: Pid,
        target: QueryTarget,
        selector: &'a str,
        args: Vec<QueryArg>,
    ) -> BoxFuture<'a, HostResult<()>> {
        let delay = self.next_delay();
        Box::pin(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            self.world.lock().execute(pid, target, selector, &args)
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
