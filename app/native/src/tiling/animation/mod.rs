//! Spring-animated window placement.
//!
//! The [`SpringIntegrator`] is the single owner of per-window animation state. The
//! orchestrator feeds it targets after each layout cycle; a separate fixed-rate tick
//! advances every animating window and returns the place commands to issue.
//!
//! # Architecture
//!
//! ```text
//! orchestration cycle ──set_target──▶ ┌──────────────────┐
//!                                      │ SpringIntegrator │ (Arc<Mutex<..>>)
//! tick loop (60 Hz) ─────tick────────▶ └────────┬─────────┘
//!                                               │ Vec<PlaceCommand>
//!                                               ▼
//!                                        host set-frame calls
//! ```
//!
//! Both producers lock the shared store only for the synchronous update; the lock is
//! never held across an await point.
//!
//! # Eviction
//!
//! Entries are keyed by [`WindowKey`] and live until removed with
//! [`SpringIntegrator::forget`], [`SpringIntegrator::retain_processes`] or
//! [`SpringIntegrator::retain_listed`]. Each animated cycle drops every window of a
//! process that is no longer connected, then every window its still-connected
//! process no longer lists. A window that is merely hidden or minimized is still
//! listed and keeps its spring.

mod spring;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
pub use spring::{
    DEFAULT_DAMPING, DEFAULT_STIFFNESS, DEFAULT_THRESHOLD, Phase, SpringParams, SpringState, Step,
};

use crate::tiling::state::{ObjectRef, Pid, Rect, WindowKey};

/// Shared handle to the integrator, used by the orchestration and tick loops.
pub type SharedIntegrator = Arc<Mutex<SpringIntegrator>>;

/// A set-frame instruction produced by a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaceCommand {
    pub key: WindowKey,

    /// Frame rounded to whole pixels.
    pub frame: Rect,
}

/// What [`SpringIntegrator::set_target`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetUpdate {
    /// First target for this window; a new spring was created.
    Created,
    /// The target changed and the spring was (re-)armed.
    Retargeted,
    /// Same target as before; nothing changed.
    Unchanged,
}

/// Registry of per-window springs.
#[derive(Debug, Default)]
pub struct SpringIntegrator {
    params: SpringParams,
    states: HashMap<WindowKey, SpringState>,
}

impl SpringIntegrator {
    /// Creates an empty integrator with the given parameters.
    #[must_use]
    pub fn new(params: SpringParams) -> Self { Self { params, states: HashMap::new() } }

    /// Creates an empty integrator wrapped for sharing between loops.
    #[must_use]
    pub fn shared(params: SpringParams) -> SharedIntegrator { Arc::new(Mutex::new(Self::new(params))) }

    /// The integrator's parameters.
    #[must_use]
    pub const fn params(&self) -> &SpringParams { &self.params }

    /// Sets the target frame of a window.
    ///
    /// `initial_frame` is only used when the window has no spring yet; it becomes
    /// the starting position.
    pub fn set_target(&mut self, key: WindowKey, target: Rect, initial_frame: Rect) -> TargetUpdate {
        match self.states.get_mut(&key) {
            Some(state) => {
                if state.retarget(target) {
                    tracing::trace!(%key, %target, "spring retargeted");
                    TargetUpdate::Retargeted
                } else {
                    TargetUpdate::Unchanged
                }
            }
            None => {
                tracing::trace!(%key, from = %initial_frame, to = %target, "spring created");
                self.states.insert(key, SpringState::new(initial_frame, target));
                TargetUpdate::Created
            }
        }
    }

    /// Advances every animating window by one tick.
    ///
    /// Returns one command per window that moved. A window that settles on this
    /// tick also gets a command, snapped to its exact target, so it always lands on
    /// the planned frame; this is one more command than a loop that stops emitting
    /// as soon as the spring comes to rest. Resting windows produce nothing.
    pub fn tick(&mut self) -> Vec<PlaceCommand> {
        let params = self.params;
        let mut commands = Vec::new();

        for (key, state) in &mut self.states {
            match state.step(&params) {
                Step::Moving(frame) | Step::Settled(frame) => {
                    commands.push(PlaceCommand { key: *key, frame: frame.rounded() });
                }
                Step::Idle => {}
            }
        }

        commands
    }

    /// Removes the spring of a window. Returns whether one existed.
    pub fn forget(&mut self, key: &WindowKey) -> bool { self.states.remove(key).is_some() }

    /// Removes every spring belonging to a process. Returns the number removed.
    pub fn forget_process(&mut self, pid: Pid) -> usize {
        let before = self.states.len();
        self.states.retain(|key, _| key.pid != pid);
        before - self.states.len()
    }

    /// Removes every spring whose process is not in `live`.
    ///
    /// Returns the number of removed springs.
    pub fn retain_processes(&mut self, live: &HashSet<Pid>) -> usize {
        let before = self.states.len();
        self.states.retain(|key, _| live.contains(&key.pid));
        before - self.states.len()
    }

    /// Removes the springs of windows their process no longer lists.
    ///
    /// Only processes present in `listed` are considered; springs of any other
    /// process are kept. Returns the number of removed springs.
    pub fn retain_listed(&mut self, listed: &HashMap<Pid, HashSet<ObjectRef>>) -> usize {
        let before = self.states.len();
        self.states.retain(|key, _| {
            listed.get(&key.pid).is_none_or(|windows| windows.contains(&key.window))
        });
        before - self.states.len()
    }

    /// Phase of a window's spring.
    #[must_use]
    pub fn phase(&self, key: &WindowKey) -> Option<Phase> { self.states.get(key).map(SpringState::phase) }

    /// Whether a window's spring exists and is at rest.
    #[must_use]
    pub fn is_resting(&self, key: &WindowKey) -> bool { self.phase(key) == Some(Phase::Resting) }

    /// Current (unrounded) frame of a window's spring.
    #[must_use]
    pub fn current(&self, key: &WindowKey) -> Option<Rect> { self.states.get(key).map(SpringState::current) }

    /// Spring state of a window.
    #[must_use]
    pub fn state(&self, key: &WindowKey) -> Option<&SpringState> { self.states.get(key) }

    /// Number of tracked windows.
    #[must_use]
    pub fn len(&self) -> usize { self.states.len() }

    /// Whether no windows are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.states.is_empty() }

    /// Number of windows still animating.
    #[must_use]
    pub fn animating_count(&self) -> usize {
        self.states.values().filter(|state| state.phase() == Phase::Animating).count()
    }
}

// ============================================================================
// Tests
// ============================================================================
