//! Discrete spring-damper integration for a single window.
//!
//! Each of the four frame components (`x`, `y`, `width`, `height`) is an
//! independent damped oscillator advanced once per tick:
//!
//! ```text
//! distance  = target - current
//! velocity += distance * stiffness
//! velocity *= damping
//! current  += velocity
//! ```
//!
//! An axis is settled on a tick when both `|distance|` (measured before the update)
//! and `|velocity|` (after it) are within the threshold. Settling snaps the axis to
//! its target and zeroes its velocity. A snapped axis stays put while the others keep
//! moving, since its distance and velocity are both zero on later ticks.
//!
//! This is an empirically tuned integrator. The default parameters converge (tests
//! cover it), but arbitrary parameter sets are not guaranteed to.

use crate::tiling::state::Rect;

// ============================================================================
// Constants
// ============================================================================

/// Default velocity gain per pixel of distance.
pub const DEFAULT_STIFFNESS: f64 = 0.12;

/// Default velocity retention per tick (0.8 = smooth stop, 0.5 = bouncy).
pub const DEFAULT_DAMPING: f64 = 0.8;

/// Default settle threshold, in pixels (and pixels per tick).
pub const DEFAULT_THRESHOLD: f64 = 0.5;

// ============================================================================
// Spring Physics
// ============================================================================

/// Spring physics parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringParams {
    pub stiffness: f64,
    pub damping: f64,
    pub threshold: f64,
}

impl Default for SpringParams {
    fn default() -> Self {
        Self {
            stiffness: DEFAULT_STIFFNESS,
            damping: DEFAULT_DAMPING,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Lifecycle phase of an animated window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// At least one axis has not settled yet.
    Animating,
    /// Every axis sits on its target; ticks do nothing.
    Resting,
}

/// Outcome of advancing a spring by one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// Still converging; carries the current frame.
    Moving(Rect),
    /// All axes settled on this tick; carries the target frame.
    Settled(Rect),
    /// Already resting, nothing changed.
    Idle,
}

/// Animation state of a single window.
#[derive(Debug, Clone, PartialEq)]
pub struct SpringState {
    current: [f64; 4],
    target: [f64; 4],
    velocity: [f64; 4],
    phase: Phase,
}

impl SpringState {
    /// Creates a state at `initial`, heading for `target`, at rest velocity.
    ///
    /// The state starts resting if the window is already on target.
    #[must_use]
    pub fn new(initial: Rect, target: Rect) -> Self {
        let phase = if initial == target { Phase::Resting } else { Phase::Animating };
        Self {
            current: initial.to_array(),
            target: target.to_array(),
            velocity: [0.0; 4],
            phase,
        }
    }

    /// Current (unrounded) frame.
    #[must_use]
    pub const fn current(&self) -> Rect { Rect::from_array(self.current) }

    /// Target frame.
    #[must_use]
    pub const fn target(&self) -> Rect { Rect::from_array(self.target) }

    /// Velocity of each axis, in `x, y, width, height` order.
    #[must_use]
    pub const fn velocity(&self) -> [f64; 4] { self.velocity }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase { self.phase }

    /// Points the spring at a new target.
    ///
    /// Returns `true` if the target changed. A changed target re-arms a resting
    /// spring; velocity is kept so an in-flight animation bends toward the new
    /// target instead of restarting. An identical target is a no-op.
    pub fn retarget(&mut self, target: Rect) -> bool {
        let target = target.to_array();
        if target == self.target {
            return false;
        }

        self.target = target;
        self.phase = Phase::Animating;
        true
    }

    /// Advances the spring by one tick.
    pub fn step(&mut self, params: &SpringParams) -> Step {
        if self.phase == Phase::Resting {
            return Step::Idle;
        }

        let mut all_settled = true;
        for axis in 0..4 {
            let settled = step_axis(
                &mut self.current[axis],
                self.target[axis],
                &mut self.velocity[axis],
                params,
            );
            all_settled &= settled;
        }

        if all_settled {
            self.phase = Phase::Resting;
            Step::Settled(self.target())
        } else {
            Step::Moving(self.current())
        }
    }
}

/// Advances one axis and returns whether it settled on this tick.
#[inline]
fn step_axis(current: &mut f64, target: f64, velocity: &mut f64, params: &SpringParams) -> bool {
    let distance = target - *current;
    *velocity += distance * params.stiffness;
    *velocity *= params.damping;
    *current += *velocity;

    if distance.abs() <= params.threshold && velocity.abs() <= params.threshold {
        *current = target;
        *velocity = 0.0;
        true
    } else {
        false
    }
}

// ============================================================================
// Tests
// ============================================================================
