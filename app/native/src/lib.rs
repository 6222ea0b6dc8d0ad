//! Mantle - a cross-process tiling orchestrator.
//!
//! Mantle periodically discovers windows across every connected client process,
//! computes a master-stack layout per screen and applies it, either directly or
//! through per-window spring animations.
//!
//! The window server itself is reached through the [`host::WindowHost`] trait;
//! [`host::SimulatedHost`] is an in-memory implementation used by the tests and
//! by `mantle simulate`.

pub mod cli;
pub mod config;
pub mod error;
pub mod host;
pub mod logging;
pub mod schema;
pub mod tiling;
