//! Tiling orchestration for Mantle.
//!
//! This module periodically discovers windows across every connected process,
//! computes a master-stack layout per screen and applies it, either directly or
//! through per-window spring animations.
//!
//! # Pipeline
//!
//! ```text
//! enumerate processes
//!   → screens + visible frames        (discovery, joined)
//!   → windows + validity + metadata   (discovery, nested joins)
//!   → resizable filter
//!   → screen assignment               (screen)
//!   → master-stack plan               (layout)
//!   → apply: direct set-frame | spring targets (animation)
//! ```
//!
//! # Modules
//!
//! - `aggregate` - fan-out/fan-in joins over host queries
//! - `discovery` - screen and window discovery
//! - `screen` - window to screen assignment
//! - `layout` - master-stack planning
//! - `animation` - spring integrator and its registry
//! - `orchestrator` - a single layout cycle
//! - `service` - the long-running orchestration and animation loops

pub mod aggregate;
pub mod animation;
pub mod discovery;
pub mod layout;
pub mod orchestrator;
pub mod screen;
pub mod service;
pub mod state;

// Re-export commonly used types
pub use animation::{PlaceCommand, SharedIntegrator, SpringIntegrator, SpringParams};
pub use layout::{LayoutParams, LayoutPlan, PlanEntry};
pub use orchestrator::{CyclePlan, CycleReport, LayoutOrchestrator, SkipReason};
pub use service::{ServiceStats, TilingService};
pub use state::{
    ObjectRef, Pid, PlacementRecord, ProcessHandle, Rect, ScreenRef, WindowInfo, WindowKey,
};
