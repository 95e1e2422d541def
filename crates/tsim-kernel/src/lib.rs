//! `tsim-kernel` — the tick orchestrator for the trafficsim framework.
//!
//! # Tick pipeline
//!
//! ```text
//! tick():
//!   ① Clock     — sample once; dt = min(now − last, 0.2)
//!   ② Incidents — probabilistic accident spawn, auto-resolve expired
//!   ③ Analyzer  — external collaborator refreshes its views and folds
//!                 observed densities into the weight field
//!   ④ Hotspots  — every 30th step, smoothed congestion drift
//!   ⑤ Pass A    — per-agent planning: blocked-edge handling, look-ahead
//!                 rerouting, leader gap keeping, deadband speed control
//!   ⑥ Pass B    — per-agent integration: speed slew, position advance,
//!                 node/arrival transitions
//!   ⑦ Occupancy — registry rebuilds the edge occupancy map
//! ```
//!
//! Pass A always completes before Pass B begins, and Pass A reads the
//! occupancy map as rebuilt at the end of the previous tick, so every agent
//! plans against the same pre-integration picture.
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use tsim_core::SimClock;
//! use tsim_graph::AStarRouter;
//! use tsim_kernel::KernelBuilder;
//! use tsim_traffic::NoopAnalyzer;
//!
//! let mut kernel = KernelBuilder::new(graph, NoopAnalyzer, AStarRouter)
//!     .seed(42)
//!     .clock(SimClock::fixed(0.1))
//!     .build();
//! kernel.spawn_mix(10, None);
//! kernel.run(1_000, 2);
//! ```

pub mod builder;
pub mod kernel;
pub mod observer;
pub mod summary;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use builder::KernelBuilder;
pub use kernel::{Kernel, KindMix, StopHandle};
pub use observer::{NoopObserver, TickObserver};
pub use summary::{
    AgentView, BlockView, BottleneckView, CongestionReport, IncidentView, NodeCongestionView,
    SimulationState, TickSummary,
};
