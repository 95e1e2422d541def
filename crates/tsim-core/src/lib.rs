//! `tsim-core` — foundational types for the `trafficsim` kernel.
//!
//! This crate is a dependency of every other `tsim-*` crate.  It intentionally
//! has no `tsim-*` dependencies and only one external one (`rand`).
//!
//! # What lives here
//!
//! | Module     | Contents                                                |
//! |------------|---------------------------------------------------------|
//! | [`ids`]    | `AgentId`, `NodeId`, `EdgeId`, `IncidentId`             |
//! | [`geo`]    | `Point`, Euclidean pixel distance                       |
//! | [`kind`]   | `AgentKind` enum with per-kind speed/capacity constants |
//! | [`time`]   | `SimClock` (wall or fixed-step time source)             |
//! | [`rng`]    | `SimRng` — the single seedable randomness source        |

pub mod geo;
pub mod ids;
pub mod kind;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use geo::Point;
pub use ids::{AgentId, EdgeId, IncidentId, NodeId};
pub use kind::AgentKind;
pub use rng::SimRng;
pub use time::SimClock;
