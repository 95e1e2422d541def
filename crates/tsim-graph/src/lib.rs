//! `tsim-graph` — road network representation, live edge weights, and routing.
//!
//! # What lives here
//!
//! | Module      | Contents                                              |
//! |-------------|-------------------------------------------------------|
//! | [`graph`]   | `RoadGraph` (CSR adjacency + name interning), builder |
//! | [`weights`] | `WeightField` multiplier table, `Severity` factors    |
//! | [`router`]  | `Router` trait and the default `AStarRouter`          |
//! | [`error`]   | `GraphError`                                          |

pub mod error;
pub mod graph;
pub mod router;
pub mod weights;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::GraphError;
pub use graph::{RoadGraph, RoadGraphBuilder};
pub use router::{AStarRouter, Route, Router};
pub use weights::{Severity, WeightField, BLOCKED_MULTIPLIER, HOTSPOT_CEILING};
