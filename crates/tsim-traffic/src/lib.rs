//! `tsim-traffic` — incident lifecycle and the traffic analyzer contract.
//!
//! # What lives here
//!
//! | Module       | Contents                                                   |
//! |--------------|------------------------------------------------------------|
//! | [`incident`] | `IncidentBook`: accidents (spawn, expiry) and road blocks  |
//! | [`analyzer`] | `TrafficAnalyzer` trait, `NoopAnalyzer` placeholder        |
//!
//! The incident book is the only writer of accident and block effects into
//! the [`WeightField`](tsim_graph::WeightField); the analyzer is an external
//! collaborator consumed through its trait.

pub mod analyzer;
pub mod incident;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use analyzer::{NoopAnalyzer, TrafficAnalyzer};
pub use incident::{BlockedRoad, Incident, IncidentBook};
