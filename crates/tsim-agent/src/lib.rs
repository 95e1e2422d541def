//! `tsim-agent` — mobile agents and their owning registry.
//!
//! # What lives here
//!
//! | Module       | Contents                                                  |
//! |--------------|-----------------------------------------------------------|
//! | [`agent`]    | `Agent` (path cursor + kinematic state), `AgentStatus`    |
//! | [`registry`] | `AgentRegistry` (ownership, active index, edge occupancy) |
//!
//! Agents are plain data driven by the kernel: the kernel decides target
//! speeds and reroutes in its planning pass, then integrates positions in a
//! second pass.  The registry indexes agents by id, tracks which are still
//! active, and rebuilds the per-edge occupancy map once per tick.

pub mod agent;
pub mod registry;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use agent::{Agent, AgentStatus};
pub use registry::{AgentRegistry, KindCounts, RegistryStats};
