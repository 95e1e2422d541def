//! Ownership and indexing of all agents in a simulation.
//!
//! # Indexes
//!
//! - `by_id` — a `BTreeMap` so every iteration (statistics, snapshots,
//!   per-tick passes) runs in ascending id order and replays identically
//!   from the same seed.
//! - `active` — ids of agents that have not arrived.
//! - `edge_occupancy` — `(from, to) → ids`, rebuilt from scratch once per
//!   tick.  A full rebuild is O(active agents) and makes the occupancy
//!   invariants self-evident at every tick boundary.
//!
//! The id counter is scoped to one registry instance and rewinds on
//! [`reset`](AgentRegistry::reset), so a reseeded rerun reproduces the same
//! `car_1, car_2, …` sequence.

use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::FxHashMap;
use serde::Serialize;

use tsim_core::{AgentId, AgentKind, NodeId};

use crate::agent::{Agent, AgentStatus};

// ── Statistics payloads ───────────────────────────────────────────────────────

/// Agent population counts by kind, keyed with external labels.
#[derive(Debug, Clone, Default, Serialize)]
pub struct KindCounts {
    pub car: usize,
    pub bicycle: usize,
    pub pedestrian: usize,
}

/// Aggregate agent statistics for the external boundary.
#[derive(Debug, Clone, Serialize)]
pub struct RegistryStats {
    pub total_vehicles: usize,
    pub active_vehicles: usize,
    pub arrived_vehicles: usize,
    pub average_travel_time: f64,
    pub average_wait_time: f64,
    pub total_reroutes: u64,
    pub vehicles_by_type: KindCounts,
}

// ── AgentRegistry ─────────────────────────────────────────────────────────────

/// Owns all agents and their indexes.
#[derive(Default)]
pub struct AgentRegistry {
    by_id: BTreeMap<AgentId, Agent>,
    active: BTreeSet<AgentId>,
    edge_occupancy: FxHashMap<(NodeId, NodeId), Vec<AgentId>>,
    id_counter: u32,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next agent id.  Ids are sequential starting at 1.
    pub fn next_id(&mut self) -> AgentId {
        self.id_counter += 1;
        AgentId(self.id_counter)
    }

    // ── Ownership ─────────────────────────────────────────────────────────

    /// Register an agent.  Non-arrived agents join the active index.
    pub fn add(&mut self, agent: Agent) -> AgentId {
        let id = agent.id;
        if agent.status != AgentStatus::Arrived {
            self.active.insert(id);
        }
        self.by_id.insert(id, agent);
        id
    }

    /// Remove an agent entirely, scrubbing it from every occupancy list.
    /// Returns `false` if the id is unknown.
    pub fn remove(&mut self, id: AgentId) -> bool {
        if self.by_id.remove(&id).is_none() {
            return false;
        }
        self.active.remove(&id);
        for list in self.edge_occupancy.values_mut() {
            list.retain(|&v| v != id);
        }
        true
    }

    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.by_id.get(&id)
    }

    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.by_id.get_mut(&id)
    }

    /// Number of agents currently owned (active and arrived).
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// All agents in ascending id order.
    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.by_id.values()
    }

    /// Ids of non-arrived agents, ascending.
    pub fn active_ids(&self) -> Vec<AgentId> {
        self.active.iter().copied().collect()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    // ── Arrival lifecycle ─────────────────────────────────────────────────

    /// Drop an agent from the active index and pin its status to `Arrived`.
    pub fn mark_arrived(&mut self, id: AgentId) {
        if self.active.remove(&id)
            && let Some(agent) = self.by_id.get_mut(&id)
        {
            agent.status = AgentStatus::Arrived;
        }
    }

    /// Reap every arrived agent.  Returns how many were removed.
    pub fn clear_arrived(&mut self) -> usize {
        let arrived: Vec<AgentId> = self
            .by_id
            .iter()
            .filter(|(_, a)| a.status == AgentStatus::Arrived)
            .map(|(&id, _)| id)
            .collect();
        for id in &arrived {
            self.remove(*id);
        }
        arrived.len()
    }

    // ── Edge occupancy ────────────────────────────────────────────────────

    /// Rebuild the occupancy map from scratch over all active agents that
    /// have a `next` node.  Ids are appended in ascending order.
    pub fn update_occupancy(&mut self) {
        self.edge_occupancy.clear();
        for &id in &self.active {
            let Some(agent) = self.by_id.get(&id) else { continue };
            if let Some(edge) = agent.current_edge() {
                self.edge_occupancy.entry(edge).or_default().push(id);
            }
        }
    }

    /// Ids of agents on the directed edge `from → to` (empty if none).
    pub fn agents_on_edge(&self, from: NodeId, to: NodeId) -> &[AgentId] {
        self.edge_occupancy
            .get(&(from, to))
            .map_or(&[], Vec::as_slice)
    }

    pub fn edge_agent_count(&self, from: NodeId, to: NodeId) -> usize {
        self.agents_on_edge(from, to).len()
    }

    /// Sum of capacity footprints on the directed edge `from → to`.
    pub fn edge_capacity_usage(&self, from: NodeId, to: NodeId) -> f64 {
        self.agents_on_edge(from, to)
            .iter()
            .filter_map(|&id| self.by_id.get(&id))
            .map(Agent::capacity_usage)
            .sum()
    }

    /// Distance in pixels to the nearest agent ahead of `id` on its current
    /// edge, or `None` when the road ahead is clear.
    ///
    /// Reads the occupancy map as last rebuilt, so within a tick all agents
    /// observe the same pre-integration picture.
    pub fn leader_gap_px(&self, id: AgentId, edge_length_px: f64) -> Option<f64> {
        let agent = self.by_id.get(&id)?;
        let edge = agent.current_edge()?;

        let mut best: Option<f64> = None;
        for &other_id in self.edge_occupancy.get(&edge)?.iter() {
            if other_id == id {
                continue;
            }
            let Some(other) = self.by_id.get(&other_id) else { continue };
            if other.position_on_edge > agent.position_on_edge {
                let gap = (other.position_on_edge - agent.position_on_edge) * edge_length_px;
                if best.is_none_or(|b| gap < b) {
                    best = Some(gap);
                }
            }
        }
        best
    }

    // ── Statistics ────────────────────────────────────────────────────────

    /// Aggregate statistics over all owned agents.
    pub fn statistics(&self) -> RegistryStats {
        let total = self.by_id.len();
        let active = self.active.len();

        let mut arrived = 0usize;
        let mut travel_sum = 0.0;
        let mut wait_sum = 0.0;
        let mut reroutes = 0u64;
        let mut by_type = KindCounts::default();

        for agent in self.by_id.values() {
            wait_sum += agent.wait_time;
            reroutes += u64::from(agent.reroute_count);
            match agent.kind {
                AgentKind::Car        => by_type.car += 1,
                AgentKind::Bike       => by_type.bicycle += 1,
                AgentKind::Pedestrian => by_type.pedestrian += 1,
            }
            if agent.status == AgentStatus::Arrived {
                arrived += 1;
                travel_sum += agent.travel_time().unwrap_or(0.0);
            }
        }

        RegistryStats {
            total_vehicles: total,
            active_vehicles: active,
            arrived_vehicles: arrived,
            average_travel_time: if arrived > 0 { travel_sum / arrived as f64 } else { 0.0 },
            average_wait_time: if total > 0 { wait_sum / total as f64 } else { 0.0 },
            total_reroutes: reroutes,
            vehicles_by_type: by_type,
        }
    }

    // ── Reset ─────────────────────────────────────────────────────────────

    /// Clear all state and rewind the id counter to zero.
    pub fn reset(&mut self) {
        self.by_id.clear();
        self.active.clear();
        self.edge_occupancy.clear();
        self.id_counter = 0;
    }
}
