//! Lifecycle of accidents and manual road blocks.
//!
//! Accidents spawn probabilistically (or on request), apply a severity
//! multiplier to their edge, and resolve automatically once their duration
//! elapses — dividing the multiplier back out, so the field returns exactly
//! to its prior value.  Manual blocks are a separate, never-expiring map;
//! blocking forces the hard override multiplier, unblocking restores the
//! default.

use std::collections::BTreeMap;

use log::{debug, info};

use tsim_core::{EdgeId, IncidentId, SimRng};
use tsim_graph::{RoadGraph, Severity, WeightField};

/// Per-tick accident probability per elapsed minute of simulation.
const SPAWN_RATE_PER_MINUTE: f64 = 0.000_05;

// ── Records ───────────────────────────────────────────────────────────────────

/// An active accident obstructing one directed edge.
#[derive(Debug, Clone)]
pub struct Incident {
    pub id: IncidentId,
    pub edge: EdgeId,
    pub severity: Severity,
    /// Simulation time at which the accident occurred.
    pub created_at: f64,
    /// Seconds until auto-resolution.
    pub duration: f64,
}

impl Incident {
    /// External name, e.g. `"accident_2"`.
    pub fn name(&self) -> String {
        format!("accident_{}", self.id.0)
    }
}

/// A manually closed road.  Never expires on its own.
#[derive(Debug, Clone)]
pub struct BlockedRoad {
    pub edge: EdgeId,
    pub reason: String,
    pub blocked_at: f64,
}

// ── IncidentBook ──────────────────────────────────────────────────────────────

/// Owns all active accidents and manual blocks.
///
/// `BTreeMap` storage keeps iteration (expiry sweeps, serialization) in a
/// reproducible order.
#[derive(Default)]
pub struct IncidentBook {
    incidents: BTreeMap<IncidentId, Incident>,
    blocks: BTreeMap<EdgeId, BlockedRoad>,
    counter: u32,
}

impl IncidentBook {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Accidents ─────────────────────────────────────────────────────────

    /// Roll the per-tick accident dice; on success spawn one at a random
    /// edge.  The probability ramps with elapsed simulation time.
    pub fn maybe_spawn(
        &mut self,
        graph: &RoadGraph,
        weights: &mut WeightField,
        rng: &mut SimRng,
        now: f64,
    ) -> Option<IncidentId> {
        let elapsed_minutes = now / 60.0;
        if elapsed_minutes <= 0.0 || !rng.gen_bool(SPAWN_RATE_PER_MINUTE * elapsed_minutes) {
            return None;
        }
        self.create(graph, weights, rng, now, None)
    }

    /// Create an accident on `edge`, or on a uniformly random edge when
    /// `None`: a uniform node with at least one outgoing edge, then a
    /// uniform outgoing edge of that node.
    ///
    /// Severity is uniform over the three levels; duration is a uniform
    /// whole number of seconds in `[30, 120]`.
    pub fn create(
        &mut self,
        graph: &RoadGraph,
        weights: &mut WeightField,
        rng: &mut SimRng,
        now: f64,
        edge: Option<EdgeId>,
    ) -> Option<IncidentId> {
        let edge = match edge {
            Some(e) => e,
            None => {
                let candidates: Vec<_> = graph
                    .node_ids()
                    .filter(|&n| graph.out_degree(n) > 0)
                    .collect();
                let &node = rng.choose(&candidates)?;
                let out: Vec<EdgeId> = graph.out_edges(node).collect();
                *rng.choose(&out)?
            }
        };

        let severity = *rng.choose(&Severity::ALL)?;
        let duration = f64::from(rng.gen_range(30..=120u32));

        self.counter += 1;
        let id = IncidentId(self.counter);
        weights.apply_incident(edge, severity);
        let incident = Incident { id, edge, severity, created_at: now, duration };
        info!(
            "accident_{} ({severity}) on edge {:?}, clears in {duration}s",
            id.0, graph.edge_endpoints(edge),
        );
        self.incidents.insert(id, incident);
        Some(id)
    }

    /// Resolve an accident, dividing its severity factor back out of the
    /// weight field.  Returns `false` for an unknown id.
    pub fn resolve(&mut self, id: IncidentId, weights: &mut WeightField) -> bool {
        match self.incidents.remove(&id) {
            Some(incident) => {
                weights.clear_incident(incident.edge, incident.severity);
                debug!("accident_{} resolved", id.0);
                true
            }
            None => false,
        }
    }

    /// Auto-resolve every accident whose duration has elapsed.
    pub fn expire(&mut self, now: f64, weights: &mut WeightField) {
        let expired: Vec<IncidentId> = self
            .incidents
            .values()
            .filter(|i| now - i.created_at > i.duration)
            .map(|i| i.id)
            .collect();
        for id in expired {
            self.resolve(id, weights);
        }
    }

    pub fn incident(&self, id: IncidentId) -> Option<&Incident> {
        self.incidents.get(&id)
    }

    /// Active accidents in id order.
    pub fn incidents(&self) -> impl Iterator<Item = &Incident> {
        self.incidents.values()
    }

    pub fn incident_count(&self) -> usize {
        self.incidents.len()
    }

    // ── Manual blocks ─────────────────────────────────────────────────────

    /// Close a road, forcing the hard override multiplier.  Returns `false`
    /// if the edge is already blocked.
    pub fn block(
        &mut self,
        edge: EdgeId,
        reason: impl Into<String>,
        now: f64,
        weights: &mut WeightField,
    ) -> bool {
        if self.blocks.contains_key(&edge) {
            return false;
        }
        let reason = reason.into();
        info!("edge {edge} blocked: {reason}");
        self.blocks.insert(edge, BlockedRoad { edge, reason, blocked_at: now });
        weights.block(edge);
        true
    }

    /// Reopen a road, restoring the default multiplier.  Returns `false`
    /// if the edge was not blocked.
    pub fn unblock(&mut self, edge: EdgeId, weights: &mut WeightField) -> bool {
        match self.blocks.remove(&edge) {
            Some(_) => {
                info!("edge {edge} unblocked");
                weights.unblock(edge);
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn is_blocked(&self, edge: EdgeId) -> bool {
        self.blocks.contains_key(&edge)
    }

    /// Active blocks in edge order.
    pub fn blocks(&self) -> impl Iterator<Item = &BlockedRoad> {
        self.blocks.values()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    // ── Reset ─────────────────────────────────────────────────────────────

    /// Drop all accidents and blocks and rewind the accident counter.
    ///
    /// Does not touch the weight field; callers reset that separately.
    pub fn reset(&mut self) {
        self.incidents.clear();
        self.blocks.clear();
        self.counter = 0;
    }
}
