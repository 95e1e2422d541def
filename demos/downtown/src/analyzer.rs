//! A density-based [`TrafficAnalyzer`] for the demo.
//!
//! Each refresh sums the capacity footprints of the agents occupying every
//! edge, normalises by a nominal edge capacity, and smooths the result into
//! a per-edge density in `[0, 1]`.  Densities feed back into the weight
//! field as a mild multiplier so crowded streets cost more to route through.

use rustc_hash::FxHashMap;
use serde_json::{Value, json};

use tsim_agent::AgentRegistry;
use tsim_core::NodeId;
use tsim_graph::{RoadGraph, WeightField};
use tsim_traffic::TrafficAnalyzer;

/// Capacity units a street absorbs before counting as saturated.
const NOMINAL_CAPACITY: f64 = 8.0;

/// Density contributions never push a multiplier past this.
const DENSITY_MULT_CAP: f64 = 3.0;

pub struct DensityAnalyzer {
    /// Smoothed density per directed edge, keyed by endpoints.
    density: FxHashMap<(NodeId, NodeId), f64>,
}

impl DensityAnalyzer {
    pub fn new() -> Self {
        Self { density: FxHashMap::default() }
    }

    fn edge_density(&self, from: NodeId, to: NodeId) -> f64 {
        self.density.get(&(from, to)).copied().unwrap_or(0.0)
    }
}

impl TrafficAnalyzer for DensityAnalyzer {
    fn update_weights(
        &mut self,
        graph: &RoadGraph,
        registry: &AgentRegistry,
        weights: &mut WeightField,
    ) {
        for edge in graph.edge_ids() {
            let (from, to) = graph.edge_endpoints(edge);
            let raw = (registry.edge_capacity_usage(from, to) / NOMINAL_CAPACITY).min(1.0);
            let smoothed = self.density.entry((from, to)).or_insert(0.0);
            *smoothed = *smoothed * 0.7 + raw * 0.3;

            // Fold into the weight field, leaving incident-dominated and
            // blocked edges alone.
            let current = weights.multiplier(edge);
            if current < DENSITY_MULT_CAP {
                let target = 1.0 + *smoothed * (DENSITY_MULT_CAP - 1.0);
                weights.set(edge, (current * 0.8 + target * 0.2).min(DENSITY_MULT_CAP));
            }
        }
    }

    fn congestion_probability(&self, from: NodeId, to: NodeId) -> f64 {
        self.edge_density(from, to)
    }

    fn node_congestion(&self, node: NodeId) -> f64 {
        let around: Vec<f64> = self
            .density
            .iter()
            .filter(|((from, to), _)| *from == node || *to == node)
            .map(|(_, &d)| d)
            .collect();
        if around.is_empty() {
            0.0
        } else {
            around.iter().sum::<f64>() / around.len() as f64
        }
    }

    fn find_bottlenecks(&self, threshold: f64) -> Vec<(NodeId, NodeId, f64)> {
        let mut hits: Vec<(NodeId, NodeId, f64)> = self
            .density
            .iter()
            .filter(|&(_, &d)| d > threshold)
            .map(|(&(from, to), &d)| (from, to, d))
            .collect();
        hits.sort_by(|a, b| b.2.total_cmp(&a.2).then(a.0.cmp(&b.0)).then(a.1.cmp(&b.1)));
        hits
    }

    fn edge_traffic_data(&self) -> Value {
        let mut edges: Vec<_> = self.density.iter().collect();
        edges.sort_by_key(|&(&(from, to), _)| (from, to));
        Value::Array(
            edges
                .into_iter()
                .map(|(&(from, to), &d)| {
                    json!({ "from": from.0, "to": to.0, "density": d })
                })
                .collect(),
        )
    }

    fn global_statistics(&self) -> Value {
        let tracked = self.density.len();
        let mean = if tracked == 0 {
            0.0
        } else {
            self.density.values().sum::<f64>() / tracked as f64
        };
        json!({ "tracked_edges": tracked, "mean_density": mean })
    }
}
