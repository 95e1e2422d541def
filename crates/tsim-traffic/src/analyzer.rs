//! The `TrafficAnalyzer` trait — the contract with the statistics collaborator.
//!
//! The kernel does not compute densities, congestion probabilities, or
//! bottleneck rankings itself; it consumes them from an analyzer supplied at
//! construction.  Once per tick, right after incident aging, the kernel
//! calls [`update_weights`](TrafficAnalyzer::update_weights) so the analyzer
//! can refresh its views and fold density-derived contributions into the
//! weight field.  The query methods are then answered from that refreshed
//! internal state for the remainder of the tick.

use serde_json::Value;

use tsim_agent::AgentRegistry;
use tsim_core::NodeId;
use tsim_graph::{RoadGraph, WeightField};

/// Statistics collaborator consumed by the kernel.
///
/// Implementations must be `Send + Sync` so a kernel can move across
/// threads; all per-tick calls happen from the single scheduler thread.
pub trait TrafficAnalyzer: Send + Sync {
    /// Refresh internal views from live agent positions and fold observed
    /// densities into the weight field.  Called once per tick.
    fn update_weights(
        &mut self,
        graph: &RoadGraph,
        registry: &AgentRegistry,
        weights: &mut WeightField,
    );

    /// Probability in `[0, 1]` that the directed edge `from → to` is
    /// congested.
    fn congestion_probability(&self, from: NodeId, to: NodeId) -> f64;

    /// Congestion level in `[0, 1]` around a node.
    fn node_congestion(&self, node: NodeId) -> f64;

    /// Directed edges whose density exceeds `threshold`, with their density,
    /// worst first.
    fn find_bottlenecks(&self, threshold: f64) -> Vec<(NodeId, NodeId, f64)>;

    /// Serializable per-edge traffic payload for state snapshots.
    fn edge_traffic_data(&self) -> Value;

    /// Serializable aggregate statistics for state snapshots.
    fn global_statistics(&self) -> Value;
}

// ── NoopAnalyzer ──────────────────────────────────────────────────────────────

/// A [`TrafficAnalyzer`] that observes nothing: no congestion anywhere and
/// empty reports.
///
/// Useful as a placeholder in tests and for runs where density feedback is
/// not wanted.
pub struct NoopAnalyzer;

impl TrafficAnalyzer for NoopAnalyzer {
    fn update_weights(
        &mut self,
        _graph: &RoadGraph,
        _registry: &AgentRegistry,
        _weights: &mut WeightField,
    ) {
    }

    fn congestion_probability(&self, _from: NodeId, _to: NodeId) -> f64 {
        0.0
    }

    fn node_congestion(&self, _node: NodeId) -> f64 {
        0.0
    }

    fn find_bottlenecks(&self, _threshold: f64) -> Vec<(NodeId, NodeId, f64)> {
        Vec::new()
    }

    fn edge_traffic_data(&self) -> Value {
        Value::Object(serde_json::Map::new())
    }

    fn global_statistics(&self) -> Value {
        Value::Object(serde_json::Map::new())
    }
}
