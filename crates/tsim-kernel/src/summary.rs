//! Serializable views of kernel state for the external boundary.
//!
//! Everything crossing the boundary is stringly typed: node ids are external
//! names, kinds and statuses are their labels, and edge keys collapse to
//! `"u,v"`.  Internally the kernel never touches these representations.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use tsim_agent::{Agent, AgentRegistry, RegistryStats};
use tsim_graph::RoadGraph;
use tsim_traffic::{BlockedRoad, Incident};

// ── Per-tick summary ──────────────────────────────────────────────────────────

/// Result of one [`tick`](crate::Kernel::tick).
#[derive(Debug, Clone, Serialize)]
pub struct TickSummary {
    pub step: u64,
    pub active_vehicles: usize,
    /// Agents that advanced onto a new edge this tick.
    pub moved: usize,
    /// Agents that reached their goal this tick.
    pub arrived: usize,
    pub total_vehicles: usize,
    pub delta_time: f64,
    pub elapsed_time: f64,
    pub accidents: Vec<IncidentView>,
    pub blocked_roads: Vec<BlockView>,
}

// ── Incident & block views ────────────────────────────────────────────────────

/// Serialized accident record.
#[derive(Debug, Clone, Serialize)]
pub struct IncidentView {
    pub id: String,
    pub from_node: String,
    pub to_node: String,
    pub severity: String,
    pub created_at: f64,
    pub duration: f64,
}

impl IncidentView {
    pub(crate) fn new(incident: &Incident, graph: &RoadGraph) -> Self {
        let (from, to) = graph.edge_endpoints(incident.edge);
        Self {
            id: incident.name(),
            from_node: graph.node_name(from).to_string(),
            to_node: graph.node_name(to).to_string(),
            severity: incident.severity.as_str().to_string(),
            created_at: incident.created_at,
            duration: incident.duration,
        }
    }
}

/// Serialized road-block record.
#[derive(Debug, Clone, Serialize)]
pub struct BlockView {
    pub from_node: String,
    pub to_node: String,
    pub reason: String,
    pub blocked_at: f64,
}

impl BlockView {
    pub(crate) fn new(block: &BlockedRoad, graph: &RoadGraph) -> Self {
        let (from, to) = graph.edge_endpoints(block.edge);
        Self {
            from_node: graph.node_name(from).to_string(),
            to_node: graph.node_name(to).to_string(),
            reason: block.reason.clone(),
            blocked_at: block.blocked_at,
        }
    }
}

// ── Agent view ────────────────────────────────────────────────────────────────

/// Serialized agent record.
#[derive(Debug, Clone, Serialize)]
pub struct AgentView {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub start_node: String,
    pub goal_node: String,
    pub current_node: String,
    pub next_node: Option<String>,
    pub path: Vec<String>,
    pub path_index: usize,
    pub status: String,
    pub speed_multiplier: f64,
    pub capacity_usage: f64,
    pub total_distance: f64,
    pub wait_time: f64,
    pub reroute_count: u32,
    pub travel_time: Option<f64>,
    pub position_on_edge: f64,
    pub current_speed: f64,
}

impl AgentView {
    pub(crate) fn new(agent: &Agent, graph: &RoadGraph) -> Self {
        let name = |n| graph.node_name(n).to_string();
        Self {
            id: agent.name(),
            kind: agent.kind.as_str().to_string(),
            start_node: name(agent.start),
            goal_node: name(agent.goal),
            current_node: name(agent.current()),
            next_node: agent.next.map(name),
            path: agent.path.iter().map(|&n| name(n)).collect(),
            path_index: agent.path_index,
            status: agent.status.as_str().to_string(),
            speed_multiplier: agent.max_speed(),
            capacity_usage: agent.capacity_usage(),
            total_distance: agent.total_distance,
            wait_time: agent.wait_time,
            reroute_count: agent.reroute_count,
            travel_time: agent.travel_time(),
            position_on_edge: agent.position_on_edge,
            current_speed: agent.current_speed,
        }
    }
}

// ── Full snapshot ─────────────────────────────────────────────────────────────

/// Complete simulation state for the external boundary.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationState {
    pub step: u64,
    pub is_running: bool,
    pub vehicles: Vec<AgentView>,
    pub vehicle_statistics: RegistryStats,
    pub traffic_statistics: Value,
    pub edge_traffic: Value,
    /// Live multipliers keyed `"u,v"` by external node names.
    pub traffic_multipliers: BTreeMap<String, f64>,
    pub total_spawned: u64,
}

impl SimulationState {
    pub(crate) fn agent_views(registry: &AgentRegistry, graph: &RoadGraph) -> Vec<AgentView> {
        registry.agents().map(|a| AgentView::new(a, graph)).collect()
    }
}

// ── Congestion report ─────────────────────────────────────────────────────────

/// One entry of the bottleneck ranking.
#[derive(Debug, Clone, Serialize)]
pub struct BottleneckView {
    pub from: String,
    pub to: String,
    pub density: f64,
    pub probability: f64,
}

/// A congested intersection.
#[derive(Debug, Clone, Serialize)]
pub struct NodeCongestionView {
    pub node: String,
    pub congestion: f64,
}

/// Ranked congestion analysis assembled from the analyzer's views.
#[derive(Debug, Clone, Serialize)]
pub struct CongestionReport {
    pub bottlenecks: Vec<BottleneckView>,
    pub congested_intersections: Vec<NodeCongestionView>,
    pub global_stats: Value,
}
