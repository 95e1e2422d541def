//! Routing trait and default A* implementation.
//!
//! # Pluggability
//!
//! The kernel calls routing via the [`Router`] trait, so applications can
//! swap in custom implementations (contraction hierarchies, landmark A*,
//! behavioural detour models) without touching the kernel.  The default
//! [`AStarRouter`] searches over the live [`WeightField`], so a route always
//! reflects the congestion and blocks in force at the moment of the call.
//!
//! # Determinism
//!
//! Heap entries are ordered by f-score, then g-score, then the node name's
//! lexicographic rank.  Equal-cost alternatives therefore resolve to the
//! same route on every run, which the kernel's replay guarantees rely on.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;

use tsim_core::{AgentKind, NodeId};

use crate::graph::RoadGraph;
use crate::weights::WeightField;
use crate::GraphError;

// ── Route ─────────────────────────────────────────────────────────────────────

/// The result of a routing query: the node sequence from source to target
/// (inclusive) and its total effective cost.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Nodes to visit in order.  `nodes[0]` is the source; the last entry is
    /// the target.  A trivial route (source == target) has exactly one node.
    pub nodes: Vec<NodeId>,
    /// Sum of `base_cost × multiplier` over the traversed edges.
    pub total_cost: f64,
}

impl Route {
    /// `true` if the source and destination are the same node.
    pub fn is_trivial(&self) -> bool {
        self.nodes.len() < 2
    }
}

// ── Router trait ──────────────────────────────────────────────────────────────

/// Pluggable routing engine.
///
/// Implementations must be pure with respect to their inputs: the same
/// graph, weights, endpoints, and kind must always yield the same route.
/// The kernel decides when to call this; the router never caches.
pub trait Router: Send + Sync {
    /// Compute a route from `from` to `to` for the given agent kind under
    /// the live weight field.
    fn route(
        &self,
        graph: &RoadGraph,
        weights: &WeightField,
        from: NodeId,
        to: NodeId,
        kind: AgentKind,
    ) -> Result<Route, GraphError>;
}

// ── AStarRouter ───────────────────────────────────────────────────────────────

/// Weighted A* over the CSR road graph.
///
/// Edge cost is `base_cost(edge, kind) × multiplier(edge)`.  The heuristic is
/// the Euclidean distance between node coordinates (zero when either endpoint
/// has no coordinate), which matches the scale of base costs on the maps this
/// kernel consumes.
pub struct AStarRouter;

impl Router for AStarRouter {
    fn route(
        &self,
        graph: &RoadGraph,
        weights: &WeightField,
        from: NodeId,
        to: NodeId,
        kind: AgentKind,
    ) -> Result<Route, GraphError> {
        a_star(graph, weights, from, to, kind)
    }
}

// ── A* internals ──────────────────────────────────────────────────────────────

/// Straight-line heuristic; 0 when either endpoint lacks coordinates.
#[inline]
fn heuristic(graph: &RoadGraph, node: NodeId, goal: NodeId) -> f64 {
    match (graph.node_pos(node), graph.node_pos(goal)) {
        (Some(a), Some(b)) => a.distance(b) as f64,
        _ => 0.0,
    }
}

/// Min-heap key: (f-score, g-score, lexicographic name rank, node).
/// The trailing `NodeId` only disambiguates distinct nodes with equal ranks
/// (impossible by construction, but it keeps the tuple totally ordered).
type HeapKey = Reverse<(OrderedFloat<f64>, OrderedFloat<f64>, u32, NodeId)>;

fn a_star(
    graph: &RoadGraph,
    weights: &WeightField,
    from: NodeId,
    to: NodeId,
    kind: AgentKind,
) -> Result<Route, GraphError> {
    if from == to {
        return Ok(Route { nodes: vec![from], total_cost: 0.0 });
    }

    let n = graph.node_count();
    // g[v] = best known cost to reach v.
    let mut g = vec![f64::INFINITY; n];
    // prev[v] = predecessor on the best known path; INVALID for unreached nodes.
    let mut prev = vec![NodeId::INVALID; n];

    g[from.index()] = 0.0;

    let mut heap: BinaryHeap<HeapKey> = BinaryHeap::new();
    heap.push(Reverse((
        OrderedFloat(heuristic(graph, from, to)),
        OrderedFloat(0.0),
        graph.lex_rank(from),
        from,
    )));

    while let Some(Reverse((_, g_entry, _, node))) = heap.pop() {
        let cost = g_entry.into_inner();

        if node == to {
            return Ok(reconstruct(&prev, from, to, cost));
        }

        // Skip stale heap entries.
        if cost > g[node.index()] {
            continue;
        }

        for edge in graph.out_edges(node) {
            let neighbor = graph.edge_to(edge);
            let step = graph.base_cost(edge, kind) * weights.multiplier(edge);
            let candidate = cost + step;

            if candidate < g[neighbor.index()] {
                g[neighbor.index()] = candidate;
                prev[neighbor.index()] = node;
                heap.push(Reverse((
                    OrderedFloat(candidate + heuristic(graph, neighbor, to)),
                    OrderedFloat(candidate),
                    graph.lex_rank(neighbor),
                    neighbor,
                )));
            }
        }
    }

    Err(GraphError::NoPath { from, to })
}

fn reconstruct(prev: &[NodeId], from: NodeId, to: NodeId, total_cost: f64) -> Route {
    let mut nodes = vec![to];
    let mut cur = to;
    while cur != from {
        cur = prev[cur.index()];
        nodes.push(cur);
    }
    nodes.reverse();
    Route { nodes, total_cost }
}
