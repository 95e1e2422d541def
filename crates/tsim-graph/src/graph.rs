//! Road network representation and builder.
//!
//! # Data layout
//!
//! The graph uses **Compressed Sparse Row (CSR)** format for outgoing edges.
//! Given a `NodeId n`, its outgoing edges occupy the slice:
//!
//! ```text
//! edge_from[ node_out_start[n] .. node_out_start[n+1] ]
//! ```
//!
//! All edge arrays (`edge_from`, `edge_to`, `edge_cost`) are sorted by source
//! node and indexed by `EdgeId`.  Iteration over a node's outgoing edges is
//! therefore a contiguous memory scan — ideal for the router's inner loop.
//!
//! # Node naming
//!
//! External callers address nodes by opaque string names; the builder interns
//! each name to a dense `NodeId`.  A `lex_rank` table records each node's
//! position in the sorted name order so the router can break ties
//! lexicographically without string comparisons on the hot path.

use rustc_hash::FxHashMap;

use tsim_core::{AgentKind, EdgeId, NodeId, Point};

use crate::GraphError;

// ── RoadGraph ─────────────────────────────────────────────────────────────────

/// Directed road graph in CSR format with interned node names and optional
/// per-node coordinates.
///
/// Read-only once built; construct via [`RoadGraphBuilder`].
pub struct RoadGraph {
    // ── Node data ─────────────────────────────────────────────────────────
    /// External name of each node.  Indexed by `NodeId`.
    node_names: Vec<String>,

    /// Reverse lookup: name → `NodeId`.
    name_index: FxHashMap<String, NodeId>,

    /// Layout coordinate of each node, if provided.  Indexed by `NodeId`.
    node_pos: Vec<Option<Point>>,

    /// Rank of each node's name in sorted order.  Indexed by `NodeId`.
    lex_rank: Vec<u32>,

    // ── CSR edge adjacency ────────────────────────────────────────────────
    /// CSR row pointer.  Outgoing edges of node `n` are at EdgeIds
    /// `node_out_start[n] .. node_out_start[n+1]`.
    /// Length = `node_count + 1`.
    node_out_start: Vec<u32>,

    // ── Edge data (indexed by EdgeId = position in sorted order) ──────────
    /// Source node of each edge.
    edge_from: Vec<NodeId>,

    /// Destination node of each edge.
    edge_to: Vec<NodeId>,

    /// Base traversal cost per agent kind, in the column order of
    /// [`AgentKind::index`].
    edge_cost: Vec<[f64; 3]>,
}

impl RoadGraph {
    // ── Graph dimensions ──────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.node_names.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_names.is_empty()
    }

    // ── Node lookups ──────────────────────────────────────────────────────

    /// Resolve an external node name to its interned id.
    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.name_index.get(name).copied()
    }

    /// Like [`node_id`](Self::node_id), but an unknown name is an error.
    pub fn require_node(&self, name: &str) -> Result<NodeId, GraphError> {
        self.node_id(name)
            .ok_or_else(|| GraphError::UnknownNode(name.to_string()))
    }

    /// The external name of `node`.
    #[inline]
    pub fn node_name(&self, node: NodeId) -> &str {
        &self.node_names[node.index()]
    }

    /// Layout coordinate of `node`, if one was provided.
    #[inline]
    pub fn node_pos(&self, node: NodeId) -> Option<Point> {
        self.node_pos[node.index()]
    }

    /// Position of `node`'s name in the sorted name order.
    #[inline]
    pub fn lex_rank(&self, node: NodeId) -> u32 {
        self.lex_rank[node.index()]
    }

    /// Iterator over all `NodeId`s in interning order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.node_names.len() as u32).map(NodeId)
    }

    // ── Graph traversal ───────────────────────────────────────────────────

    /// Iterator over the `EdgeId`s of all outgoing edges from `node`.
    ///
    /// This is a contiguous index range — no heap allocation.
    #[inline]
    pub fn out_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        (start..end).map(|i| EdgeId(i as u32))
    }

    /// Out-degree of `node` (number of outgoing edges).
    #[inline]
    pub fn out_degree(&self, node: NodeId) -> usize {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        end - start
    }

    /// Iterator over all `EdgeId`s.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        (0..self.edge_to.len() as u32).map(EdgeId)
    }

    #[inline]
    pub fn edge_from(&self, edge: EdgeId) -> NodeId {
        self.edge_from[edge.index()]
    }

    #[inline]
    pub fn edge_to(&self, edge: EdgeId) -> NodeId {
        self.edge_to[edge.index()]
    }

    /// The directed edge endpoints as a `(from, to)` pair.
    #[inline]
    pub fn edge_endpoints(&self, edge: EdgeId) -> (NodeId, NodeId) {
        (self.edge_from[edge.index()], self.edge_to[edge.index()])
    }

    /// Find the directed edge `from → to`, if it exists.
    ///
    /// Linear in the out-degree of `from` — fine for road networks where
    /// degrees are small.
    pub fn edge_between(&self, from: NodeId, to: NodeId) -> Option<EdgeId> {
        self.out_edges(from).find(|&e| self.edge_to[e.index()] == to)
    }

    /// Like [`edge_between`](Self::edge_between), but a missing edge is an
    /// error.
    pub fn require_edge(&self, from: NodeId, to: NodeId) -> Result<EdgeId, GraphError> {
        self.edge_between(from, to)
            .ok_or(GraphError::UnknownEdge { from, to })
    }

    /// Base traversal cost of `edge` for the given agent kind.
    #[inline]
    pub fn base_cost(&self, edge: EdgeId, kind: AgentKind) -> f64 {
        self.edge_cost[edge.index()][kind.index()]
    }
}

// ── RoadGraphBuilder ──────────────────────────────────────────────────────────

/// Construct a [`RoadGraph`] incrementally, then call [`build`](Self::build).
///
/// The builder accepts nodes and directed edges in any order.  `build()`
/// sorts edges by source node (stably, preserving per-node insertion order)
/// and constructs the CSR arrays and the lexicographic rank table.
///
/// # Example
///
/// ```
/// use tsim_core::Point;
/// use tsim_graph::RoadGraphBuilder;
///
/// let mut b = RoadGraphBuilder::new();
/// let a = b.add_node("A", Some(Point::new(0.0, 0.0)));
/// let c = b.add_node("B", Some(Point::new(1.0, 0.0)));
/// b.add_edge(a, c, 1.0);
/// let graph = b.build();
/// assert_eq!(graph.node_count(), 2);
/// assert_eq!(graph.edge_count(), 1);
/// ```
pub struct RoadGraphBuilder {
    names:     Vec<String>,
    positions: Vec<Option<Point>>,
    raw_edges: Vec<RawEdge>,
}

struct RawEdge {
    from: NodeId,
    to:   NodeId,
    cost: [f64; 3],
}

impl RoadGraphBuilder {
    pub fn new() -> Self {
        Self {
            names:     Vec::new(),
            positions: Vec::new(),
            raw_edges: Vec::new(),
        }
    }

    /// Add a node with an external name and optional layout coordinate.
    /// Returns its `NodeId` (sequential from 0).  Names must be unique.
    pub fn add_node(&mut self, name: impl Into<String>, pos: Option<Point>) -> NodeId {
        let name = name.into();
        debug_assert!(
            !self.names.contains(&name),
            "duplicate node name {name:?}"
        );
        let id = NodeId(self.names.len() as u32);
        self.names.push(name);
        self.positions.push(pos);
        id
    }

    /// Add a **directed** edge with the same base cost for all agent kinds.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, cost: f64) {
        self.add_edge_per_kind(from, to, [cost; 3]);
    }

    /// Add a **directed** edge with an explicit per-kind base-cost triple
    /// (column order of [`AgentKind::index`]).
    pub fn add_edge_per_kind(&mut self, from: NodeId, to: NodeId, cost: [f64; 3]) {
        self.raw_edges.push(RawEdge { from, to, cost });
    }

    /// Convenience: add edges in **both directions** between `a` and `b`.
    pub fn add_road(&mut self, a: NodeId, b: NodeId, cost: f64) {
        self.add_edge(a, b, cost);
        self.add_edge(b, a, cost);
    }

    pub fn node_count(&self) -> usize { self.names.len() }
    pub fn edge_count(&self) -> usize { self.raw_edges.len() }

    /// Consume the builder and produce a [`RoadGraph`].
    ///
    /// Time complexity: O(E log E) for the edge sort + O(N log N) for the
    /// name-rank sort, where N = nodes, E = edges.
    pub fn build(self) -> RoadGraph {
        let node_count = self.names.len();
        let edge_count = self.raw_edges.len();

        // Stable sort keeps each node's outgoing edges in insertion order,
        // which fixes the iteration order seen by uniform edge draws.
        let mut raw = self.raw_edges;
        raw.sort_by_key(|e| e.from.0);

        let edge_from: Vec<NodeId>   = raw.iter().map(|e| e.from).collect();
        let edge_to:   Vec<NodeId>   = raw.iter().map(|e| e.to).collect();
        let edge_cost: Vec<[f64; 3]> = raw.iter().map(|e| e.cost).collect();

        // Build CSR row pointer (node_out_start).
        let mut node_out_start = vec![0u32; node_count + 1];
        for e in &raw {
            node_out_start[e.from.index() + 1] += 1;
        }
        for i in 1..=node_count {
            node_out_start[i] += node_out_start[i - 1];
        }
        debug_assert_eq!(node_out_start[node_count] as usize, edge_count);

        // Lexicographic rank of each node's name, for router tie-breaking.
        let mut by_name: Vec<usize> = (0..node_count).collect();
        by_name.sort_by(|&a, &b| self.names[a].cmp(&self.names[b]));
        let mut lex_rank = vec![0u32; node_count];
        for (rank, &node) in by_name.iter().enumerate() {
            lex_rank[node] = rank as u32;
        }

        let name_index: FxHashMap<String, NodeId> = self
            .names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), NodeId(i as u32)))
            .collect();

        RoadGraph {
            node_names: self.names,
            name_index,
            node_pos: self.positions,
            lex_rank,
            node_out_start,
            edge_from,
            edge_to,
            edge_cost,
        }
    }
}

impl Default for RoadGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
