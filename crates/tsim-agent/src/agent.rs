//! A single mobile agent: path cursor plus continuous kinematic state.
//!
//! # Movement model
//!
//! An agent occupies a fraction `position_on_edge ∈ [0, 1]` of the directed
//! edge between its current and next path nodes.  Each integration step
//! first slews `current_speed` toward `target_speed` by at most
//! `acceleration · dt` (never overshooting), then advances the fraction by
//! the distance covered.  Reaching 1.0 hands control back to the caller,
//! which advances the path cursor onto the next edge.
//!
//! The agent itself only knows how to follow orders: target speeds and new
//! paths are decided by the kernel's planning pass.

use tsim_core::{AgentId, AgentKind, NodeId};

/// Following distance below which an agent stops dead, in pixels.
pub(crate) const MIN_GAP_PX: f64 = 30.0;

// ── AgentStatus ───────────────────────────────────────────────────────────────

/// Lifecycle state of an agent.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum AgentStatus {
    /// Created but not yet moving (no usable path).
    Waiting,
    /// Progressing along its path.
    Moving,
    /// Halted or crawling behind a leader or inside heavy congestion.
    Stuck,
    /// Reached its goal node.
    Arrived,
    /// A fresh route is being adopted this instant.
    Rerouting,
}

impl AgentStatus {
    /// Serialized label.
    pub fn as_str(self) -> &'static str {
        match self {
            AgentStatus::Waiting   => "waiting",
            AgentStatus::Moving    => "moving",
            AgentStatus::Stuck     => "stuck",
            AgentStatus::Arrived   => "arrived",
            AgentStatus::Rerouting => "rerouting",
        }
    }
}

// ── Agent ─────────────────────────────────────────────────────────────────────

/// One mobile entity: identity, topology cursor, kinematics, and telemetry.
#[derive(Debug, Clone)]
pub struct Agent {
    // ── Identity ──────────────────────────────────────────────────────────
    pub id: AgentId,
    pub kind: AgentKind,

    // ── Topology cursor ───────────────────────────────────────────────────
    pub start: NodeId,
    pub goal: NodeId,
    /// Node sequence from the route planner.  Empty until a path is set.
    pub path: Vec<NodeId>,
    /// Cursor into `path`; `path[path_index]` is the current node.
    pub path_index: usize,
    /// The node being driven toward, or `None` at the end of the path.
    pub next: Option<NodeId>,

    // ── Kinematic state ───────────────────────────────────────────────────
    pub status: AgentStatus,
    /// Fraction of the current edge traversed, in `[0, 1]`.
    pub position_on_edge: f64,
    /// Actual speed in px/s; slews toward `target_speed`.
    pub current_speed: f64,
    /// Commanded speed in px/s.
    pub target_speed: f64,

    // ── Telemetry ─────────────────────────────────────────────────────────
    pub spawn_time: f64,
    pub arrival_time: Option<f64>,
    /// Seconds spent stuck in traffic.
    pub wait_time: f64,
    pub reroute_count: u32,
    /// Pixels covered since spawn.
    pub total_distance: f64,
}

impl Agent {
    /// Create an agent at `start` with no path yet.
    pub fn new(id: AgentId, kind: AgentKind, start: NodeId, goal: NodeId, now: f64) -> Self {
        Self {
            id,
            kind,
            start,
            goal,
            path: Vec::new(),
            path_index: 0,
            next: None,
            status: AgentStatus::Waiting,
            position_on_edge: 0.0,
            current_speed: 0.0,
            target_speed: kind.max_speed(),
            spawn_time: now,
            arrival_time: None,
            wait_time: 0.0,
            reroute_count: 0,
            total_distance: 0.0,
        }
    }

    /// External name, e.g. `"car_3"`.
    pub fn name(&self) -> String {
        format!("{}_{}", self.kind.as_str(), self.id.0)
    }

    /// The node the agent is currently at (or departing from).
    #[inline]
    pub fn current(&self) -> NodeId {
        self.path.get(self.path_index).copied().unwrap_or(self.start)
    }

    /// The directed edge currently being traversed, if any.
    #[inline]
    pub fn current_edge(&self) -> Option<(NodeId, NodeId)> {
        self.next.map(|next| (self.current(), next))
    }

    #[inline]
    pub fn max_speed(&self) -> f64 {
        self.kind.max_speed()
    }

    #[inline]
    pub fn capacity_usage(&self) -> f64 {
        self.kind.capacity_usage()
    }

    /// Travel time from spawn to arrival, if arrived.
    pub fn travel_time(&self) -> Option<f64> {
        self.arrival_time.map(|t| t - self.spawn_time)
    }

    // ── Path control ──────────────────────────────────────────────────────

    /// Replace the path and rewind the cursor to its first node.
    ///
    /// Also zeroes `position_on_edge`: a freshly adopted route starts at the
    /// beginning of its first edge even when the agent was mid-edge on the
    /// old route.
    pub fn set_path(&mut self, path: Vec<NodeId>) {
        self.path = path;
        self.path_index = 0;
        self.position_on_edge = 0.0;
        if self.path.len() >= 2 {
            self.next = Some(self.path[1]);
            self.status = AgentStatus::Moving;
        } else {
            self.next = None;
        }
    }

    /// Step the cursor onto the next path node.
    ///
    /// Callers invoke this when `position_on_edge` has been clipped to 1.0
    /// (or when deliberately skipping the rest of an edge).  Arrival at the
    /// final node records `arrival_time` and clears `next`.
    ///
    /// Returns `true` iff the cursor actually advanced.
    pub fn advance_node(&mut self, now: f64) -> bool {
        if self.path.is_empty() || self.path_index >= self.path.len() - 1 {
            self.arrive(now);
            return false;
        }

        self.path_index += 1;

        if self.path_index < self.path.len() - 1 {
            self.next = Some(self.path[self.path_index + 1]);
            self.status = AgentStatus::Moving;
            self.position_on_edge = 0.0;
        } else {
            self.arrive(now);
        }
        true
    }

    fn arrive(&mut self, now: f64) {
        self.status = AgentStatus::Arrived;
        self.next = None;
        if self.arrival_time.is_none() {
            self.arrival_time = Some(now);
        }
    }

    // ── Kinematics ────────────────────────────────────────────────────────

    /// Integrate one time step along the current edge.
    ///
    /// Two stages: slew `current_speed` toward `target_speed` without
    /// overshoot, then advance `position_on_edge` by the covered distance
    /// over `edge_length_px`.  Returns `true` iff the end of the edge was
    /// reached (the fraction is clipped to exactly 1.0).
    ///
    /// Only `Moving` and `Stuck` agents integrate; all other statuses are
    /// inert.
    pub fn update_position(&mut self, dt: f64, edge_length_px: f64) -> bool {
        if !matches!(self.status, AgentStatus::Moving | AgentStatus::Stuck) {
            return false;
        }

        let diff = self.target_speed - self.current_speed;
        let max_delta = self.kind.acceleration() * dt;
        if diff.abs() < max_delta {
            self.current_speed = self.target_speed;
        } else if diff > 0.0 {
            self.current_speed += max_delta;
        } else {
            self.current_speed -= max_delta;
        }

        let moved_px = self.current_speed * dt;
        self.position_on_edge += moved_px / edge_length_px;
        self.total_distance += moved_px;

        if self.position_on_edge >= 1.0 {
            self.position_on_edge = 1.0;
            return true;
        }
        false
    }

    /// Gap-keeping response to the nearest agent ahead on the same edge.
    ///
    /// Under 30 px: full stop.  Under 60 px: speed proportional to the gap.
    /// Otherwise resume free-flow speed, recovering from `Stuck` if that was
    /// the only reason for it.
    pub fn slow_for_leader(&mut self, gap_px: f64) {
        if gap_px < MIN_GAP_PX {
            self.target_speed = 0.0;
            self.status = AgentStatus::Stuck;
        } else if gap_px < MIN_GAP_PX * 2.0 {
            self.target_speed = self.max_speed() * (gap_px / (MIN_GAP_PX * 2.0));
            self.status = AgentStatus::Stuck;
        } else {
            self.target_speed = self.max_speed();
            if self.status == AgentStatus::Stuck {
                self.status = AgentStatus::Moving;
            }
        }
    }

    // ── Telemetry hooks ───────────────────────────────────────────────────

    /// Count one route recomputation.
    pub fn note_reroute(&mut self) {
        self.reroute_count += 1;
        self.status = AgentStatus::Rerouting;
    }

    /// Accumulate time spent stuck in traffic.
    pub fn add_wait_time(&mut self, dt: f64) {
        self.wait_time += dt;
    }
}
