//! The `Kernel` struct: spawning, the tick pipeline, and the command surface.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info};

use tsim_agent::{Agent, AgentRegistry, AgentStatus};
use tsim_core::{AgentId, AgentKind, EdgeId, IncidentId, NodeId, SimClock, SimRng};
use tsim_graph::{RoadGraph, Router, WeightField};
use tsim_traffic::{IncidentBook, TrafficAnalyzer};

use crate::observer::{NoopObserver, TickObserver};
use crate::summary::{
    BlockView, BottleneckView, CongestionReport, IncidentView, NodeCongestionView,
    SimulationState, TickSummary,
};

// ── Tuning constants ──────────────────────────────────────────────────────────

/// Upper bound on one integration step, seconds.  Protects against huge
/// jumps after a stall in wall-clock mode.
const MAX_DT: f64 = 0.2;

/// Seconds over which the congestion factor ramps from 0 to 1.
const CONGESTION_RAMP_SECS: f64 = 60.0;

/// Hotspot drift runs every this-many ticks.
const HOTSPOT_PERIOD: u64 = 30;

/// Congestion factor below which hotspot drift stays dormant.
const HOTSPOT_GATE: f64 = 0.3;

/// How many upcoming path edges the planning pass inspects.
const LOOKAHEAD_EDGES: usize = 3;

/// Congestion probability above which a look-ahead edge triggers a reroute.
const REROUTE_PROBABILITY: f64 = 0.5;

/// Pixels of edge length per coordinate unit.
const EDGE_SCALE: f64 = 110.0;

/// Shortest representable edge, pixels.
const MIN_EDGE_PX: f64 = 50.0;

/// Edge length when either endpoint lacks coordinates, pixels.
const FALLBACK_EDGE_PX: f64 = 100.0;

/// Below this speed the controller leaves agents alone to accelerate.
const LOW_SPEED_CUTOFF: f64 = 10.0;

/// Continuous runner: spawn every 3rd step, reap arrived every 10th.
const SPAWN_PERIOD: u64 = 3;
const REAP_PERIOD: u64 = 10;

// ── KindMix ───────────────────────────────────────────────────────────────────

/// Spawn-mix distribution over agent kinds.  One cumulative draw selects the
/// kind of each spawned agent.
#[derive(Debug, Clone, Copy)]
pub struct KindMix {
    pub car: f64,
    pub bike: f64,
    pub pedestrian: f64,
}

impl Default for KindMix {
    /// The standard street mix: 60 % cars, 25 % bikes, 15 % pedestrians.
    fn default() -> Self {
        Self { car: 0.60, bike: 0.25, pedestrian: 0.15 }
    }
}

impl KindMix {
    fn draw(&self, rng: &mut SimRng) -> AgentKind {
        let roll: f64 = rng.gen_range(0.0..1.0);
        let mut cumulative = 0.0;
        for (kind, share) in [
            (AgentKind::Car, self.car),
            (AgentKind::Bike, self.bike),
            (AgentKind::Pedestrian, self.pedestrian),
        ] {
            cumulative += share;
            if roll <= cumulative {
                return kind;
            }
        }
        AgentKind::Car
    }
}

// ── StopHandle ────────────────────────────────────────────────────────────────

/// Cloneable handle that can interrupt [`Kernel::run`] from another thread
/// (or from inside an observer).  The runner checks the flag at the top of
/// every loop iteration; the in-flight tick always completes.
#[derive(Clone)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

// ── Kernel ────────────────────────────────────────────────────────────────────

/// The tick orchestrator.
///
/// Owns the weight field, agent registry, and incident book; external callers
/// query them through the read-only accessors and mutate only through the
/// command surface, which preserves the cross-structure invariants.
///
/// Generic over the analyzer collaborator and the routing algorithm, both
/// swappable at compile time with no runtime overhead.
pub struct Kernel<A: TrafficAnalyzer, R: Router> {
    pub(crate) graph: RoadGraph,
    pub(crate) weights: WeightField,
    pub(crate) registry: AgentRegistry,
    pub(crate) incidents: IncidentBook,
    pub(crate) analyzer: A,
    pub(crate) router: R,

    pub(crate) clock: SimClock,
    pub(crate) rng: SimRng,
    seed: u64,

    pub(crate) step: u64,
    last_tick: f64,
    pub(crate) total_spawned: u64,
    running: Arc<AtomicBool>,

    /// Pixel length of every edge, indexed by `EdgeId`.  Precomputed once.
    pub(crate) edge_length_px: Vec<f64>,
    /// Edges subject to periodic congestion drift, selected at init.
    pub(crate) hotspots: Vec<EdgeId>,
}

impl<A: TrafficAnalyzer, R: Router> Kernel<A, R> {
    pub(crate) fn new(graph: RoadGraph, analyzer: A, router: R, seed: u64, clock: SimClock) -> Self {
        let mut rng = SimRng::new(seed);
        let weights = WeightField::new(graph.edge_count());
        let edge_length_px = compute_edge_lengths(&graph);
        let hotspots = select_hotspots(&graph, &mut rng);

        Self {
            graph,
            weights,
            registry: AgentRegistry::new(),
            incidents: IncidentBook::new(),
            analyzer,
            router,
            clock,
            rng,
            seed,
            step: 0,
            last_tick: 0.0,
            total_spawned: 0,
            running: Arc::new(AtomicBool::new(false)),
            edge_length_px,
            hotspots,
        }
    }

    // ── Read-only views ───────────────────────────────────────────────────

    pub fn graph(&self) -> &RoadGraph {
        &self.graph
    }

    pub fn weights(&self) -> &WeightField {
        &self.weights
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    pub fn incidents(&self) -> &IncidentBook {
        &self.incidents
    }

    pub fn analyzer(&self) -> &A {
        &self.analyzer
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn total_spawned(&self) -> u64 {
        self.total_spawned
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Handle for interrupting [`run`](Self::run) from elsewhere.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle { flag: Arc::clone(&self.running) }
    }

    // ── Spawning ──────────────────────────────────────────────────────────

    /// Spawn one agent.  Missing arguments are drawn uniformly at random
    /// (the goal distinct from the start).  Returns `None` — and registers
    /// nothing — when the graph is empty or no route exists.
    pub fn spawn(
        &mut self,
        kind: Option<AgentKind>,
        start: Option<NodeId>,
        goal: Option<NodeId>,
    ) -> Option<AgentId> {
        if self.graph.is_empty() {
            return None;
        }

        let kind = match kind {
            Some(k) => k,
            None => *self.rng.choose(&AgentKind::ALL)?,
        };
        let nodes: Vec<NodeId> = self.graph.node_ids().collect();
        let start = match start {
            Some(s) => s,
            None => *self.rng.choose(&nodes)?,
        };
        let goal = match goal {
            Some(g) => g,
            None => {
                let others: Vec<NodeId> = nodes.into_iter().filter(|&n| n != start).collect();
                *self.rng.choose(&others)?
            }
        };
        if start == goal {
            return None;
        }

        let id = self.registry.next_id();
        let mut agent = Agent::new(id, kind, start, goal, self.clock.now_secs());

        match self.router.route(&self.graph, &self.weights, start, goal, kind) {
            Ok(route) => {
                agent.set_path(route.nodes);
                self.registry.add(agent);
                self.total_spawned += 1;
                Some(id)
            }
            Err(_) => {
                debug!(
                    "spawn discarded: no route {} -> {}",
                    self.graph.node_name(start),
                    self.graph.node_name(goal),
                );
                None
            }
        }
    }

    /// Spawn `count` agents with kinds drawn from `mix` (default street mix).
    /// Returns the ids of the successful spawns.
    pub fn spawn_mix(&mut self, count: usize, mix: Option<KindMix>) -> Vec<AgentId> {
        let mix = mix.unwrap_or_default();
        let mut spawned = Vec::with_capacity(count);
        for _ in 0..count {
            let kind = mix.draw(&mut self.rng);
            if let Some(id) = self.spawn(Some(kind), None, None) {
                spawned.push(id);
            }
        }
        spawned
    }

    // ── Tick ──────────────────────────────────────────────────────────────

    /// Advance the simulation by one tick.  This is the atomic unit: all
    /// state transitions commit here.
    pub fn tick(&mut self) -> TickSummary {
        let now = self.clock.advance();
        let dt = (now - self.last_tick).min(MAX_DT);
        self.last_tick = now;
        self.step += 1;
        let congestion_factor = (now / CONGESTION_RAMP_SECS).min(1.0);

        // ── Incident aging ────────────────────────────────────────────────
        self.incidents.maybe_spawn(&self.graph, &mut self.weights, &mut self.rng, now);
        self.incidents.expire(now, &mut self.weights);

        // ── Analyzer refresh ──────────────────────────────────────────────
        self.analyzer.update_weights(&self.graph, &self.registry, &mut self.weights);

        // ── Hotspot drift ─────────────────────────────────────────────────
        //
        // Infrequent and smoothed; skipping blocked edges keeps the block
        // override absolute until an explicit unblock.
        if self.step % HOTSPOT_PERIOD == 0 && congestion_factor > HOTSPOT_GATE {
            for &edge in &self.hotspots {
                if self.incidents.is_blocked(edge) {
                    continue;
                }
                self.weights.hotspot_drift(edge, congestion_factor, &mut self.rng);
            }
        }

        // Both passes cover the same agent set; arrivals during Pass B are
        // skipped by their status, not by mutating the list.
        let active = self.registry.active_ids();

        // ── Pass A: planning ──────────────────────────────────────────────
        for &id in &active {
            self.plan_agent(id);
        }

        // ── Pass B: integration ───────────────────────────────────────────
        let mut moved = 0usize;
        let mut arrived = 0usize;
        for &id in &active {
            if self.integrate_agent(id, dt, now, &mut moved) {
                arrived += 1;
            }
        }

        // ── Occupancy rebuild ─────────────────────────────────────────────
        self.registry.update_occupancy();

        TickSummary {
            step: self.step,
            active_vehicles: active.len() - arrived,
            moved,
            arrived,
            total_vehicles: self.registry.len(),
            delta_time: dt,
            elapsed_time: now,
            accidents: self
                .incidents
                .incidents()
                .map(|i| IncidentView::new(i, &self.graph))
                .collect(),
            blocked_roads: self
                .incidents
                .blocks()
                .map(|b| BlockView::new(b, &self.graph))
                .collect(),
        }
    }

    // ── Pass A internals ──────────────────────────────────────────────────

    /// Decide one agent's target speed, and reroute it if the road ahead
    /// has degraded.
    fn plan_agent(&mut self, id: AgentId) {
        let Some((current, next, kind)) = self.registry.get(id).and_then(|a| {
            if a.status == AgentStatus::Arrived {
                return None;
            }
            a.next.map(|n| (a.current(), n, a.kind))
        }) else {
            return;
        };

        // A blocked current edge demands an immediate answer: a fresh route
        // if one exists, a full stop otherwise.
        let on_blocked = self
            .graph
            .edge_between(current, next)
            .is_some_and(|e| self.incidents.is_blocked(e));
        if on_blocked {
            if !self.try_reroute(id)
                && let Some(agent) = self.registry.get_mut(id)
            {
                agent.target_speed = 0.0;
                agent.status = AgentStatus::Stuck;
            }
            return;
        }

        // Predictive rerouting off the look-ahead window.
        if self.lookahead_degraded(id) {
            self.try_reroute(id);
        }

        // Re-read the cursor: a reroute may have moved the agent onto a
        // different first edge.
        let Some((current, next)) = self.registry.get(id).and_then(Agent::current_edge) else {
            return;
        };
        let edge_length = self.edge_length(current, next);

        // Strict following: the nearest leader on the same edge dictates
        // the speed envelope.
        if let Some(gap_px) = self.registry.leader_gap_px(id, edge_length) {
            if let Some(agent) = self.registry.get_mut(id) {
                agent.slow_for_leader(gap_px);
            }
            return;
        }

        // Open road: deadband controller against the congestion-ideal speed.
        let multiplier = self
            .graph
            .edge_between(current, next)
            .map_or(1.0, |e| self.weights.multiplier(e));
        let Some(agent) = self.registry.get_mut(id) else { return };

        let ideal = kind.max_speed() * (1.0 / multiplier).clamp(0.2, 1.0);

        if agent.current_speed < LOW_SPEED_CUTOFF {
            // Never interfere with acceleration from standstill; only make
            // sure the target is worth accelerating toward.
            if agent.target_speed < 0.9 * kind.max_speed() {
                agent.target_speed = kind.max_speed();
            }
        } else {
            let delta = ideal - agent.target_speed;
            if delta.abs() > 2.0 {
                agent.target_speed = if delta > 0.0 {
                    (agent.target_speed + 0.1).min(ideal)
                } else {
                    (agent.target_speed - 0.1).max(ideal)
                };
            } else if delta.abs() > 0.5 {
                agent.target_speed = if delta > 0.0 {
                    (agent.target_speed + 0.2).min(ideal)
                } else {
                    (agent.target_speed - 0.2).max(ideal)
                };
            }
            // Inside the deadband: leave the target alone.
        }

        if multiplier > 3.0 && agent.current_speed < 1.0 {
            agent.status = AgentStatus::Stuck;
        } else if agent.status == AgentStatus::Stuck && agent.current_speed > 3.0 {
            agent.status = AgentStatus::Moving;
        }
    }

    /// `true` if any of the next [`LOOKAHEAD_EDGES`] path edges is blocked
    /// or carries a high congestion probability.
    fn lookahead_degraded(&self, id: AgentId) -> bool {
        let Some(agent) = self.registry.get(id) else { return false };
        if agent.path.len() < 2 {
            return false;
        }
        let end = (agent.path_index + LOOKAHEAD_EDGES).min(agent.path.len() - 1);
        for i in agent.path_index..end {
            let (from, to) = (agent.path[i], agent.path[i + 1]);
            if self
                .graph
                .edge_between(from, to)
                .is_some_and(|e| self.incidents.is_blocked(e))
            {
                return true;
            }
            if self.analyzer.congestion_probability(from, to) > REROUTE_PROBABILITY {
                return true;
            }
        }
        false
    }

    /// Recompute the route from the agent's current node under live weights.
    /// Adopts the result only when it differs from the remaining tail.
    /// Returns `true` iff a new route was adopted.
    fn try_reroute(&mut self, id: AgentId) -> bool {
        let Some((current, goal, kind, tail)) = self
            .registry
            .get(id)
            .map(|a| (a.current(), a.goal, a.kind, a.path[a.path_index..].to_vec()))
        else {
            return false;
        };

        match self.router.route(&self.graph, &self.weights, current, goal, kind) {
            Ok(route) if route.nodes != tail => {
                debug!(
                    "agent {id} rerouted at {}: {} hops",
                    self.graph.node_name(current),
                    route.nodes.len(),
                );
                if let Some(agent) = self.registry.get_mut(id) {
                    agent.note_reroute();
                    agent.set_path(route.nodes);
                    agent.target_speed = agent.max_speed();
                    agent.status = AgentStatus::Moving;
                }
                true
            }
            _ => false,
        }
    }

    // ── Pass B internals ──────────────────────────────────────────────────

    /// Integrate one agent.  Returns `true` iff the agent arrived this tick.
    fn integrate_agent(&mut self, id: AgentId, dt: f64, now: f64, moved: &mut usize) -> bool {
        let Some((current, next)) = self
            .registry
            .get(id)
            .filter(|a| a.status != AgentStatus::Arrived)
            .and_then(Agent::current_edge)
        else {
            return false;
        };
        let edge_length = self.edge_length(current, next);

        let Some(agent) = self.registry.get_mut(id) else { return false };
        if agent.status == AgentStatus::Stuck {
            agent.add_wait_time(dt);
        }

        if agent.update_position(dt, edge_length) {
            if agent.advance_node(now) {
                *moved += 1;
            }
            if agent.status == AgentStatus::Arrived {
                self.registry.mark_arrived(id);
                return true;
            }
        }
        false
    }

    /// Pixel length of the directed edge `from → to`, with the documented
    /// fallback for edges the graph does not know.
    fn edge_length(&self, from: NodeId, to: NodeId) -> f64 {
        self.graph
            .edge_between(from, to)
            .map_or(FALLBACK_EDGE_PX, |e| self.edge_length_px[e.index()])
    }

    // ── Continuous runner ─────────────────────────────────────────────────

    /// Run `n_steps` ticks, spawning `spawn_rate` agents every 3rd step and
    /// reaping arrived agents every 10th.  Stops early when the running flag
    /// clears (via [`stop`](Self::stop) or a [`StopHandle`]).
    pub fn run(&mut self, n_steps: u64, spawn_rate: usize) {
        self.run_with(n_steps, spawn_rate, &mut NoopObserver);
    }

    /// [`run`](Self::run) with per-tick observer callbacks.
    pub fn run_with<O: TickObserver>(&mut self, n_steps: u64, spawn_rate: usize, observer: &mut O) {
        self.running.store(true, Ordering::SeqCst);
        info!("continuous run: {n_steps} steps, spawn rate {spawn_rate}");

        for step in 0..n_steps {
            if !self.running.load(Ordering::SeqCst) {
                break;
            }
            if step % SPAWN_PERIOD == 0 {
                self.spawn_mix(spawn_rate, None);
            }
            let summary = self.tick();
            observer.on_tick_end(&summary);
            if step % REAP_PERIOD == 0 {
                self.registry.clear_arrived();
            }
        }

        self.running.store(false, Ordering::SeqCst);
        observer.on_run_end(self.step);
    }

    /// Clear the running flag.  A run in progress finishes its current tick
    /// and exits at the top of the loop.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    // ── Agent commands ────────────────────────────────────────────────────

    /// Remove one agent outright.  `false` for unknown ids.
    pub fn remove_agent(&mut self, id: AgentId) -> bool {
        self.registry.remove(id)
    }

    /// Reap every arrived agent.  Returns how many were removed.
    pub fn reap_arrived(&mut self) -> usize {
        self.registry.clear_arrived()
    }

    // ── Incident & block commands ─────────────────────────────────────────

    /// Create an accident, on the given edge or on a random one.  Returns
    /// `None` for an unknown edge or an edgeless graph.
    pub fn create_incident(&mut self, edge: Option<(NodeId, NodeId)>) -> Option<IncidentId> {
        let edge = match edge {
            Some((from, to)) => Some(self.graph.edge_between(from, to)?),
            None => None,
        };
        let now = self.clock.now_secs();
        self.incidents.create(&self.graph, &mut self.weights, &mut self.rng, now, edge)
    }

    /// Resolve an accident by id.  `false` for unknown ids.
    pub fn resolve_incident(&mut self, id: IncidentId) -> bool {
        self.incidents.resolve(id, &mut self.weights)
    }

    /// Close the road `from → to`.  `false` for unknown edges and edges
    /// already blocked.
    pub fn block(&mut self, from: NodeId, to: NodeId, reason: &str) -> bool {
        match self.graph.edge_between(from, to) {
            Some(edge) => {
                self.incidents.block(edge, reason, self.clock.now_secs(), &mut self.weights)
            }
            None => false,
        }
    }

    /// Reopen the road `from → to`.  `false` for unknown or unblocked edges.
    pub fn unblock(&mut self, from: NodeId, to: NodeId) -> bool {
        match self.graph.edge_between(from, to) {
            Some(edge) => self.incidents.unblock(edge, &mut self.weights),
            None => false,
        }
    }

    // ── Snapshots ─────────────────────────────────────────────────────────

    /// Full serializable snapshot of the simulation.
    pub fn state(&self) -> SimulationState {
        let traffic_multipliers = self
            .weights
            .iter()
            .map(|(edge, mult)| {
                let (from, to) = self.graph.edge_endpoints(edge);
                let key = format!(
                    "{},{}",
                    self.graph.node_name(from),
                    self.graph.node_name(to),
                );
                (key, mult)
            })
            .collect();

        SimulationState {
            step: self.step,
            is_running: self.is_running(),
            vehicles: SimulationState::agent_views(&self.registry, &self.graph),
            vehicle_statistics: self.registry.statistics(),
            traffic_statistics: self.analyzer.global_statistics(),
            edge_traffic: self.analyzer.edge_traffic_data(),
            traffic_multipliers,
            total_spawned: self.total_spawned,
        }
    }

    /// Ranked congestion view assembled from the analyzer.
    pub fn congestion_report(&self) -> CongestionReport {
        let bottlenecks = self
            .analyzer
            .find_bottlenecks(0.5)
            .into_iter()
            .map(|(from, to, density)| BottleneckView {
                from: self.graph.node_name(from).to_string(),
                to: self.graph.node_name(to).to_string(),
                density,
                probability: self.analyzer.congestion_probability(from, to),
            })
            .collect();

        let mut congested: Vec<NodeCongestionView> = self
            .graph
            .node_ids()
            .filter_map(|node| {
                let congestion = self.analyzer.node_congestion(node);
                (congestion > 0.5).then(|| NodeCongestionView {
                    node: self.graph.node_name(node).to_string(),
                    congestion,
                })
            })
            .collect();
        congested.sort_by(|a, b| b.congestion.total_cmp(&a.congestion));
        congested.truncate(10);

        CongestionReport {
            bottlenecks,
            congested_intersections: congested,
            global_stats: self.analyzer.global_statistics(),
        }
    }

    // ── Reset ─────────────────────────────────────────────────────────────

    /// Return to the initial state: empty registry and incident book,
    /// neutral weights, rewound clock and step counter, and the RNG reseeded
    /// so a rerun replays the identical event sequence (hotspots included).
    pub fn reset(&mut self) {
        self.registry.reset();
        self.incidents.reset();
        self.weights.reset();
        self.rng = SimRng::new(self.seed);
        self.hotspots = select_hotspots(&self.graph, &mut self.rng);
        self.step = 0;
        self.total_spawned = 0;
        self.last_tick = 0.0;
        self.clock.restart();
        self.running.store(false, Ordering::SeqCst);
        info!("simulation reset");
    }
}

// ── Init helpers ──────────────────────────────────────────────────────────────

/// Pixel length of every edge: coordinate distance scaled to pixels with a
/// floor, or the fallback when either endpoint lacks coordinates.
fn compute_edge_lengths(graph: &RoadGraph) -> Vec<f64> {
    graph
        .edge_ids()
        .map(|edge| {
            let (from, to) = graph.edge_endpoints(edge);
            match (graph.node_pos(from), graph.node_pos(to)) {
                (Some(a), Some(b)) => (f64::from(a.distance(b)) * EDGE_SCALE).max(MIN_EDGE_PX),
                _ => FALLBACK_EDGE_PX,
            }
        })
        .collect()
}

/// Topology-derived hotspot selection: of the nodes whose out-degree ranks
/// in the top 20 % (at least one), each outgoing edge joins the hotspot set
/// with independent probability 0.3.
fn select_hotspots(graph: &RoadGraph, rng: &mut SimRng) -> Vec<EdgeId> {
    if graph.is_empty() {
        return Vec::new();
    }

    let mut by_degree: Vec<NodeId> = graph.node_ids().collect();
    // Stable sort: equal degrees keep interning order, so selection is
    // reproducible for a given seed.
    by_degree.sort_by_key(|&n| std::cmp::Reverse(graph.out_degree(n)));
    let count = (graph.node_count() / 5).max(1);

    let mut hotspots = Vec::new();
    for &node in &by_degree[..count] {
        for edge in graph.out_edges(node) {
            if rng.gen_bool(0.3) {
                hotspots.push(edge);
            }
        }
    }
    hotspots
}
