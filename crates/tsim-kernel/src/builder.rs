//! Fluent builder for constructing a [`Kernel`].

use tsim_core::SimClock;
use tsim_graph::{RoadGraph, Router};
use tsim_traffic::TrafficAnalyzer;

use crate::Kernel;

/// Fluent builder for [`Kernel<A, R>`].
///
/// # Required inputs
///
/// - [`RoadGraph`] — the network, read-only for the kernel's lifetime
/// - `A: TrafficAnalyzer` — the statistics collaborator
///   (use [`NoopAnalyzer`](tsim_traffic::NoopAnalyzer) when none is wanted)
/// - `R: Router` — the routing algorithm
///   (e.g. [`AStarRouter`](tsim_graph::AStarRouter))
///
/// # Optional inputs (have defaults)
///
/// | Method      | Default            |
/// |-------------|--------------------|
/// | `.seed(s)`  | 0                  |
/// | `.clock(c)` | `SimClock::wall()` |
///
/// # Example
///
/// ```rust,ignore
/// let mut kernel = KernelBuilder::new(graph, NoopAnalyzer, AStarRouter)
///     .seed(42)
///     .clock(SimClock::fixed(0.1))
///     .build();
/// ```
pub struct KernelBuilder<A: TrafficAnalyzer, R: Router> {
    graph: RoadGraph,
    analyzer: A,
    router: R,
    seed: u64,
    clock: SimClock,
}

impl<A: TrafficAnalyzer, R: Router> KernelBuilder<A, R> {
    /// Create a builder with all required inputs.
    pub fn new(graph: RoadGraph, analyzer: A, router: R) -> Self {
        Self {
            graph,
            analyzer,
            router,
            seed: 0,
            clock: SimClock::wall(),
        }
    }

    /// Seed for the kernel's single randomness source.  Two kernels built
    /// from the same graph and seed replay identical event sequences.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Time source.  Use [`SimClock::fixed`] for deterministic integration
    /// steps in tests and replays.
    pub fn clock(mut self, clock: SimClock) -> Self {
        self.clock = clock;
        self
    }

    /// Perform the one-shot init work — default weights, edge lengths,
    /// hotspot selection — and return a ready kernel.
    pub fn build(self) -> Kernel<A, R> {
        Kernel::new(self.graph, self.analyzer, self.router, self.seed, self.clock)
    }
}
