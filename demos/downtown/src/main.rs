//! downtown — runnable demo of the trafficsim kernel.
//!
//! Simulates mixed traffic on a synthetic 4 × 5 downtown grid with a
//! density-based analyzer feeding congestion back into routing.  Half-way
//! through, a central street closes for road work and the affected agents
//! reroute around it.

mod analyzer;
mod network;

use anyhow::Result;
use log::info;

use tsim_core::SimClock;
use tsim_graph::AStarRouter;
use tsim_kernel::{KernelBuilder, TickObserver, TickSummary};

use analyzer::DensityAnalyzer;
use network::build_network;

const SEED: u64 = 42;
const TICK_SECS: f64 = 0.1;
const STEPS_PER_PHASE: u64 = 600;
const SPAWN_RATE: usize = 2;
const REPORT_EVERY: u64 = 100;

struct ProgressPrinter;

impl TickObserver for ProgressPrinter {
    fn on_tick_end(&mut self, summary: &TickSummary) {
        if summary.step % REPORT_EVERY == 0 {
            info!(
                "step {:>4}  active {:>3}  arrived {:>2}  accidents {}  blocks {}",
                summary.step,
                summary.active_vehicles,
                summary.arrived,
                summary.accidents.len(),
                summary.blocked_roads.len(),
            );
        }
    }

    fn on_run_end(&mut self, final_step: u64) {
        info!("run finished at step {final_step}");
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut kernel = KernelBuilder::new(build_network(), DensityAnalyzer::new(), AStarRouter)
        .seed(SEED)
        .clock(SimClock::fixed(TICK_SECS))
        .build();

    info!(
        "downtown grid: {} intersections, {} street segments",
        kernel.graph().node_count(),
        kernel.graph().edge_count(),
    );

    // Phase 1: free flow.
    kernel.spawn_mix(12, None);
    kernel.run_with(STEPS_PER_PHASE, SPAWN_RATE, &mut ProgressPrinter);

    // Phase 2: close a central block and keep the traffic coming.
    let b2 = kernel.graph().require_node("b2")?;
    let b3 = kernel.graph().require_node("b3")?;
    kernel.block(b2, b3, "road_work");
    info!("b2 -> b3 closed for road work");
    kernel.run_with(STEPS_PER_PHASE, SPAWN_RATE, &mut ProgressPrinter);

    kernel.unblock(b2, b3);
    info!("b2 -> b3 reopened");
    kernel.run_with(STEPS_PER_PHASE, 0, &mut ProgressPrinter);

    // Final reports.
    let stats = kernel.registry().statistics();
    info!(
        "spawned {} total; {} arrived, mean travel {:.1}s, mean wait {:.1}s, {} reroutes",
        kernel.total_spawned(),
        stats.arrived_vehicles,
        stats.average_travel_time,
        stats.average_wait_time,
        stats.total_reroutes,
    );

    let report = serde_json::to_string_pretty(&kernel.congestion_report())?;
    println!("{report}");

    Ok(())
}
