//! Observer trait for the continuous runner.

use crate::TickSummary;

/// Callbacks invoked by [`run_with`](crate::Kernel::run_with) at tick
/// boundaries.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example — progress printer
///
/// ```rust,ignore
/// struct ProgressPrinter { interval: u64 }
///
/// impl TickObserver for ProgressPrinter {
///     fn on_tick_end(&mut self, summary: &TickSummary) {
///         if summary.step % self.interval == 0 {
///             println!("step {}: {} active", summary.step, summary.active_vehicles);
///         }
///     }
/// }
/// ```
pub trait TickObserver {
    /// Called after every tick with its summary.
    fn on_tick_end(&mut self, _summary: &TickSummary) {}

    /// Called once when the runner finishes or is stopped.
    fn on_run_end(&mut self, _final_step: u64) {}
}

/// A [`TickObserver`] that does nothing.  Use when you need the runner but
/// don't want callbacks.
pub struct NoopObserver;

impl TickObserver for NoopObserver {}
