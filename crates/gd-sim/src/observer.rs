//! Simulation observer trait for progress reporting and data collection.

use gd_core::SimTime;
use gd_world::WorldState;

use crate::{Event, PlanTable, TickReport};

/// Callbacks invoked by the [`Orchestrator`][crate::Orchestrator] at key
/// points in the tick loop.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example: delivery counter
///
/// ```rust,ignore
/// struct Delivered(f64);
///
/// impl SimObserver for Delivered {
///     fn on_tick_end(&mut self, report: &TickReport) {
///         self.0 += report.delivered_m3();
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called at the very start of each tick, before any processing.
    fn on_tick_start(&mut self, _now: SimTime) {}

    /// Called after each event has been applied to the world.
    fn on_event(&mut self, _event: &Event) {}

    /// Called at the end of each tick, after the clock has advanced.
    fn on_tick_end(&mut self, _report: &TickReport) {}

    /// Called every `config.snapshot_interval_ticks` ticks with read-only
    /// access to the world and the live plan table, so that publishers can
    /// push state without the orchestrator knowing any transport.
    fn on_snapshot(&mut self, _now: SimTime, _world: &WorldState, _plans: &PlanTable) {}

    /// Called once when a `run_*` driver returns.
    fn on_run_end(&mut self, _now: SimTime) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
