//! Run configuration.
//!
//! Plain structs with sensible defaults.  Applications typically load them
//! from JSON/TOML (with the `serde` feature) and hand them to the
//! orchestrator builder, which calls [`SimConfig::validate`] before the tick
//! loop starts.

use crate::time::{HOUR, MINUTE};
use crate::{GdError, GdResult, GridBounds, SimTime};

/// Physical and operational constants of the fleet.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OperationParams {
    /// Average travel speed in km/h.
    pub speed_kmh: f64,
    /// Side length of one grid cell in km.
    pub cell_km: f64,
    /// Time to discharge at a customer.
    pub serve_secs: i64,
    /// Time to take GLP on at a depot.
    pub reload_secs: i64,
    /// Time to fill the fuel tank at a depot.
    pub refuel_secs: i64,
}

impl OperationParams {
    /// Seconds needed to cross one cell at `speed_kmh`, rounded to the
    /// nearest second and never below 1.
    pub fn secs_per_cell(&self) -> i64 {
        ((self.cell_km / self.speed_kmh) * HOUR as f64).round().max(1.0) as i64
    }

    pub fn cells_to_km(&self, cells: usize) -> f64 {
        cells as f64 * self.cell_km
    }
}

impl Default for OperationParams {
    fn default() -> Self {
        Self {
            speed_kmh:   50.0,
            cell_km:     1.0,
            serve_secs:  15 * MINUTE,
            reload_secs: 10 * MINUTE,
            refuel_secs: 10 * MINUTE,
        }
    }
}

/// Top-level orchestrator configuration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    /// Simulated instant of the first tick.
    pub start: SimTime,

    /// Seconds advanced per tick.  Must be positive.
    pub tick_secs: i64,

    /// Replan at least this often even when nothing new arrived.  Must be
    /// positive.
    pub replan_interval_secs: i64,

    /// Poll the event source every N ticks.  Must be positive.
    pub poll_interval_ticks: u64,

    /// Call `SimObserver::on_snapshot` every N ticks.  0 disables it.
    pub snapshot_interval_ticks: u64,

    pub grid: GridBounds,

    pub ops: OperationParams,
}

impl SimConfig {
    /// Reject values the tick loop cannot run with.
    pub fn validate(&self) -> GdResult<()> {
        if self.tick_secs <= 0 {
            return Err(GdError::Config(format!(
                "tick duration must be positive, got {}s",
                self.tick_secs
            )));
        }
        if self.replan_interval_secs <= 0 {
            return Err(GdError::Config(format!(
                "replanning interval must be positive, got {}s",
                self.replan_interval_secs
            )));
        }
        if self.poll_interval_ticks == 0 {
            return Err(GdError::Config("poll interval must be at least one tick".into()));
        }
        if !(self.ops.speed_kmh > 0.0) || !(self.ops.cell_km > 0.0) {
            return Err(GdError::Config(format!(
                "speed ({} km/h) and cell size ({} km) must be positive",
                self.ops.speed_kmh, self.ops.cell_km
            )));
        }
        if self.grid.max_x < 0 || self.grid.max_y < 0 {
            return Err(GdError::Config("grid bounds must be non-negative".into()));
        }
        Ok(())
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            start:                   SimTime::ZERO,
            tick_secs:               MINUTE,
            replan_interval_secs:    30 * MINUTE,
            poll_interval_ticks:     60,
            snapshot_interval_ticks: 0,
            grid:                    GridBounds::default(),
            ops:                     OperationParams::default(),
        }
    }
}
