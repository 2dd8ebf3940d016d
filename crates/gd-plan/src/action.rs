//! Typed, time-boxed units of vehicle work.

use gd_core::{DepotId, OrderId, Position, SimTime, VehicleStatus};

// ── ActionKind ────────────────────────────────────────────────────────────────

/// What an action does, with the parameters its effects need.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionKind {
    /// Follow `path` (first cell = departure cell), burning `fuel_gal` in
    /// total.
    Drive { path: Vec<Position>, fuel_gal: f64 },
    /// Take `volume_m3` of GLP on at `depot`.
    Reload { depot: DepotId, volume_m3: f64 },
    /// Fill the fuel tank at `depot`.
    Refuel { depot: DepotId },
    /// Discharge `volume_m3` to `order`.
    Serve { order: OrderId, volume_m3: f64 },
    Wait,
    Maintain,
}

/// How an action's effects reach the world.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum EffectMode {
    /// Proportional to progress gained.
    Gradual,
    /// Once, when progress first reaches 1.
    Atomic,
}

impl ActionKind {
    pub fn effect_mode(&self) -> EffectMode {
        match self {
            ActionKind::Drive { .. } | ActionKind::Wait | ActionKind::Maintain => EffectMode::Gradual,
            ActionKind::Reload { .. } | ActionKind::Refuel { .. } | ActionKind::Serve { .. } => {
                EffectMode::Atomic
            }
        }
    }

    /// Status the vehicle shows while the action runs.
    pub fn running_status(&self) -> VehicleStatus {
        match self {
            ActionKind::Drive { .. }  => VehicleStatus::Driving,
            ActionKind::Reload { .. } => VehicleStatus::Loading,
            ActionKind::Refuel { .. } => VehicleStatus::Refueling,
            ActionKind::Serve { .. }  => VehicleStatus::Serving,
            ActionKind::Wait          => VehicleStatus::Available,
            ActionKind::Maintain      => VehicleStatus::Maintenance,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::Drive { .. }  => "drive",
            ActionKind::Reload { .. } => "reload",
            ActionKind::Refuel { .. } => "refuel",
            ActionKind::Serve { .. }  => "serve",
            ActionKind::Wait          => "wait",
            ActionKind::Maintain      => "maintain",
        }
    }
}

// ── Action ────────────────────────────────────────────────────────────────────

/// One step of a [`VehiclePlan`][crate::VehiclePlan].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Action {
    pub kind: ActionKind,
    pub start: SimTime,
    pub end: SimTime,
    /// Fraction completed as of the last execution step, in `[0, 1]`.
    pub progress: f64,
    /// Set once an atomic action's effect has been applied.
    pub effects_applied: bool,
}

impl Action {
    pub fn new(kind: ActionKind, start: SimTime, end: SimTime) -> Self {
        Self { kind, start, end, progress: 0.0, effects_applied: false }
    }

    pub fn drive(path: Vec<Position>, fuel_gal: f64, start: SimTime, end: SimTime) -> Self {
        Self::new(ActionKind::Drive { path, fuel_gal }, start, end)
    }

    pub fn serve(order: OrderId, volume_m3: f64, start: SimTime, end: SimTime) -> Self {
        Self::new(ActionKind::Serve { order, volume_m3 }, start, end)
    }

    pub fn reload(depot: DepotId, volume_m3: f64, start: SimTime, end: SimTime) -> Self {
        Self::new(ActionKind::Reload { depot, volume_m3 }, start, end)
    }

    pub fn refuel(depot: DepotId, start: SimTime, end: SimTime) -> Self {
        Self::new(ActionKind::Refuel { depot }, start, end)
    }

    #[inline]
    pub fn duration_secs(&self) -> i64 {
        self.end - self.start
    }

    /// Progress the action would have at `t`.
    pub fn progress_at(&self, t: SimTime) -> f64 {
        if self.end <= self.start {
            return 1.0;
        }
        let elapsed = (t - self.start) as f64;
        (elapsed / self.duration_secs() as f64).clamp(0.0, 1.0)
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.progress >= 1.0
    }

    /// Where the vehicle stands once this action is done, if it moves it.
    pub fn destination(&self) -> Option<Position> {
        match &self.kind {
            ActionKind::Drive { path, .. } => path.last().copied(),
            _ => None,
        }
    }
}

/// Cell reached after covering `fraction` of `path`, weighting each leg by
/// its Manhattan length.
///
/// Returns the last vertex whose cumulative distance does not exceed the
/// distance travelled, so the vehicle only "arrives" at a cell once it has
/// fully covered the leg to it.  `None` for an empty path.
pub fn position_along(path: &[Position], fraction: f64) -> Option<Position> {
    let first = *path.first()?;
    let total: u32 = path.windows(2).map(|w| w[0].manhattan(w[1])).sum();
    if total == 0 || fraction <= 0.0 {
        return Some(first);
    }
    if fraction >= 1.0 {
        return path.last().copied();
    }

    let travelled = fraction * total as f64;
    let mut covered = 0u32;
    let mut reached = first;
    for w in path.windows(2) {
        covered += w[0].manhattan(w[1]);
        // Small tolerance so 0.999999… of a leg counts as arriving.
        if covered as f64 <= travelled + 1e-9 {
            reached = w[1];
        } else {
            break;
        }
    }
    Some(reached)
}
