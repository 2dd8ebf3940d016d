//! Walks a vehicle's plan forward to a target time.

use gd_core::{OrderId, SimTime, VehicleId, VehicleStatus};
use gd_plan::{Action, ActionKind, EffectMode, VehiclePlan};
use gd_world::WorldState;
use tracing::{debug, warn};

use crate::{ExecResult, effects};

/// Result of stepping a single action.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActionOutcome {
    /// Progress after the step.
    pub progress: f64,
    /// The action reached progress 1 and its effects (if any) are settled.
    pub completed: bool,
    /// Order served and volume accepted, for a serve that completed now.
    pub delivery: Option<(OrderId, f64)>,
    /// The atomic effect could not be applied (missing order or depot, or a
    /// depot without a pump).
    pub effect_skipped: bool,
}

/// What one [`ExecutionEngine::advance`] call did to a plan.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepReport {
    pub completed: usize,
    pub deliveries: Vec<(OrderId, f64)>,
    pub skipped_effects: usize,
    /// Cursor is past the last action.
    pub finished: bool,
}

impl StepReport {
    pub fn delivered_m3(&self) -> f64 {
        self.deliveries.iter().map(|(_, v)| v).sum()
    }
}

/// Applies plans to the world.  Stateless; every call reads progress and
/// cursor from the plan itself.
#[derive(Copy, Clone, Debug, Default)]
pub struct ExecutionEngine;

impl ExecutionEngine {
    pub fn new() -> Self {
        Self
    }

    /// Advance `plan` up to simulated time `to`.
    ///
    /// Runs every action whose start is before `to`: completed ones are
    /// settled and skipped past, the first still-running one gets its
    /// progress updated and stops the walk.
    ///
    /// # Errors
    ///
    /// Fails only when the plan's vehicle is not in the world.  Missing
    /// orders and depots are logged and counted in
    /// [`StepReport::skipped_effects`].
    pub fn advance(&self, world: &mut WorldState, plan: &mut VehiclePlan, to: SimTime) -> ExecResult<StepReport> {
        let vehicle = plan.vehicle;
        let mut report = StepReport::default();

        while let Some(action) = plan.current_mut() {
            if action.start >= to {
                break;
            }
            let outcome = self.step_action(world, vehicle, action, to)?;
            if let Some(d) = outcome.delivery {
                report.deliveries.push(d);
            }
            if outcome.effect_skipped {
                report.skipped_effects += 1;
            }
            if !outcome.completed {
                break;
            }
            report.completed += 1;
            plan.advance();
        }

        report.finished = plan.is_finished();
        Ok(report)
    }

    /// Bring one action up to date at `to`.
    ///
    /// Re-invoking on an action that is already complete (and whose atomic
    /// effect, if any, has been applied) changes nothing.
    pub fn step_action(
        &self,
        world:   &mut WorldState,
        vehicle: VehicleId,
        action:  &mut Action,
        to:      SimTime,
    ) -> ExecResult<ActionOutcome> {
        if world.vehicle(vehicle).is_none() {
            return Err(gd_core::GdError::VehicleNotFound(vehicle).into());
        }

        let mode = action.kind.effect_mode();
        if action.is_complete() && (mode == EffectMode::Gradual || action.effects_applied) {
            return Ok(ActionOutcome { progress: 1.0, completed: true, ..Default::default() });
        }

        let progress = action.progress_at(to).max(action.progress);
        let mut outcome = ActionOutcome { progress, ..Default::default() };

        if mode == EffectMode::Gradual {
            effects::apply_gradual(world, vehicle, action, progress)?;
        }
        action.progress = progress;

        if progress < 1.0 {
            world.set_status(vehicle, action.kind.running_status())?;
            return Ok(outcome);
        }

        if mode == EffectMode::Atomic && !action.effects_applied {
            match effects::apply_atomic(world, vehicle, action) {
                Ok(delivered) => {
                    if let ActionKind::Serve { order, .. } = &action.kind {
                        outcome.delivery = Some((*order, delivered));
                    }
                    debug!(%vehicle, action = action.kind.label(), at = %action.end, "action effect applied");
                }
                Err(crate::ExecError::Core(gd_core::GdError::VehicleNotFound(v))) => {
                    return Err(gd_core::GdError::VehicleNotFound(v).into());
                }
                Err(e) => {
                    warn!(%vehicle, action = action.kind.label(), error = %e, "effect skipped");
                    outcome.effect_skipped = true;
                }
            }
            action.effects_applied = true;
        }

        world.set_status(vehicle, VehicleStatus::Available)?;
        outcome.completed = true;
        Ok(outcome)
    }
}
