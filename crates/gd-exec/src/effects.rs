//! Side effects of actions on the world.

use gd_core::{DepotId, GdError, OrderId, SimTime, VehicleId};
use gd_plan::{Action, ActionKind, position_along};
use gd_world::WorldState;

use crate::{ExecError, ExecResult};

/// Apply the share of a gradual action gained by moving from
/// `action.progress` to `progress`.
pub fn apply_gradual(
    world:    &mut WorldState,
    vehicle:  VehicleId,
    action:   &Action,
    progress: f64,
) -> ExecResult<()> {
    let v = world
        .vehicle_mut(vehicle)
        .ok_or(GdError::VehicleNotFound(vehicle))?;

    if let ActionKind::Drive { path, fuel_gal } = &action.kind {
        let delta = (progress - action.progress).max(0.0);
        if let Some(pos) = position_along(path, progress) {
            v.position = pos;
        }
        v.burn_fuel(delta * fuel_gal);
    }
    // Wait and maintain only hold position and status.
    Ok(())
}

/// Apply an atomic action's effect.  Returns the GLP volume delivered to a
/// customer (0 for everything but serve).
pub fn apply_atomic(
    world:   &mut WorldState,
    vehicle: VehicleId,
    action:  &Action,
) -> ExecResult<f64> {
    match &action.kind {
        ActionKind::Refuel { depot } => refuel(world, vehicle, *depot).map(|_| 0.0),
        ActionKind::Reload { depot, volume_m3 } => reload(world, vehicle, *depot, *volume_m3).map(|_| 0.0),
        ActionKind::Serve { order, volume_m3 } => serve(world, vehicle, *order, *volume_m3, action.end),
        ActionKind::Drive { .. } | ActionKind::Wait | ActionKind::Maintain => Ok(0.0),
    }
}

fn refuel(world: &mut WorldState, vehicle: VehicleId, depot: DepotId) -> ExecResult<()> {
    let (v, d) = world.vehicle_and_depot_mut(vehicle, depot);
    let v = v.ok_or(GdError::VehicleNotFound(vehicle))?;
    let d = d.ok_or(GdError::DepotNotFound(depot))?;
    if !d.can_refuel {
        return Err(ExecError::RefuelUnsupported(depot));
    }
    v.refuel_full();
    Ok(())
}

fn reload(world: &mut WorldState, vehicle: VehicleId, depot: DepotId, planned: f64) -> ExecResult<f64> {
    let (v, d) = world.vehicle_and_depot_mut(vehicle, depot);
    let v = v.ok_or(GdError::VehicleNotFound(vehicle))?;
    let d = d.ok_or(GdError::DepotNotFound(depot))?;
    let wanted = planned.max(0.0).min(v.free_glp_capacity()).min(d.available());
    let drawn = d.withdraw(wanted);
    Ok(v.load_glp(drawn))
}

fn serve(
    world:   &mut WorldState,
    vehicle: VehicleId,
    order:   OrderId,
    planned: f64,
    at:      SimTime,
) -> ExecResult<f64> {
    let (v, o) = world.vehicle_and_order_mut(vehicle, order);
    let v = v.ok_or(GdError::VehicleNotFound(vehicle))?;
    let o = o.ok_or(GdError::OrderNotFound(order))?;
    let amount = planned.max(0.0).min(v.glp_m3()).min(o.remaining_m3());
    let unloaded = v.unload_glp(amount);
    Ok(o.record_delivery(vehicle, at, unloaded))
}
