//! Optimizer routes → timed vehicle plans.
//!
//! Conversion walks a route from the vehicle's snapshot position, time and
//! load.  For each stop it routes a path, appends a drive (unless the
//! vehicle is already there) and then the stop's own work:
//!
//! ```text
//! order stop → SERVE
//! depot stop → RELOAD [→ REFUEL if the depot has a pump]
//! ```
//!
//! Any unreachable leg fails the whole route; no partial plan is produced.

use gd_core::{DepotId, OperationParams, Position, SimTime, VehicleId};
use gd_plan::{Action, Route, Stop, VehiclePlan};
use gd_spatial::{Router, path_cells};
use gd_world::{Depot, WorldState, fuel_for_trip};

use crate::PlanError;

/// Build the plan for `vehicle` following `route`, starting at `start`.
///
/// The plan starts from where the vehicle stood in `world`.  If the live
/// vehicle has moved on by the time the plan is installed, its first drive
/// puts it back on this path.
pub fn route_to_plan<R: Router>(
    world:   &WorldState,
    vehicle: VehicleId,
    route:   &Route,
    router:  &R,
    ops:     &OperationParams,
    start:   SimTime,
) -> Result<VehiclePlan, PlanError> {
    let v = world.vehicle(vehicle).ok_or(PlanError::UnknownVehicle(vehicle))?;
    if !v.status.is_operational() {
        return Err(PlanError::OutOfService { vehicle, status: v.status });
    }
    let profile = v.profile();
    let capacity = v.glp_capacity();

    let mut plan = VehiclePlan::new(vehicle, start);
    let mut pos = v.position;
    let mut t = start;
    let mut glp = v.glp_m3();

    for stop in &route.stops {
        let target = stop_position(world, vehicle, stop)?;

        if target != pos {
            let path = router.find_path(world.blockages(), pos, target, t);
            if path.is_empty() {
                return Err(PlanError::Unreachable { vehicle, from: pos, to: target });
            }
            let km = ops.cells_to_km(path_cells(&path));
            let fuel = fuel_for_trip(profile, km, glp);
            let end = t + router.travel_secs(&path);
            plan.push(Action::drive(path, fuel, t, end));
            t = end;
            pos = target;
        }

        match stop {
            Stop::Order { order, volume_m3, .. } => {
                let end = t + ops.serve_secs;
                plan.push(Action::serve(*order, *volume_m3, t, end));
                glp = (glp - volume_m3).max(0.0);
                t = end;
            }
            Stop::Depot { depot, volume_m3 } => {
                let end = t + ops.reload_secs;
                plan.push(Action::reload(*depot, *volume_m3, t, end));
                glp = (glp + volume_m3).min(capacity);
                t = end;

                if depot_of(world, vehicle, *depot)?.can_refuel {
                    let end = t + ops.refuel_secs;
                    plan.push(Action::refuel(*depot, t, end));
                    t = end;
                }
            }
        }
    }

    Ok(plan)
}

/// A plain drive to `home`, or `None` when no path exists right now.
pub fn return_plan<R: Router>(
    world:   &WorldState,
    vehicle: VehicleId,
    home:    Position,
    router:  &R,
    ops:     &OperationParams,
    start:   SimTime,
) -> Option<VehiclePlan> {
    let v = world.vehicle(vehicle)?;
    let path = router.find_path(world.blockages(), v.position, home, start);
    if path.is_empty() {
        return None;
    }
    let fuel = v.fuel_for_km(ops.cells_to_km(path_cells(&path)));
    let end = start + router.travel_secs(&path);
    Some(VehiclePlan::with_actions(vehicle, start, vec![Action::drive(path, fuel, start, end)]))
}

fn stop_position(world: &WorldState, vehicle: VehicleId, stop: &Stop) -> Result<Position, PlanError> {
    match stop {
        Stop::Order { order, .. } => world
            .order(*order)
            .map(|o| o.position)
            .ok_or(PlanError::UnknownOrder { vehicle, order: *order }),
        Stop::Depot { depot, .. } => depot_of(world, vehicle, *depot).map(|d| d.position),
    }
}

fn depot_of(world: &WorldState, vehicle: VehicleId, depot: DepotId) -> Result<&Depot, PlanError> {
    world.depot(depot).ok_or(PlanError::UnknownDepot { vehicle, depot })
}
