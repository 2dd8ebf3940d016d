//! `WorldSnapshot` — what the optimizer sees.

use std::collections::BTreeMap;

use gd_core::{SimTime, VehicleId};
use gd_plan::VehiclePlan;

use crate::WorldState;

/// A frozen copy of the world plus the plans in force when it was taken.
///
/// Owned outright by whoever holds it; mutating it never touches the live
/// state and vice versa.
#[derive(Debug)]
pub struct WorldSnapshot {
    pub taken_at: SimTime,
    pub world: WorldState,
    pub plans: BTreeMap<VehicleId, VehiclePlan>,
}

impl WorldSnapshot {
    pub fn capture(world: &WorldState, plans: &BTreeMap<VehicleId, VehiclePlan>) -> Self {
        Self {
            taken_at: world.now(),
            world:    world.snapshot(),
            plans:    plans.iter().map(|(id, p)| (*id, p.clone())).collect(),
        }
    }
}
