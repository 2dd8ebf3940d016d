//! Nearest-order heuristic used by the demo in place of a real optimizer.
//!
//! Each dispatchable vehicle repeatedly takes the closest unassigned order
//! (Manhattan distance), topping up at the plant whenever its tank runs low.
//! Good enough to keep the fleet busy; nowhere near optimal.

use gd_core::{DepotId, Position};
use gd_plan::{Route, RouteSet, Stop};
use gd_sim::{CancelToken, Optimizer, OptimizerError};
use gd_world::{Order, WorldSnapshot};

/// Reload once the tank holds less than this.
const MIN_LOAD_M3: f64 = 2.0;

/// Stops per route; the next replan extends it.
const MAX_STOPS: usize = 6;

pub struct NearestOrder {
    pub plant: DepotId,
}

impl Optimizer for NearestOrder {
    fn solve(&self, snapshot: &WorldSnapshot, cancel: &CancelToken) -> Result<RouteSet, OptimizerError> {
        let world = &snapshot.world;
        let plant = world
            .depot(self.plant)
            .map(|d| d.position)
            .ok_or_else(|| OptimizerError::Failed(format!("plant {} missing from snapshot", self.plant)))?;

        let mut open: Vec<&Order> = world.orders().filter(|o| !o.is_delivered()).collect();
        // Earliest deadline first among equally close orders.
        open.sort_by_key(|o| (o.deadline, o.id));

        let mut routes = RouteSet::new();
        for vehicle in world.vehicles().filter(|v| v.status.is_operational()) {
            if cancel.is_cancelled() {
                return Err(OptimizerError::Cancelled);
            }

            let mut stops = Vec::new();
            let mut pos = vehicle.position;
            let mut glp = vehicle.glp_m3();

            while stops.len() < MAX_STOPS {
                let Some(i) = nearest(&open, pos) else { break };
                if glp < MIN_LOAD_M3 {
                    let top_up = vehicle.glp_capacity() - glp;
                    stops.push(Stop::Depot { depot: self.plant, volume_m3: top_up });
                    glp += top_up;
                    pos = plant;
                    continue;
                }
                let order = open.remove(i);
                let volume = order.remaining_m3().min(glp);
                stops.push(Stop::Order { order: order.id, deadline: order.deadline, volume_m3: volume });
                glp -= volume;
                pos = order.position;
            }

            if !stops.is_empty() {
                routes.insert(vehicle.id, Route::new(stops));
            }
        }
        Ok(routes)
    }
}

fn nearest(open: &[&Order], from: Position) -> Option<usize> {
    open.iter()
        .enumerate()
        .min_by_key(|(_, o)| from.manhattan(o.position))
        .map(|(i, _)| i)
}
