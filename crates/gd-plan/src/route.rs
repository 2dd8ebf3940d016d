//! The optimizer's output: untimed stop sequences per vehicle.
//!
//! Routes carry no times or paths.  The replanning glue turns each route into
//! a timed [`VehiclePlan`][crate::VehiclePlan] by routing between consecutive
//! stops.

use std::collections::BTreeMap;

use gd_core::{DepotId, OrderId, SimTime, VehicleId};

/// One visit in a route.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Stop {
    /// Deliver `volume_m3` to `order`, ideally before `deadline`.
    Order { order: OrderId, deadline: SimTime, volume_m3: f64 },
    /// Load `volume_m3` at `depot` (and refuel if the depot can).
    Depot { depot: DepotId, volume_m3: f64 },
}

/// Ordered stops for one vehicle.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Route {
    pub stops: Vec<Stop>,
}

impl Route {
    pub fn new(stops: Vec<Stop>) -> Self {
        Self { stops }
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Total volume this route plans to deliver.
    pub fn delivered_volume(&self) -> f64 {
        self.stops
            .iter()
            .map(|s| match s {
                Stop::Order { volume_m3, .. } => *volume_m3,
                Stop::Depot { .. } => 0.0,
            })
            .sum()
    }
}

/// Optimizer result: one route per vehicle it chose to plan.
pub type RouteSet = BTreeMap<VehicleId, Route>;
