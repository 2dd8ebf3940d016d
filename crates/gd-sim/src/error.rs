use gd_core::{GdError, Position, SimulationId, VehicleId, VehicleStatus};
use gd_world::WorldError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("no main depot registered")]
    NoMainDepot,

    #[error("simulation {0} not found")]
    UnknownSimulation(SimulationId),

    #[error("could not start the replanning worker: {0}")]
    Worker(#[from] std::io::Error),

    #[error(transparent)]
    World(#[from] WorldError),

    #[error(transparent)]
    Core(#[from] GdError),
}

pub type SimResult<T> = Result<T, SimError>;

/// Why a route could not become a plan.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum PlanError {
    #[error("vehicle {0} is not in the snapshot")]
    UnknownVehicle(VehicleId),

    #[error("vehicle {vehicle} is {status} and cannot take a route")]
    OutOfService { vehicle: VehicleId, status: VehicleStatus },

    #[error("route for {vehicle} references unknown order {order}")]
    UnknownOrder { vehicle: VehicleId, order: gd_core::OrderId },

    #[error("route for {vehicle} references unknown depot {depot}")]
    UnknownDepot { vehicle: VehicleId, depot: gd_core::DepotId },

    #[error("no path for {vehicle} from {from} to {to}")]
    Unreachable { vehicle: VehicleId, from: Position, to: Position },
}

/// Failure reported by an [`Optimizer`][crate::Optimizer].
#[derive(Clone, Debug, Error, PartialEq)]
pub enum OptimizerError {
    #[error("optimization cancelled")]
    Cancelled,

    #[error("optimizer failed: {0}")]
    Failed(String),
}

#[derive(Clone, Debug, Error, PartialEq)]
#[error("event source failed: {0}")]
pub struct SourceError(pub String);
