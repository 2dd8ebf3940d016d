//! `gd-world` — the live world the tick loop mutates.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                     |
//! |--------------|--------------------------------------------------------------|
//! | [`vehicle`]  | `Vehicle`, `VehicleType` profiles, laden-weight fuel model   |
//! | [`depot`]    | `Depot`, `DepotKind`                                         |
//! | [`order`]    | `Order`, `DeliveryRecord`                                    |
//! | [`incident`] | `IncidentKind`, `incident_times`, `Incident`, `MaintenanceWindow` |
//! | [`world`]    | `WorldState` — entity tables, queries, mutations, `snapshot` |
//! | [`snapshot`] | `WorldSnapshot` — world copy + plan copies for the optimizer |
//! | [`error`]    | `WorldError`, `WorldResult<T>`                               |
//!
//! # Ownership
//!
//! `WorldState` holds only owned values (`BTreeMap`s and `Vec`s of plain
//! structs).  A snapshot is therefore a full value copy: nothing inside it
//! aliases the live state, and the replanning worker can read it on another
//! thread while the tick loop keeps mutating the original.

pub mod depot;
pub mod error;
pub mod incident;
pub mod order;
pub mod snapshot;
pub mod vehicle;
pub mod world;


pub use depot::{Depot, DepotKind};
pub use error::{WorldError, WorldResult};
pub use incident::{Incident, IncidentKind, IncidentTimes, MaintenanceWindow, incident_times};
pub use order::{DeliveryRecord, Order};
pub use snapshot::WorldSnapshot;
pub use vehicle::{Vehicle, VehicleProfile, VehicleType, fuel_for_trip};
pub use world::WorldState;
