//! `gd-core` — foundational types for the GLP dispatch engine.
//!
//! Every other `gd-*` crate depends on this one.  It has no `gd-*`
//! dependencies and only `thiserror` (plus optional `serde`) externally.
//!
//! # What lives here
//!
//! | Module       | Contents                                                 |
//! |--------------|----------------------------------------------------------|
//! | [`ids`]      | `VehicleId`, `OrderId`, `DepotId`, `BlockageId`, `SimulationId` |
//! | [`geo`]      | `Position`, `GridBounds`, Manhattan distance             |
//! | [`time`]     | `SimTime`, `SimClock`, `Shift`                           |
//! | [`status`]   | `VehicleStatus`                                          |
//! | [`config`]   | `SimConfig`, `OperationParams`                           |
//! | [`error`]    | `GdError`, `GdResult`                                    |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod status;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{OperationParams, SimConfig};
pub use error::{GdError, GdResult};
pub use geo::{GridBounds, Position};
pub use ids::{BlockageId, DepotId, OrderId, SimulationId, VehicleId};
pub use status::VehicleStatus;
pub use time::{Shift, SimClock, SimTime};
