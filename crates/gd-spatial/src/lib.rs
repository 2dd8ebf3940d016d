//! `gd-spatial` — road blockages and time-dependent routing.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                  |
//! |--------------|-----------------------------------------------------------|
//! | [`blockage`] | `Blockage` polyline + validity window, `BlockageView`     |
//! | [`router`]   | `Router` trait, `TimeDependentRouter` (grid A*)           |
//! | [`error`]    | `SpatialError`, `SpatialResult<T>`                        |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on public types.           |

pub mod blockage;
pub mod error;
pub mod router;


pub use blockage::{Blockage, BlockageView};
pub use error::{SpatialError, SpatialResult};
pub use router::{Router, TimeDependentRouter, path_cells};
