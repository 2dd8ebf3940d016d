//! `gd-plan` — vehicle plans and the optimizer's route vocabulary.
//!
//! # Crate layout
//!
//! | Module     | Contents                                                    |
//! |------------|-------------------------------------------------------------|
//! | [`action`] | `Action`, `ActionKind`, `EffectMode`, `position_along`      |
//! | [`plan`]   | `VehiclePlan` — ordered actions + cursor                    |
//! | [`route`]  | `Stop`, `Route`, `RouteSet` — optimizer output              |
//!
//! # Progress model (summary)
//!
//! Every action is time-boxed `[start, end)`.  At simulated time `t`:
//!
//! ```text
//! progress = clamp((t - start) / (end - start), 0, 1)     // 1 if end <= start
//! ```
//!
//! Gradual actions (drive, wait, maintain) apply effects in proportion to the
//! progress gained since the last update.  Atomic actions (reload, refuel,
//! serve) apply once when progress first reaches 1, guarded by
//! `effects_applied`.

pub mod action;
pub mod plan;
pub mod route;


pub use action::{Action, ActionKind, EffectMode, position_along};
pub use plan::VehiclePlan;
pub use route::{Route, RouteSet, Stop};
