//! `gd-sim` — tick loop orchestrator for the GLP dispatch engine.
//!
//! # Tick loop
//!
//! ```text
//! every tick [now, next):
//!   ① next = now + tick_secs
//!   ② Events   — apply every queued event with at < next, in order
//!                 (orders, blockages, breakdowns, maintenance, NEW_DAY)
//!   ③ Poll     — every N ticks, merge new orders/blockages from the source
//!   ④ Execute  — advance each plan to `next`            ┐ plan-table
//!   ⑤ Return   — idle vehicles away from home drive back ┘ lock held
//!   ⑥ Replan   — dirty or interval elapsed → snapshot → worker thread
//!   ⑦ Commit   — now = next
//! ```
//!
//! The replanning worker calls the [`Optimizer`] on a private snapshot,
//! converts its routes to plans with the [`Router`][gd_spatial::Router] and
//! swaps the whole plan table in one critical section.
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | Converts optimizer routes on Rayon's thread pool.      |
//! | `serde`    | Serde derives on events, reports and all world types.  |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use gd_sim::{NoopObserver, SimBuilder};
//! use gd_spatial::TimeDependentRouter;
//!
//! let router = TimeDependentRouter::from_config(&config);
//! let mut sim = SimBuilder::new(config, router)
//!     .depot(plant)
//!     .vehicles(fleet)
//!     .build(my_optimizer)?;
//! sim.run_until(SimTime::from_dhm(1, 0, 0), &mut NoopObserver);
//! ```

pub mod builder;
pub mod convert;
pub mod error;
pub mod event;
pub mod observer;
pub mod orchestrator;
pub mod registry;
pub mod replan;
pub mod source;

#[cfg(test)]
mod tests;

pub use builder::SimBuilder;
pub use convert::{return_plan, route_to_plan};
pub use error::{OptimizerError, PlanError, SimError, SimResult, SourceError};
pub use event::{Event, EventKind, EventQueue};
pub use observer::{NoopObserver, SimObserver};
pub use orchestrator::{Orchestrator, RunSummary, TickReport};
pub use registry::SimRegistry;
pub use replan::{
    CancelToken, InstallReport, Optimizer, PlanBook, PlanTable, ReplanCoordinator, SharedPlans, convert_routes,
};
pub use source::{EventSource, NoSource, StaticSource};
