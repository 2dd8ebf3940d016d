//! `gd-exec` — advances vehicle plans through simulated time.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                       |
//! |-------------|----------------------------------------------------------------|
//! | [`engine`]  | `ExecutionEngine` — cursor walking, status, `StepReport`       |
//! | [`effects`] | gradual (drive) and atomic (reload/refuel/serve) side effects  |
//! | [`error`]   | `ExecError`, `ExecResult<T>`                                   |
//!
//! # Execution model
//!
//! 1. `ExecutionEngine::advance(world, plan, t)` looks at the plan's current
//!    action.  If it starts at or after `t` nothing happens.
//! 2. Otherwise the action's progress at `t` is computed.  Gradual effects
//!    are applied for the progress gained since the last call.
//! 3. When progress reaches 1 the atomic effect (if any) is applied once,
//!    the vehicle becomes `AVAILABLE` and the cursor moves on.  Steps 1–3
//!    repeat, so several short actions can finish within one tick.
//!
//! A missing vehicle aborts the step for that plan.  A missing order or
//! depot only skips that action's effect; the plan keeps moving.

pub mod effects;
pub mod engine;
pub mod error;


pub use engine::{ActionOutcome, ExecutionEngine, StepReport};
pub use error::{ExecError, ExecResult};
