//! Background re-optimization.
//!
//! # Threading model
//!
//! ```text
//!  tick loop                         worker thread
//!  ─────────                         ─────────────
//!  trigger(snapshot) ──job──▶        optimizer.solve(&snapshot)   (no locks)
//!    in_flight = true                convert routes → plans       (no locks)
//!                                    lock plan table:
//!  lock plan table (steps 4–5)         swap whole table, in_flight = false
//! ```
//!
//! The tick loop and the worker share exactly one thing: [`SharedPlans`].
//! Swapping the table inside one critical section means no reader ever sees
//! a mix of old and new plans.  At most one job is in flight; a trigger
//! while busy is dropped, not queued.
//!
//! A result is always older than the live world.  Two rules bridge the gap
//! at install time:
//!
//! - vehicles [withdrawn][PlanBook::withdraw] from service after the
//!   snapshot get no fresh plan;
//! - fresh plans are delayed from the snapshot time to the last committed
//!   tick, so execution resumes at normal speed instead of catching up.

use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use gd_core::{OperationParams, SimTime, VehicleId};
use gd_plan::{RouteSet, VehiclePlan};
use gd_spatial::Router;
use gd_world::WorldSnapshot;
use parking_lot::{Condvar, Mutex, MutexGuard};
use rustc_hash::FxHashSet;
use tracing::{error, info, warn};

use crate::{OptimizerError, PlanError, SimResult, convert};

// ── Optimizer boundary ────────────────────────────────────────────────────────

/// Cooperative cancellation flag handed to the optimizer.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// The route optimizer.  A pure function of the snapshot; expected to bound
/// its own running time and to return early once `cancel` is set.
pub trait Optimizer: Send + 'static {
    fn solve(&self, snapshot: &WorldSnapshot, cancel: &CancelToken) -> Result<RouteSet, OptimizerError>;
}

impl<F> Optimizer for F
where
    F: Fn(&WorldSnapshot, &CancelToken) -> Result<RouteSet, OptimizerError> + Send + 'static,
{
    fn solve(&self, snapshot: &WorldSnapshot, cancel: &CancelToken) -> Result<RouteSet, OptimizerError> {
        self(snapshot, cancel)
    }
}

// ── Shared plan table ─────────────────────────────────────────────────────────

pub type PlanTable = BTreeMap<VehicleId, VehiclePlan>;

/// Live plans plus the replanning bookkeeping that must change with them.
#[derive(Debug, Default)]
pub struct PlanBook {
    pub plans: PlanTable,
    in_flight: bool,
    generation: u64,
    /// End of the last tick the plans were executed to.
    clock: SimTime,
    /// Vehicles taken out of service while the current optimization ran.
    withdrawn: FxHashSet<VehicleId>,
}

impl PlanBook {
    /// Drop `vehicle`'s plan because it has left service (breakdown,
    /// maintenance).  An optimization already running will not hand it a
    /// new one.
    pub fn withdraw(&mut self, vehicle: VehicleId) -> Option<VehiclePlan> {
        if self.in_flight {
            self.withdrawn.insert(vehicle);
        }
        self.plans.remove(&vehicle)
    }

    /// Record that every plan has been executed up to `t`.
    pub fn set_clock(&mut self, t: SimTime) {
        self.clock = t;
    }

    pub fn clock(&self) -> SimTime {
        self.clock
    }

    /// An optimization is running.
    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Number of plan tables installed so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// The plan table shared between the tick loop and the replanning worker.
#[derive(Debug, Default)]
pub struct SharedPlans {
    book: Mutex<PlanBook>,
    idle: Condvar,
}

impl SharedPlans {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&self) -> MutexGuard<'_, PlanBook> {
        self.book.lock()
    }

    /// Copy of the current table.
    pub fn plans(&self) -> PlanTable {
        self.book.lock().plans.clone()
    }

    fn release(&self) {
        let mut book = self.book.lock();
        book.in_flight = false;
        book.withdrawn.clear();
        self.idle.notify_all();
    }

    fn install(&self, converted: PlanTable, failed: &[VehicleId], taken_at: SimTime) -> InstallReport {
        let mut book = self.book.lock();
        let mut next = converted;

        let before = next.len();
        next.retain(|v, _| !book.withdrawn.contains(v));
        let discarded = before - next.len();

        let lag = book.clock.since(taken_at);
        if lag > 0 {
            for plan in next.values_mut() {
                plan.delay(lag);
            }
        }

        let installed = next.len();
        let mut kept = 0;
        for v in failed {
            if let Some(old) = book.plans.remove(v) {
                next.insert(*v, old);
                kept += 1;
            }
        }
        let dropped = book.plans.keys().filter(|v| !next.contains_key(v)).count();

        book.plans = next;
        book.generation += 1;
        book.in_flight = false;
        book.withdrawn.clear();
        self.idle.notify_all();
        InstallReport { generation: book.generation, installed, kept, dropped, discarded, lag_secs: lag.max(0) }
    }
}

/// Outcome of one installation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub generation: u64,
    /// Fresh plans from this optimization.
    pub installed: usize,
    /// Old plans retained because their new route failed to convert.
    pub kept: usize,
    /// Old plans for vehicles the optimizer left out.
    pub dropped: usize,
    /// Fresh plans thrown away because their vehicle left service meanwhile.
    pub discarded: usize,
    /// How far fresh plans were delayed to meet the tick loop.
    pub lag_secs: i64,
}

// ── Coordinator ───────────────────────────────────────────────────────────────

struct Job {
    snapshot: WorldSnapshot,
}

/// Runs the optimizer off the tick loop and installs its results.
///
/// Owns one worker thread for its whole life.  Dropping the coordinator
/// cancels any running optimization and joins the worker.
pub struct ReplanCoordinator {
    shared: Arc<SharedPlans>,
    jobs: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
    cancel: CancelToken,
}

impl ReplanCoordinator {
    /// Start the worker thread.
    pub fn spawn<O, R>(
        optimizer: O,
        router:    Arc<R>,
        ops:       OperationParams,
        shared:    Arc<SharedPlans>,
    ) -> SimResult<Self>
    where
        O: Optimizer,
        R: Router,
    {
        let (tx, rx) = crossbeam_channel::unbounded::<Job>();
        let cancel = CancelToken::new();

        let worker = {
            let shared = Arc::clone(&shared);
            let cancel = cancel.clone();
            std::thread::Builder::new()
                .name("gd-replan".into())
                .spawn(move || run_worker(rx, optimizer, router, ops, shared, cancel))?
        };

        Ok(Self { shared, jobs: Some(tx), worker: Some(worker), cancel })
    }

    pub fn shared(&self) -> &Arc<SharedPlans> {
        &self.shared
    }

    pub fn is_busy(&self) -> bool {
        self.shared.lock().in_flight
    }

    /// Hand `snapshot` to the worker.  Returns `false` (and does nothing) if
    /// an optimization is already in flight or the worker is gone.
    pub fn trigger(&self, snapshot: WorldSnapshot) -> bool {
        let Some(jobs) = self.jobs.as_ref() else {
            return false;
        };
        {
            let mut book = self.shared.lock();
            if book.in_flight {
                return false;
            }
            book.in_flight = true;
        }
        if jobs.send(Job { snapshot }).is_err() {
            warn!("replanning worker has stopped; trigger dropped");
            self.shared.release();
            return false;
        }
        true
    }

    /// Block until no optimization is in flight or `timeout` passes.
    /// Returns `true` if idle.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut book = self.shared.lock();
        while book.in_flight {
            if self.shared.idle.wait_until(&mut book, deadline).timed_out() {
                return !book.in_flight;
            }
        }
        true
    }

    /// Ask a running optimization to stop early.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Drop for ReplanCoordinator {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.jobs.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("replanning worker panicked during shutdown");
            }
        }
    }
}

// ── Worker ────────────────────────────────────────────────────────────────────

fn run_worker<O: Optimizer, R: Router>(
    jobs:      Receiver<Job>,
    optimizer: O,
    router:    Arc<R>,
    ops:       OperationParams,
    shared:    Arc<SharedPlans>,
    cancel:    CancelToken,
) {
    for job in jobs.iter() {
        if cancel.is_cancelled() {
            shared.release();
            break;
        }
        let taken_at = job.snapshot.taken_at;

        let solved = catch_unwind(AssertUnwindSafe(|| optimizer.solve(&job.snapshot, &cancel)));
        let routes = match solved {
            Ok(Ok(routes)) => routes,
            Ok(Err(e)) => {
                error!(snapshot = %taken_at, error = %e, "optimizer failed; keeping current plans");
                shared.release();
                continue;
            }
            Err(_) => {
                error!(snapshot = %taken_at, "optimizer panicked; keeping current plans");
                shared.release();
                continue;
            }
        };

        let (converted, failed) = convert_routes(&job.snapshot, &routes, router.as_ref(), &ops);
        let report = shared.install(converted, &failed, taken_at);
        info!(
            snapshot   = %taken_at,
            generation = report.generation,
            installed  = report.installed,
            kept       = report.kept,
            dropped    = report.dropped,
            discarded  = report.discarded,
            lag_secs   = report.lag_secs,
            "plans installed"
        );
    }
}

/// Convert every route against the snapshot.
///
/// Returns the new plans and the vehicles whose conversion failed (they keep
/// their current plan).  Routes for vehicles missing from the snapshot or out
/// of service in it are dropped; empty routes produce no plan.
pub fn convert_routes<R: Router>(
    snapshot: &WorldSnapshot,
    routes:   &RouteSet,
    router:   &R,
    ops:      &OperationParams,
) -> (PlanTable, Vec<VehicleId>) {
    let convert_one = |(vehicle, route): (&VehicleId, &gd_plan::Route)| {
        if route.is_empty() {
            return (*vehicle, Ok(None));
        }
        let plan = convert::route_to_plan(&snapshot.world, *vehicle, route, router, ops, snapshot.taken_at);
        (*vehicle, plan.map(Some))
    };

    #[cfg(not(feature = "parallel"))]
    let results: Vec<(VehicleId, Result<Option<VehiclePlan>, PlanError>)> =
        routes.iter().map(convert_one).collect();

    #[cfg(feature = "parallel")]
    let results: Vec<(VehicleId, Result<Option<VehiclePlan>, PlanError>)> = {
        use rayon::prelude::*;
        routes.par_iter().map(convert_one).collect()
    };

    let mut plans = PlanTable::new();
    let mut failed = Vec::new();
    for (vehicle, result) in results {
        match result {
            Ok(Some(plan)) => {
                plans.insert(vehicle, plan);
            }
            Ok(None) => {}
            Err(e @ (PlanError::UnknownVehicle(_) | PlanError::OutOfService { .. })) => {
                warn!(%vehicle, error = %e, "route dropped");
            }
            Err(e) => {
                warn!(%vehicle, error = %e, "route conversion failed; previous plan kept");
                failed.push(vehicle);
            }
        }
    }
    (plans, failed)
}
