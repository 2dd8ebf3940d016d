//! The `Orchestrator` and its tick loop.

use std::sync::Arc;
use std::time::Duration;

use gd_core::time::DAY;
use gd_core::{BlockageId, OperationParams, OrderId, SimClock, SimConfig, SimTime, SimulationId, VehicleId, VehicleStatus};
use gd_exec::ExecutionEngine;
use gd_spatial::{Blockage, Router};
use gd_world::{Order, Vehicle, WorldSnapshot, WorldState};
use rustc_hash::FxHashSet;
use tracing::{debug, info, warn};

use crate::{
    Event, EventKind, EventQueue, EventSource, PlanTable, ReplanCoordinator, SharedPlans, SimObserver,
    convert,
};

// ── Reports ───────────────────────────────────────────────────────────────────

/// What happened during one tick.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TickReport {
    /// Zero-based index of the tick.
    pub tick: u64,
    /// Simulated time after the tick committed.
    pub now: SimTime,
    pub events: usize,
    /// New events merged from the event source.
    pub merged: usize,
    pub actions_completed: usize,
    /// `(vehicle, order, volume)` for every serve that finished.
    pub deliveries: Vec<(VehicleId, OrderId, f64)>,
    pub orders_completed: usize,
    pub return_plans: usize,
    pub replan_triggered: bool,
}

impl TickReport {
    pub fn delivered_m3(&self) -> f64 {
        self.deliveries.iter().map(|(_, _, v)| v).sum()
    }
}

/// Totals over a `run_*` call.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunSummary {
    pub ticks: u64,
    pub events: usize,
    pub actions_completed: usize,
    pub delivered_m3: f64,
    pub orders_completed: usize,
    pub replans: usize,
}

impl RunSummary {
    fn absorb(&mut self, report: &TickReport) {
        self.ticks += 1;
        self.events += report.events;
        self.actions_completed += report.actions_completed;
        self.delivered_m3 += report.delivered_m3();
        self.orders_completed += report.orders_completed;
        self.replans += usize::from(report.replan_triggered);
    }
}

// ── Orchestrator ──────────────────────────────────────────────────────────────

/// Drives simulated time for one fleet.
///
/// Each tick runs seven steps:
///
/// 1. `next = now + tick`.
/// 2. Drain and apply every queued event with `at < next`, in order.
/// 3. Every `poll_interval_ticks` ticks (and right after midnight) merge new
///    orders and blockages from the event source.
/// 4. Advance every plan to `next` with the [`ExecutionEngine`]; vehicles in
///    an incident are skipped.  Delivered orders are archived.
/// 5. Give idle, plan-less vehicles away from the plant a drive home.
/// 6. Trigger the replanning coordinator if something changed or the
///    replanning interval has elapsed.
/// 7. Commit `next`.
///
/// Steps 4 and 5 hold the plan-table lock, so an installation by the
/// replanning worker lands either before or after them, never in between.
/// Breakdowns and maintenance withdraw the vehicle's plan through the same
/// lock, which keeps a replan computed before the event from reviving it.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Orchestrator<R: Router> {
    pub(crate) id: SimulationId,
    pub(crate) config: SimConfig,
    pub(crate) clock: SimClock,
    pub(crate) world: WorldState,
    pub(crate) events: EventQueue,
    pub(crate) source: Box<dyn EventSource>,
    pub(crate) router: Arc<R>,
    pub(crate) engine: ExecutionEngine,
    pub(crate) plans: Arc<SharedPlans>,
    pub(crate) coordinator: ReplanCoordinator,
    pub(crate) dirty: bool,
    pub(crate) poll_due: bool,
    pub(crate) ticks: u64,
    pub(crate) last_replan: SimTime,
    pub(crate) scheduled_orders: FxHashSet<OrderId>,
    pub(crate) scheduled_blockages: FxHashSet<BlockageId>,
}

impl<R: Router> Orchestrator<R> {
    // ── Drivers ───────────────────────────────────────────────────────────

    /// Run exactly `n` ticks.
    pub fn run_ticks<O: SimObserver>(&mut self, n: u64, observer: &mut O) -> RunSummary {
        let mut summary = RunSummary::default();
        for _ in 0..n {
            let report = self.advance_tick(observer);
            summary.absorb(&report);
        }
        observer.on_run_end(self.clock.now);
        summary
    }

    /// Tick until the clock reaches `until` (the last tick may overshoot it
    /// by less than one tick).
    pub fn run_until<O: SimObserver>(&mut self, until: SimTime, observer: &mut O) -> RunSummary {
        let mut summary = RunSummary::default();
        while self.clock.now < until {
            let report = self.advance_tick(observer);
            summary.absorb(&report);
        }
        observer.on_run_end(self.clock.now);
        summary
    }

    /// Process one tick.  Never fails: bad entities are logged and skipped.
    pub fn advance_tick<O: SimObserver>(&mut self, observer: &mut O) -> TickReport {
        // ① Window.
        let now = self.clock.now;
        let next = self.clock.next_tick();
        observer.on_tick_start(now);
        let mut report = TickReport { tick: self.ticks, ..Default::default() };

        // ② Events.
        while let Some(event) = self.events.pop_before(next) {
            self.apply_event(&event);
            observer.on_event(&event);
            report.events += 1;
        }
        self.world.prune_expired_blockages(next);
        self.world.prune_finished_maintenance(now);

        // ③ Source polling.
        if self.poll_due || self.ticks.is_multiple_of(self.config.poll_interval_ticks) {
            self.poll_due = false;
            report.merged = self.poll_source(now, next);
            if report.merged > 0 {
                self.dirty = true;
            }
        }

        // ④ + ⑤ under the plan lock.
        {
            let shared = Arc::clone(&self.plans);
            let mut book = shared.lock();
            execute_plans(&self.engine, &mut self.world, &mut book.plans, next, &mut report);
            report.orders_completed = self.world.prune_delivered_orders().len();
            report.return_plans =
                assign_return_plans(&self.world, &mut book.plans, self.router.as_ref(), &self.config.ops, next);
            book.set_clock(next);
        }
        self.world.set_now(next);

        // ⑥ Replanning.
        let interval_due = next.since(self.last_replan) >= self.config.replan_interval_secs;
        if (self.dirty || interval_due) && self.trigger_replan() {
            self.dirty = false;
            self.last_replan = next;
            report.replan_triggered = true;
        }

        // ⑦ Commit.
        self.clock.advance();
        self.ticks += 1;
        report.now = next;

        debug!(
            tick      = report.tick,
            now       = %next,
            events    = report.events,
            completed = report.actions_completed,
            delivered = report.delivered_m3(),
            replan    = report.replan_triggered,
            "tick"
        );

        let every = self.config.snapshot_interval_ticks;
        if every > 0 && self.ticks.is_multiple_of(every) {
            let book = self.plans.lock();
            observer.on_snapshot(next, &self.world, &book.plans);
        }
        observer.on_tick_end(&report);
        report
    }

    // ── External inputs ───────────────────────────────────────────────────

    /// Queue an event from outside the event source (operator input, tests).
    ///
    /// Orders and blockages go through the same duplicate and staleness
    /// checks as polled ones.  Returns `false` if the event was rejected.
    pub fn push_event(&mut self, event: Event) -> bool {
        self.schedule(event)
    }

    /// Replan on the next tick regardless of the interval.
    pub fn request_replan(&mut self) {
        self.dirty = true;
    }

    /// Block until the replanning worker is idle or `timeout` passes.
    pub fn wait_for_replan(&self, timeout: Duration) -> bool {
        self.coordinator.wait_idle(timeout)
    }

    // ── Read-only queries ─────────────────────────────────────────────────

    pub fn id(&self) -> SimulationId {
        self.id
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn now(&self) -> SimTime {
        self.clock.now
    }

    /// Ticks processed so far.
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    pub fn world(&self) -> &WorldState {
        &self.world
    }

    pub fn vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.world.vehicles()
    }

    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.world.orders()
    }

    pub fn active_blockages(&self) -> impl Iterator<Item = &Blockage> {
        self.world.active_blockages(self.clock.now)
    }

    pub fn overdue_orders(&self) -> Vec<OrderId> {
        self.world.overdue_orders(self.clock.now)
    }

    /// Copy of the live plan table.
    pub fn plans(&self) -> PlanTable {
        self.plans.plans()
    }

    pub fn plan(&self, vehicle: VehicleId) -> Option<gd_plan::VehiclePlan> {
        self.plans.lock().plans.get(&vehicle).cloned()
    }

    /// Number of optimizer results installed so far.
    pub fn plan_generation(&self) -> u64 {
        self.plans.lock().generation()
    }

    pub fn is_replanning(&self) -> bool {
        self.coordinator.is_busy()
    }

    pub fn needs_replan(&self) -> bool {
        self.dirty
    }

    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    /// Snapshot of the world and plans as of now.
    pub fn snapshot(&self) -> WorldSnapshot {
        let book = self.plans.lock();
        WorldSnapshot::capture(&self.world, &book.plans)
    }

    // ── Internals ─────────────────────────────────────────────────────────

    /// Put `event` on the queue, applying the merge rules for orders and
    /// blockages.
    pub(crate) fn schedule(&mut self, event: Event) -> bool {
        let now = self.clock.now;
        let mut at = event.at;
        match &event.kind {
            EventKind::OrderArrival(order) => {
                if self.world.knows_order(order.id) || self.scheduled_orders.contains(&order.id) {
                    return false;
                }
                if at < now {
                    debug!(order = %order.id, arrival = %at, "past order skipped");
                    return false;
                }
                self.scheduled_orders.insert(order.id);
            }
            EventKind::BlockageStart(blockage) => {
                if self.world.knows_blockage(blockage.id) || self.scheduled_blockages.contains(&blockage.id) {
                    return false;
                }
                if blockage.is_expired_at(now) {
                    return false;
                }
                self.scheduled_blockages.insert(blockage.id);
                // Still-active blockages take effect immediately.
                at = at.max(now);
            }
            _ => {}
        }
        self.events.push(Event::new(at, event.kind));
        true
    }

    fn poll_source(&mut self, now: SimTime, next: SimTime) -> usize {
        let mut fetched = Vec::new();
        for day in now.day()..=next.day() {
            match self.source.orders_for_day(day) {
                Ok(events) => fetched.extend(events),
                Err(e) => warn!(day, error = %e, "order poll failed"),
            }
            match self.source.blockages_for_day(day) {
                Ok(events) => fetched.extend(events),
                Err(e) => warn!(day, error = %e, "blockage poll failed"),
            }
        }
        let mut merged = 0;
        for event in fetched {
            if self.schedule(event) {
                merged += 1;
            }
        }
        if merged > 0 {
            debug!(merged, "event source merged");
        }
        merged
    }

    fn apply_event(&mut self, event: &Event) {
        let at = event.at;
        match &event.kind {
            EventKind::OrderArrival(order) => {
                // The world remembers every order it has seen from here on.
                self.scheduled_orders.remove(&order.id);
                if self.world.add_order(order.clone()) {
                    debug!(order = %order.id, at = %at, volume = order.requested_m3, "order arrived");
                    self.dirty = true;
                } else {
                    debug!(order = %order.id, "duplicate order ignored");
                }
            }

            EventKind::BlockageStart(blockage) => {
                self.scheduled_blockages.remove(&blockage.id);
                if blockage.is_expired_at(at) {
                    return;
                }
                if self.world.add_blockage(blockage.clone()) {
                    self.events.push(Event::new(blockage.end, EventKind::BlockageEnd(blockage.id)));
                    debug!(blockage = %blockage.id, until = %blockage.end, "road closed");
                    self.dirty = true;
                }
            }

            EventKind::BlockageEnd(id) => {
                if self.world.remove_blockage(*id).is_some() {
                    debug!(blockage = %id, "road reopened");
                    self.dirty = true;
                }
            }

            EventKind::Breakdown { vehicle, kind } => match self.world.begin_incident(*vehicle, *kind, at) {
                Ok(incident) => {
                    self.plans.lock().withdraw(*vehicle);
                    self.events.push(Event::new(incident.available_at, EventKind::BreakdownEnd { vehicle: *vehicle }));
                    info!(%vehicle, kind = ?kind, until = %incident.available_at, "vehicle broke down");
                    self.dirty = true;
                }
                Err(e) => warn!(%vehicle, error = %e, "breakdown skipped"),
            },

            EventKind::BreakdownEnd { vehicle } => match self.world.end_incident(*vehicle) {
                Ok(Some(incident)) => {
                    info!(%vehicle, workshop = incident.needs_workshop, "vehicle back in service");
                    self.dirty = true;
                }
                Ok(None) => {}
                Err(e) => warn!(%vehicle, error = %e, "breakdown end skipped"),
            },

            EventKind::MaintenanceStart { vehicle } => match self.world.vehicle(*vehicle).map(|v| v.status) {
                None => warn!(%vehicle, "maintenance for unknown vehicle skipped"),
                Some(VehicleStatus::Incident) => {
                    debug!(%vehicle, "vehicle in incident; maintenance start ignored");
                }
                Some(_) => {
                    if self.world.begin_maintenance(*vehicle).is_ok() {
                        self.plans.lock().withdraw(*vehicle);
                        info!(%vehicle, "maintenance started");
                        self.dirty = true;
                    }
                }
            },

            EventKind::MaintenanceEnd { vehicle } => match self.world.end_maintenance(*vehicle) {
                Ok(true) => {
                    info!(%vehicle, "maintenance finished");
                    self.dirty = true;
                }
                Ok(false) => {}
                Err(e) => warn!(%vehicle, error = %e, "maintenance end skipped"),
            },

            EventKind::NewDay => {
                let refilled = self.world.refill_auxiliary_depots();
                self.events.push(Event::new_day(at + DAY));
                self.poll_due = true;
                info!(day = at.day(), refilled, "new day");
            }
        }
    }

    fn trigger_replan(&mut self) -> bool {
        if self.coordinator.is_busy() {
            return false;
        }
        let snapshot = {
            let book = self.plans.lock();
            WorldSnapshot::capture(&self.world, &book.plans)
        };
        let accepted = self.coordinator.trigger(snapshot);
        if accepted {
            debug!(at = %self.world.now(), "replan triggered");
        }
        accepted
    }
}

// ── Tick steps that run under the plan lock ───────────────────────────────────

fn execute_plans(
    engine: &ExecutionEngine,
    world:  &mut WorldState,
    plans:  &mut PlanTable,
    next:   SimTime,
    report: &mut TickReport,
) {
    let mut finished = Vec::new();
    for (vehicle, plan) in plans.iter_mut() {
        match world.vehicle(*vehicle).map(|v| v.status) {
            None => {
                warn!(%vehicle, "plan for unknown vehicle skipped");
                continue;
            }
            Some(VehicleStatus::Incident) => continue,
            Some(_) => {}
        }
        match engine.advance(world, plan, next) {
            Ok(step) => {
                report.actions_completed += step.completed;
                report
                    .deliveries
                    .extend(step.deliveries.into_iter().map(|(order, v)| (*vehicle, order, v)));
                if step.finished {
                    finished.push(*vehicle);
                }
            }
            Err(e) => warn!(%vehicle, error = %e, "execution skipped"),
        }
    }
    for vehicle in finished {
        plans.remove(&vehicle);
    }
}

fn assign_return_plans<R: Router>(
    world:  &WorldState,
    plans:  &mut PlanTable,
    router: &R,
    ops:    &OperationParams,
    start:  SimTime,
) -> usize {
    let Some(home) = world.main_depot().map(|d| d.position) else {
        return 0;
    };
    let idle: Vec<VehicleId> = world
        .vehicles()
        .filter(|v| v.status == VehicleStatus::Available && v.position != home && !plans.contains_key(&v.id))
        .map(|v| v.id)
        .collect();

    let mut assigned = 0;
    for vehicle in idle {
        match convert::return_plan(world, vehicle, home, router, ops, start) {
            Some(plan) => {
                plans.insert(vehicle, plan);
                assigned += 1;
            }
            None => debug!(%vehicle, "no path to the plant; staying put"),
        }
    }
    assigned
}
