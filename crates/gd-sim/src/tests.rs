//! Unit tests for gd-sim.

#[cfg(test)]
mod helpers {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
    use gd_core::{DepotId, GridBounds, OrderId, Position, SimConfig, SimTime, VehicleId};
    use gd_plan::{Route, RouteSet, Stop};
    use gd_spatial::{Router, TimeDependentRouter};
    use gd_world::{Depot, Order, Vehicle, VehicleType, WorldSnapshot, WorldState};

    use crate::{CancelToken, NoopObserver, Optimizer, OptimizerError, Orchestrator, SimBuilder, TickReport};

    pub const V1: VehicleId = VehicleId(1);
    pub const V2: VehicleId = VehicleId(2);
    pub const V3: VehicleId = VehicleId(3);
    pub const O1: OrderId = OrderId(1);
    pub const PLANT: DepotId = DepotId(0);
    pub const TANK: DepotId = DepotId(1);

    pub fn config() -> SimConfig {
        SimConfig { grid: GridBounds::new(19, 19), ..SimConfig::default() }
    }

    pub fn router() -> TimeDependentRouter {
        TimeDependentRouter::from_config(&config())
    }

    pub fn plant() -> Depot {
        Depot::main(PLANT, "plant", Position::new(0, 0), 10_000.0)
    }

    /// Auxiliary tank at (10,10), 160 m³, no fuel pump.
    pub fn tank() -> Depot {
        Depot::auxiliary(TANK, "tank", Position::new(10, 10), 160.0, false)
    }

    pub fn truck(id: VehicleId, x: i32, y: i32) -> Vehicle {
        Vehicle::new(id, VehicleType::TA, Position::new(x, y)).with_glp(20.0)
    }

    /// 10 m³ at (5,5), due six hours after `arrival`.
    pub fn order_at(arrival: SimTime) -> Order {
        Order::with_window_hours(O1, Position::new(5, 5), arrival, 6, 10.0)
    }

    pub fn world() -> WorldState {
        let mut w = WorldState::new(GridBounds::new(19, 19), SimTime::ZERO);
        w.add_depot(plant()).unwrap();
        w.add_depot(tank()).unwrap();
        w.add_vehicle(truck(V1, 0, 0)).unwrap();
        w.add_order(order_at(SimTime::ZERO));
        w
    }

    pub fn builder() -> SimBuilder<TimeDependentRouter> {
        SimBuilder::new(config(), router()).depot(plant()).depot(tank())
    }

    // ── Stub optimizers ───────────────────────────────────────────────────

    pub fn no_routes(_: &WorldSnapshot, _: &CancelToken) -> Result<RouteSet, OptimizerError> {
        Ok(RouteSet::new())
    }

    /// First vehicle serves every open order in id order.
    pub fn deliver_all(snapshot: &WorldSnapshot, _: &CancelToken) -> Result<RouteSet, OptimizerError> {
        let mut routes = RouteSet::new();
        if let Some(v) = snapshot.world.vehicles().next() {
            let stops = snapshot
                .world
                .orders()
                .map(|o| Stop::Order { order: o.id, deadline: o.deadline, volume_m3: o.remaining_m3() })
                .collect();
            routes.insert(v.id, Route::new(stops));
        }
        Ok(routes)
    }

    /// Every vehicle heads to the plant.
    pub fn all_to_plant(snapshot: &WorldSnapshot, _: &CancelToken) -> Result<RouteSet, OptimizerError> {
        Ok(snapshot
            .world
            .vehicles()
            .map(|v| (v.id, Route::new(vec![Stop::Depot { depot: PLANT, volume_m3: 0.0 }])))
            .collect())
    }

    /// Handles for an optimizer that blocks until released.
    pub struct Gate {
        pub started: Receiver<()>,
        pub release: Sender<()>,
        pub calls: Arc<AtomicUsize>,
    }

    impl Gate {
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn wait_started(&self) {
            self.started.recv_timeout(Duration::from_secs(5)).unwrap();
        }
    }

    pub fn gate() -> (impl Optimizer, Gate) {
        gate_with(no_routes)
    }

    /// A gated optimizer that answers with `solve` once released.  Dropping
    /// `Gate::release` opens the gate for good.
    pub fn gate_with<F>(solve: F) -> (impl Optimizer, Gate)
    where
        F: Fn(&WorldSnapshot, &CancelToken) -> Result<RouteSet, OptimizerError> + Send + 'static,
    {
        let (started_tx, started_rx) = crossbeam_channel::unbounded::<()>();
        let (release_tx, release_rx) = crossbeam_channel::unbounded::<()>();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let optimizer = move |snapshot: &WorldSnapshot, cancel: &CancelToken| {
            counter.fetch_add(1, Ordering::SeqCst);
            let _ = started_tx.send(());
            loop {
                if cancel.is_cancelled() {
                    return Err(OptimizerError::Cancelled);
                }
                match release_rx.recv_timeout(Duration::from_millis(5)) {
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => return solve(snapshot, cancel),
                    Err(RecvTimeoutError::Timeout) => {}
                }
            }
        };
        (optimizer, Gate { started: started_rx, release: release_tx, calls })
    }

    /// Advance `n` ticks, waiting out every replan so installs are
    /// deterministic.
    pub fn step<R: Router>(sim: &mut Orchestrator<R>, n: u64) -> Vec<TickReport> {
        (0..n)
            .map(|_| {
                let report = sim.advance_tick(&mut NoopObserver);
                if report.replan_triggered {
                    assert!(sim.wait_for_replan(Duration::from_secs(5)));
                }
                report
            })
            .collect()
    }

    pub fn step_until<R: Router>(sim: &mut Orchestrator<R>, until: SimTime) -> Vec<TickReport> {
        let mut reports = Vec::new();
        while sim.now() < until {
            reports.extend(step(sim, 1));
        }
        reports
    }
}

// ── EventQueue ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod event_queue {
    use gd_core::{SimTime, VehicleId};
    use gd_world::{IncidentKind, MaintenanceWindow};

    use crate::{Event, EventKind, EventQueue};

    #[test]
    fn pops_in_time_order_and_fifo_within_a_timestamp() {
        let mut q = EventQueue::new();
        q.push(Event::new_day(SimTime(300)));
        q.push(Event::breakdown(SimTime(100), VehicleId(1), IncidentKind::Type1));
        q.push(Event::breakdown(SimTime(100), VehicleId(2), IncidentKind::Type2));
        q.push(Event::new(SimTime(50), EventKind::MaintenanceEnd { vehicle: VehicleId(3) }));
        assert_eq!(q.len(), 4);
        assert_eq!(q.next_time(), Some(SimTime(50)));

        let order: Vec<Option<VehicleId>> =
            std::iter::from_fn(|| q.pop_before(SimTime(301))).map(|e| e.kind.vehicle()).collect();
        assert_eq!(order, vec![Some(VehicleId(3)), Some(VehicleId(1)), Some(VehicleId(2)), None]);
        assert!(q.is_empty());
    }

    #[test]
    fn pop_before_is_exclusive() {
        let mut q = EventQueue::new();
        q.push(Event::new_day(SimTime(60)));
        assert!(q.pop_before(SimTime(60)).is_none());
        assert_eq!(q.len(), 1);
        assert!(q.pop_before(SimTime(61)).is_some());
        assert_eq!(q.next_time(), None);
    }

    #[test]
    fn maintenance_window_expands_to_two_events() {
        let w = MaintenanceWindow::new(VehicleId(4), SimTime(10), SimTime(20));
        let [start, end] = Event::maintenance(&w);
        assert_eq!(start.at, SimTime(10));
        assert_eq!(start.kind.label(), "MAINTENANCE_START");
        assert_eq!(end.at, SimTime(20));
        assert_eq!(end.kind, EventKind::MaintenanceEnd { vehicle: VehicleId(4) });
    }
}

// ── StaticSource ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod source {
    use gd_core::{BlockageId, Position, SimTime};
    use gd_spatial::Blockage;

    use super::helpers::*;
    use crate::{EventSource, StaticSource};

    #[test]
    fn filters_by_day() {
        let late_block =
            Blockage::new(BlockageId(1), SimTime::from_dhm(0, 22, 0), SimTime::from_dhm(1, 2, 0), vec![
                Position::new(3, 0),
            ])
            .unwrap();
        let src = StaticSource::default()
            .with_order(order_at(SimTime::from_dhm(0, 9, 0)))
            .with_blockage(late_block);

        assert_eq!(src.orders_for_day(0).unwrap().len(), 1);
        assert!(src.orders_for_day(1).unwrap().is_empty());
        // The blockage spans midnight, so both days report it.
        assert_eq!(src.blockages_for_day(0).unwrap().len(), 1);
        assert_eq!(src.blockages_for_day(1).unwrap().len(), 1);
        assert!(src.blockages_for_day(2).unwrap().is_empty());
    }
}

// ── Route → plan conversion ───────────────────────────────────────────────────

#[cfg(test)]
mod convert {
    use std::collections::BTreeMap;

    use gd_core::time::DAY;
    use gd_core::{BlockageId, OperationParams, OrderId, Position, SimTime, VehicleId, VehicleStatus};
    use gd_exec::ExecutionEngine;
    use gd_plan::{ActionKind, Route, RouteSet, Stop};
    use gd_spatial::Blockage;
    use gd_world::WorldSnapshot;

    use super::helpers::*;
    use crate::{PlanError, convert_routes, route_to_plan};

    fn serve_o1() -> Route {
        Route::new(vec![Stop::Order { order: O1, deadline: SimTime(6 * 3600), volume_m3: 10.0 }])
    }

    #[test]
    fn simple_delivery_scenario() {
        let mut w = world();
        let ops = OperationParams::default();
        let mut plan = route_to_plan(&w, V1, &serve_o1(), &router(), &ops, SimTime::ZERO).unwrap();

        let labels: Vec<&str> = plan.actions.iter().map(|a| a.kind.label()).collect();
        assert_eq!(labels, ["drive", "serve"]);
        assert_eq!(plan.actions[0].destination(), Some(Position::new(5, 5)));
        assert_eq!(plan.actions[0].end, SimTime(720));
        assert_eq!(plan.actions[1].kind, ActionKind::Serve { order: O1, volume_m3: 10.0 });
        assert_eq!(plan.actions[1].end, SimTime(1620));

        let done = plan.end_time();
        ExecutionEngine::new().advance(&mut w, &mut plan, done).unwrap();
        assert_eq!(w.order(O1).unwrap().remaining_m3(), 0.0);
        assert_eq!(w.vehicle(V1).unwrap().glp_m3(), 10.0);
        assert!(plan.is_finished());
    }

    #[test]
    fn drive_fuel_uses_current_load() {
        let w = world();
        let ops = OperationParams::default();
        let plan = route_to_plan(&w, V1, &serve_o1(), &router(), &ops, SimTime::ZERO).unwrap();
        let ActionKind::Drive { fuel_gal, .. } = plan.actions[0].kind else {
            panic!("expected a drive");
        };
        // 10 km, 2.5 t tare + 20 m³ × 0.5 t/m³.
        assert!((fuel_gal - 10.0 * 12.5 / 180.0).abs() < 1e-12);
    }

    #[test]
    fn depot_stops_reload_and_refuel_where_possible() {
        let w = world();
        let ops = OperationParams::default();
        let route = Route::new(vec![
            Stop::Depot { depot: TANK, volume_m3: 5.0 },
            Stop::Depot { depot: PLANT, volume_m3: 5.0 },
        ]);
        let plan = route_to_plan(&w, V1, &route, &router(), &ops, SimTime(100)).unwrap();
        let labels: Vec<&str> = plan.actions.iter().map(|a| a.kind.label()).collect();
        assert_eq!(labels, ["drive", "reload", "drive", "reload", "refuel"]);
        // 20 cells out, 10 min reload, 20 cells back, reload, refuel.
        assert_eq!(plan.end_time(), SimTime(100 + 1440 + 600 + 1440 + 600 + 600));
        assert_eq!(plan.start, SimTime(100));
    }

    #[test]
    fn no_drive_when_already_at_the_stop() {
        let w = world();
        let route = Route::new(vec![Stop::Depot { depot: PLANT, volume_m3: 5.0 }]);
        let plan = route_to_plan(&w, V1, &route, &router(), &OperationParams::default(), SimTime::ZERO).unwrap();
        let labels: Vec<&str> = plan.actions.iter().map(|a| a.kind.label()).collect();
        assert_eq!(labels, ["reload", "refuel"]);
    }

    #[test]
    fn unreachable_stop_fails_the_route() {
        let mut w = world();
        let wall = Blockage::new(BlockageId(1), SimTime::ZERO, SimTime(DAY), vec![
            Position::new(3, 0),
            Position::new(3, 19),
        ])
        .unwrap();
        w.add_blockage(wall);
        let err = route_to_plan(&w, V1, &serve_o1(), &router(), &OperationParams::default(), SimTime::ZERO)
            .unwrap_err();
        assert_eq!(err, PlanError::Unreachable {
            vehicle: V1,
            from:    Position::new(0, 0),
            to:      Position::new(5, 5),
        });
    }

    #[test]
    fn unknown_references() {
        let w = world();
        let ops = OperationParams::default();
        let ghost_order = Route::new(vec![Stop::Order { order: OrderId(9), deadline: SimTime(0), volume_m3: 1.0 }]);
        assert!(matches!(
            route_to_plan(&w, V1, &ghost_order, &router(), &ops, SimTime::ZERO),
            Err(PlanError::UnknownOrder { .. })
        ));
        assert_eq!(
            route_to_plan(&w, VehicleId(9), &serve_o1(), &router(), &ops, SimTime::ZERO),
            Err(PlanError::UnknownVehicle(VehicleId(9)))
        );
    }

    #[test]
    fn convert_routes_sorts_out_failures() {
        let mut w = world();
        w.add_vehicle(truck(V2, 1, 1)).unwrap();
        w.add_vehicle(truck(V3, 2, 2)).unwrap();
        let snap = WorldSnapshot::capture(&w, &BTreeMap::new());

        let mut routes = RouteSet::new();
        routes.insert(V1, serve_o1());
        routes.insert(V2, Route::new(vec![Stop::Order { order: OrderId(9), deadline: SimTime(0), volume_m3: 1.0 }]));
        routes.insert(V3, Route::default());
        routes.insert(VehicleId(77), serve_o1());

        let (plans, failed) = convert_routes(&snap, &routes, &router(), &OperationParams::default());
        assert_eq!(plans.keys().copied().collect::<Vec<_>>(), vec![V1]);
        assert_eq!(failed, vec![V2]);
    }

    #[test]
    fn out_of_service_vehicles_get_no_plan() {
        let mut w = world();
        w.add_vehicle(truck(V2, 1, 1)).unwrap();
        w.begin_maintenance(V2).unwrap();
        assert_eq!(
            route_to_plan(&w, V2, &serve_o1(), &router(), &OperationParams::default(), SimTime::ZERO),
            Err(PlanError::OutOfService { vehicle: V2, status: VehicleStatus::Maintenance })
        );

        let snap = WorldSnapshot::capture(&w, &BTreeMap::new());
        let routes: RouteSet = [(V1, serve_o1()), (V2, serve_o1())].into_iter().collect();
        let (plans, failed) = convert_routes(&snap, &routes, &router(), &OperationParams::default());
        assert_eq!(plans.keys().copied().collect::<Vec<_>>(), vec![V1]);
        // Dropped, not failed: no old plan is kept for it either.
        assert!(failed.is_empty());
    }
}

// ── Replanning coordinator ────────────────────────────────────────────────────

#[cfg(test)]
mod coordinator {
    use std::collections::{BTreeMap, BTreeSet};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use gd_core::{OperationParams, SimTime};
    use gd_plan::{Route, RouteSet, Stop, VehiclePlan};
    use gd_world::WorldSnapshot;

    use super::helpers::*;
    use crate::{CancelToken, OptimizerError, ReplanCoordinator, SharedPlans};

    const WAIT: Duration = Duration::from_secs(5);

    fn spawn<O: crate::Optimizer>(optimizer: O) -> (ReplanCoordinator, Arc<SharedPlans>) {
        let shared = Arc::new(SharedPlans::new());
        let coord =
            ReplanCoordinator::spawn(optimizer, Arc::new(router()), OperationParams::default(), Arc::clone(&shared))
                .unwrap();
        (coord, shared)
    }

    fn snapshot_at(t: i64) -> WorldSnapshot {
        let mut w = world();
        w.set_now(SimTime(t));
        WorldSnapshot::capture(&w, &BTreeMap::new())
    }

    #[test]
    fn installs_converted_plans() {
        let (coord, shared) = spawn(deliver_all);
        assert!(coord.trigger(snapshot_at(60)));
        assert!(coord.wait_idle(WAIT));

        let book = shared.lock();
        assert_eq!(book.generation(), 1);
        assert!(!book.in_flight());
        let plan = &book.plans[&V1];
        assert_eq!(plan.start, SimTime(60));
        assert_eq!(plan.actions.len(), 2);
    }

    #[test]
    fn at_most_one_optimization_in_flight() {
        let (optimizer, gate) = gate();
        let (coord, shared) = spawn(optimizer);

        assert!(coord.trigger(snapshot_at(0)));
        gate.wait_started();
        assert!(coord.is_busy());
        assert!(!coord.trigger(snapshot_at(60)));
        assert!(!coord.trigger(snapshot_at(120)));
        assert_eq!(gate.calls(), 1);

        gate.release.send(()).unwrap();
        assert!(coord.wait_idle(WAIT));
        assert_eq!(gate.calls(), 1);
        assert_eq!(shared.lock().generation(), 1);

        // The guard is free again.
        assert!(coord.trigger(snapshot_at(180)));
        gate.wait_started();
        gate.release.send(()).unwrap();
        assert!(coord.wait_idle(WAIT));
        assert_eq!(gate.calls(), 2);
    }

    fn seeded(shared: &SharedPlans) {
        shared.lock().plans.insert(V1, VehiclePlan::new(V1, SimTime(1)));
    }

    #[test]
    fn optimizer_error_leaves_plans_untouched() {
        let failing = |_: &WorldSnapshot, _: &CancelToken| -> Result<RouteSet, OptimizerError> {
            Err(OptimizerError::Failed("no solution".into()))
        };
        let (coord, shared) = spawn(failing);
        seeded(&shared);

        assert!(coord.trigger(snapshot_at(60)));
        assert!(coord.wait_idle(WAIT));
        let book = shared.lock();
        assert_eq!(book.generation(), 0);
        assert_eq!(book.plans[&V1].start, SimTime(1));
        drop(book);
        assert!(coord.trigger(snapshot_at(120)));
    }

    #[test]
    fn optimizer_panic_is_contained() {
        let panicking = |_: &WorldSnapshot, _: &CancelToken| -> Result<RouteSet, OptimizerError> {
            panic!("optimizer bug");
        };
        let (coord, shared) = spawn(panicking);
        seeded(&shared);

        assert!(coord.trigger(snapshot_at(60)));
        assert!(coord.wait_idle(WAIT));
        assert_eq!(shared.lock().plans[&V1].start, SimTime(1));
        // Worker survived and still accepts work.
        assert!(coord.trigger(snapshot_at(120)));
        assert!(coord.wait_idle(WAIT));
    }

    #[test]
    fn failed_conversion_keeps_old_plan_and_omitted_vehicles_lose_theirs() {
        let mixed = |snap: &WorldSnapshot, _: &CancelToken| -> Result<RouteSet, OptimizerError> {
            let mut routes = RouteSet::new();
            routes.insert(V1, Route::new(vec![Stop::Order {
                order:     gd_core::OrderId(404),
                deadline:  snap.taken_at,
                volume_m3: 1.0,
            }]));
            routes.insert(V2, Route::new(vec![Stop::Depot { depot: PLANT, volume_m3: 1.0 }]));
            Ok(routes)
        };
        let (coord, shared) = spawn(mixed);
        {
            let mut book = shared.lock();
            book.plans.insert(V1, VehiclePlan::new(V1, SimTime(1)));
            book.plans.insert(V3, VehiclePlan::new(V3, SimTime(1)));
        }

        let mut w = world();
        w.add_vehicle(truck(V2, 0, 0)).unwrap();
        w.add_vehicle(truck(V3, 0, 0)).unwrap();
        w.set_now(SimTime(60));
        assert!(coord.trigger(WorldSnapshot::capture(&w, &BTreeMap::new())));
        assert!(coord.wait_idle(WAIT));

        let book = shared.lock();
        assert_eq!(book.plans[&V1].start, SimTime(1));
        assert_eq!(book.plans[&V2].start, SimTime(60));
        assert!(!book.plans.contains_key(&V3));
    }

    #[test]
    fn readers_never_see_a_half_installed_table() {
        let (coord, shared) = spawn(all_to_plant);
        let stop = Arc::new(AtomicBool::new(false));

        let reader = {
            let shared = Arc::clone(&shared);
            let stop = Arc::clone(&stop);
            std::thread::spawn(move || {
                let mut checks = 0u64;
                while !stop.load(Ordering::Acquire) {
                    let book = shared.lock();
                    let starts: BTreeSet<SimTime> = book.plans.values().map(|p| p.start).collect();
                    assert!(starts.len() <= 1, "mixed generations: {starts:?}");
                    assert!(book.plans.is_empty() || book.plans.len() == 3);
                    checks += 1;
                }
                checks
            })
        };

        let mut w = world();
        w.add_vehicle(truck(V2, 4, 4)).unwrap();
        w.add_vehicle(truck(V3, 9, 2)).unwrap();
        for i in 1..=20 {
            w.set_now(SimTime(i * 60));
            assert!(coord.trigger(WorldSnapshot::capture(&w, &BTreeMap::new())));
            assert!(coord.wait_idle(WAIT));
        }
        stop.store(true, Ordering::Release);

        assert!(reader.join().unwrap() > 0);
        assert_eq!(shared.lock().generation(), 20);
    }

    #[test]
    fn vehicles_withdrawn_mid_optimization_get_no_fresh_plan() {
        let (optimizer, gate) = gate_with(all_to_plant);
        let (coord, shared) = spawn(optimizer);
        let mut w = world();
        w.add_vehicle(truck(V2, 4, 4)).unwrap();
        w.set_now(SimTime(60));

        assert!(coord.trigger(WorldSnapshot::capture(&w, &BTreeMap::new())));
        gate.wait_started();
        shared.lock().withdraw(V2);
        gate.release.send(()).unwrap();
        assert!(coord.wait_idle(WAIT));
        {
            let book = shared.lock();
            assert!(book.plans.contains_key(&V1));
            assert!(!book.plans.contains_key(&V2));
        }

        // A withdrawal only voids the optimization it interrupted.
        assert!(coord.trigger(WorldSnapshot::capture(&w, &BTreeMap::new())));
        gate.wait_started();
        gate.release.send(()).unwrap();
        assert!(coord.wait_idle(WAIT));
        assert!(shared.lock().plans.contains_key(&V2));
    }

    #[test]
    fn withdrawing_while_idle_just_drops_the_plan() {
        let (coord, shared) = spawn(all_to_plant);
        seeded(&shared);
        assert!(shared.lock().withdraw(V1).is_some());
        assert!(shared.lock().plans.is_empty());

        assert!(coord.trigger(snapshot_at(60)));
        assert!(coord.wait_idle(WAIT));
        assert!(shared.lock().plans.contains_key(&V1));
    }

    #[test]
    fn late_results_are_delayed_to_the_committed_tick() {
        let (optimizer, gate) = gate_with(deliver_all);
        let (coord, shared) = spawn(optimizer);

        assert!(coord.trigger(snapshot_at(60)));
        gate.wait_started();
        shared.lock().set_clock(SimTime(240));
        gate.release.send(()).unwrap();
        assert!(coord.wait_idle(WAIT));

        let book = shared.lock();
        let plan = &book.plans[&V1];
        assert_eq!(plan.start, SimTime(240));
        // 10 cells × 72 s, then a 15 min serve.
        assert_eq!(plan.actions[0].start, SimTime(240));
        assert_eq!(plan.actions[0].end, SimTime(240 + 720));
        assert_eq!(plan.end_time(), SimTime(240 + 720 + 900));
    }

    #[test]
    fn drop_cancels_a_running_optimization() {
        let (optimizer, gate) = gate();
        let (coord, _shared) = spawn(optimizer);
        assert!(coord.trigger(snapshot_at(0)));
        gate.wait_started();
        // Never released: dropping must cancel and join without hanging.
        drop(coord);
        assert_eq!(gate.calls(), 1);
    }
}

// ── Orchestrator ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod orchestrator {
    use std::time::Duration;

    use gd_core::time::HOUR;
    use gd_core::{BlockageId, GdError, Position, SimConfig, SimTime, VehicleStatus};
    use gd_spatial::Blockage;
    use gd_world::{IncidentKind, MaintenanceWindow};

    use super::helpers::*;
    use crate::{Event, EventKind, NoopObserver, SimBuilder, SimError, SimObserver, StaticSource};

    #[derive(Default)]
    struct Recorder {
        labels: Vec<&'static str>,
        ticks: usize,
        snapshots: usize,
    }

    impl SimObserver for Recorder {
        fn on_event(&mut self, event: &Event) {
            self.labels.push(event.kind.label());
        }

        fn on_tick_end(&mut self, _: &crate::TickReport) {
            self.ticks += 1;
        }

        fn on_snapshot(&mut self, _: SimTime, _: &gd_world::WorldState, _: &crate::PlanTable) {
            self.snapshots += 1;
        }
    }

    #[test]
    fn rejects_bad_configuration() {
        let zero_tick = SimConfig { tick_secs: 0, ..config() };
        let err = SimBuilder::new(zero_tick, router()).depot(plant()).build(no_routes).err().unwrap();
        assert!(matches!(err, SimError::Core(GdError::Config(_))));

        let zero_replan = SimConfig { replan_interval_secs: -5, ..config() };
        let err = SimBuilder::new(zero_replan, router()).depot(plant()).build(no_routes).err().unwrap();
        assert!(matches!(err, SimError::Core(GdError::Config(_))));

        let err = SimBuilder::new(config(), router()).depot(tank()).build(no_routes).err().unwrap();
        assert!(matches!(err, SimError::NoMainDepot));
    }

    #[test]
    fn end_to_end_delivery() {
        let mut sim = builder().vehicle(truck(V1, 0, 0)).order(order_at(SimTime::ZERO)).build(deliver_all).unwrap();

        let first = step(&mut sim, 1);
        assert_eq!(first[0].events, 1);
        assert!(first[0].replan_triggered);
        assert_eq!(sim.plan_generation(), 1);
        assert_eq!(sim.plan(V1).unwrap().start, SimTime(60));

        // Drive 60..780, serve 780..1680.
        let reports = step_until(&mut sim, SimTime(1680));
        let delivered: f64 = reports.iter().map(|r| r.delivered_m3()).sum();
        assert_eq!(delivered, 10.0);
        assert!(sim.orders().next().is_none());
        assert_eq!(sim.world().completed_orders().len(), 1);
        assert_eq!(sim.world().completed_orders()[0].remaining_m3(), 0.0);
        let v = sim.world().vehicle(V1).unwrap();
        assert_eq!(v.glp_m3(), 10.0);
        assert_eq!(v.position, Position::new(5, 5));
    }

    #[test]
    fn idle_vehicle_drives_home() {
        let mut sim = builder().vehicle(truck(V1, 3, 0)).build(no_routes).unwrap();
        let r = step(&mut sim, 1);
        assert_eq!(r[0].return_plans, 1);
        let plan = sim.plan(V1).unwrap();
        assert_eq!(plan.final_position(), Some(Position::new(0, 0)));

        // 3 cells × 72 s from t = 60.
        step_until(&mut sim, SimTime(60 + 216 + 60));
        let v = sim.world().vehicle(V1).unwrap();
        assert_eq!(v.position, Position::new(0, 0));
        assert_eq!(v.status, VehicleStatus::Available);
        assert!(sim.plan(V1).is_none());
    }

    #[test]
    fn day_rollover_refills_once_and_reschedules() {
        let mut low_tank = tank();
        low_tank.withdraw(100.0);
        let start = SimTime::from_dhm(0, 23, 0);
        let mut sim = SimBuilder::new(SimConfig { start, ..config() }, router())
            .depot(plant())
            .depot(low_tank)
            .build(no_routes)
            .unwrap();
        assert_eq!(sim.world().depot(TANK).unwrap().glp_m3(), 60.0);

        let mut rec = Recorder::default();
        sim.run_until(SimTime::from_dhm(1, 1, 0), &mut rec);
        assert!(sim.wait_for_replan(Duration::from_secs(5)));

        assert_eq!(rec.labels.iter().filter(|l| **l == "NEW_DAY").count(), 1);
        assert_eq!(rec.ticks, 120);
        assert_eq!(sim.world().depot(TANK).unwrap().glp_m3(), 160.0);
        let pending: Vec<SimTime> =
            sim.events().iter().filter(|e| e.kind == EventKind::NewDay).map(|e| e.at).collect();
        assert_eq!(pending, vec![SimTime::from_dhm(2, 0, 0)]);
    }

    #[test]
    fn breakdown_freezes_vehicle_until_available() {
        let mut sim = builder()
            .vehicle(truck(V1, 5, 5))
            .event(Event::breakdown(SimTime(60), V1, IncidentKind::Type1))
            .build(no_routes)
            .unwrap();

        step(&mut sim, 2);
        let v = sim.world().vehicle(V1).unwrap();
        assert_eq!(v.status, VehicleStatus::Incident);
        assert_eq!(v.position, Position::new(5, 5));
        assert!(sim.plan(V1).is_none());
        assert_eq!(
            sim.events().count_where(|e| e.kind == EventKind::BreakdownEnd { vehicle: V1 }),
            1
        );

        step_until(&mut sim, SimTime(60 + 2 * HOUR - 60));
        assert_eq!(sim.world().vehicle(V1).unwrap().status, VehicleStatus::Incident);
        assert!(sim.plan(V1).is_none());

        step_until(&mut sim, SimTime(60 + 2 * HOUR + 60));
        let v = sim.world().vehicle(V1).unwrap();
        assert_eq!(v.status, VehicleStatus::Available);
        assert_eq!(v.position, Position::new(5, 5));
        assert!(sim.world().incident(V1).is_none());
    }

    #[test]
    fn workshop_breakdown_returns_vehicle_at_the_plant() {
        let mut sim = builder()
            .vehicle(truck(V1, 5, 5))
            .event(Event::breakdown(SimTime(60), V1, IncidentKind::Type2))
            .build(no_routes)
            .unwrap();

        // Type 2 during T1 comes back at the start of T3 the same day.
        step_until(&mut sim, SimTime::from_dhm(0, 16, 0));
        assert_eq!(sim.world().vehicle(V1).unwrap().status, VehicleStatus::Incident);
        step_until(&mut sim, SimTime::from_dhm(0, 16, 2));
        let v = sim.world().vehicle(V1).unwrap();
        assert_eq!(v.status, VehicleStatus::Available);
        assert_eq!(v.position, Position::new(0, 0));
    }

    #[test]
    fn maintenance_window_takes_vehicle_out() {
        let mut sim = builder()
            .vehicle(truck(V1, 5, 5))
            .maintenance(MaintenanceWindow::new(V1, SimTime(120), SimTime(3600)))
            .build(no_routes)
            .unwrap();

        step(&mut sim, 3);
        assert_eq!(sim.world().vehicle(V1).unwrap().status, VehicleStatus::Maintenance);
        assert!(sim.plan(V1).is_none());

        step_until(&mut sim, SimTime(3600));
        assert_eq!(sim.world().vehicle(V1).unwrap().status, VehicleStatus::Maintenance);
        step(&mut sim, 1);
        assert_eq!(sim.world().vehicle(V1).unwrap().status, VehicleStatus::Available);
        assert!(sim.world().maintenance_windows().is_empty());
    }

    #[test]
    fn maintenance_during_a_replan_survives_its_result() {
        let (optimizer, gate) = gate_with(all_to_plant);
        let mut sim = builder()
            .vehicle(truck(V1, 10, 10))
            .maintenance(MaintenanceWindow::new(V1, SimTime(180), SimTime(7200)))
            .build(optimizer)
            .unwrap();

        // Snapshot at t = 60 still has V1 in service.
        sim.request_replan();
        assert!(sim.advance_tick(&mut NoopObserver).replan_triggered);
        gate.wait_started();
        for _ in 0..3 {
            sim.advance_tick(&mut NoopObserver);
        }
        let v = sim.world().vehicle(V1).unwrap();
        assert_eq!(v.status, VehicleStatus::Maintenance);
        let parked = v.position;

        drop(gate.release);
        assert!(sim.wait_for_replan(Duration::from_secs(5)));
        assert!(sim.plan(V1).is_none());

        step(&mut sim, 5);
        let v = sim.world().vehicle(V1).unwrap();
        assert_eq!(v.status, VehicleStatus::Maintenance);
        assert_eq!(v.position, parked);
        assert!(sim.plan(V1).is_none());

        // The window still ends on time.
        step_until(&mut sim, SimTime(7200 + 60));
        assert_ne!(sim.world().vehicle(V1).unwrap().status, VehicleStatus::Maintenance);
    }

    #[test]
    fn breakdown_during_a_replan_keeps_the_vehicle_where_it_stopped() {
        let (optimizer, gate) = gate_with(all_to_plant);
        let mut sim = builder()
            .vehicle(truck(V1, 5, 5))
            .event(Event::breakdown(SimTime(180), V1, IncidentKind::Type1))
            .build(optimizer)
            .unwrap();

        sim.request_replan();
        assert!(sim.advance_tick(&mut NoopObserver).replan_triggered);
        gate.wait_started();
        for _ in 0..3 {
            sim.advance_tick(&mut NoopObserver);
        }
        let v = sim.world().vehicle(V1).unwrap();
        assert_eq!(v.status, VehicleStatus::Incident);
        let stranded = v.position;

        drop(gate.release);
        assert!(sim.wait_for_replan(Duration::from_secs(5)));
        assert!(sim.plan(V1).is_none());

        // Interval replans during the incident see it out of service too.
        step_until(&mut sim, SimTime(180 + 2 * HOUR));
        assert_eq!(sim.world().vehicle(V1).unwrap().status, VehicleStatus::Incident);
        assert!(sim.plan(V1).is_none());

        // Back in service where it broke down, not somewhere along an old path.
        step_until(&mut sim, SimTime(180 + 2 * HOUR + 60));
        let v = sim.world().vehicle(V1).unwrap();
        assert_eq!(v.status, VehicleStatus::Available);
        assert_eq!(v.position, stranded);
    }

    #[test]
    fn blockage_lifecycle() {
        let wall =
            Blockage::new(BlockageId(1), SimTime(120), SimTime(600), vec![Position::new(3, 0), Position::new(3, 5)])
                .unwrap();
        let mut sim = builder().blockage(wall.clone()).build(no_routes).unwrap();

        step(&mut sim, 2);
        assert_eq!(sim.active_blockages().count(), 0);
        step(&mut sim, 1);
        assert_eq!(sim.active_blockages().count(), 1);
        assert!(sim.world().is_blocked(Position::new(3, 2), SimTime(150)));

        step_until(&mut sim, SimTime(660));
        assert!(sim.world().blockages().is_empty());
        assert!(sim.scheduled_blockages.is_empty());
        assert!(!sim.push_event(Event::blockage_start(wall)));
    }

    #[test]
    fn polling_merges_new_events_once() {
        let start = SimTime::from_dhm(0, 8, 0);
        let active =
            Blockage::new(BlockageId(1), SimTime::ZERO, SimTime::from_dhm(0, 12, 0), vec![Position::new(3, 0)])
                .unwrap();
        let expired =
            Blockage::new(BlockageId(2), SimTime::ZERO, SimTime::from_dhm(0, 1, 0), vec![Position::new(4, 0)])
                .unwrap();
        let source = StaticSource::default()
            .with_order(order_at(SimTime::from_dhm(0, 10, 0)))
            .with_order(gd_world::Order::with_window_hours(
                gd_core::OrderId(2),
                Position::new(1, 1),
                SimTime::from_dhm(1, 10, 0),
                4,
                5.0,
            ))
            .with_blockage(active)
            .with_blockage(expired);
        let mut sim = SimBuilder::new(SimConfig { start, ..config() }, router())
            .depot(plant())
            .source(source)
            .build(no_routes)
            .unwrap();

        let r = step(&mut sim, 1);
        // Today's order and the still-active blockage.
        assert_eq!(r[0].merged, 2);
        assert!(sim.needs_replan() || r[0].replan_triggered);

        // Still-active blockage takes effect on the next tick.
        step(&mut sim, 1);
        assert_eq!(sim.world().blockages().len(), 1);

        let r = step(&mut sim, 59);
        assert_eq!(r.last().unwrap().merged, 0);
        assert!(sim.world().order(O1).is_none());

        step_until(&mut sim, SimTime::from_dhm(0, 10, 1));
        assert!(sim.world().order(O1).is_some());

        // Midnight triggers a poll for the new day.
        step_until(&mut sim, SimTime::from_dhm(1, 0, 2));
        assert_eq!(
            sim.events().count_where(|e| matches!(&e.kind, EventKind::OrderArrival(o) if o.id.0 == 2)),
            1
        );
    }

    #[test]
    fn pushed_events_respect_merge_rules() {
        let mut sim = builder().vehicle(truck(V1, 0, 0)).build(no_routes).unwrap();
        step(&mut sim, 10);

        assert!(!sim.push_event(Event::order_arrival(order_at(SimTime::ZERO))));
        assert!(sim.push_event(Event::order_arrival(order_at(SimTime(700)))));
        assert!(!sim.push_event(Event::order_arrival(order_at(SimTime(900)))));
        step(&mut sim, 2);
        assert!(sim.world().knows_order(O1));
        assert!(sim.scheduled_orders.is_empty());
        assert!(!sim.push_event(Event::order_arrival(order_at(SimTime(1000)))));
    }

    #[test]
    fn replans_on_interval() {
        let mut sim = builder().vehicle(truck(V1, 0, 0)).build(no_routes).unwrap();
        let reports = step(&mut sim, 61);
        let replans: Vec<u64> = reports.iter().filter(|r| r.replan_triggered).map(|r| r.tick).collect();
        // Interval is 30 min with 1 min ticks.
        assert_eq!(replans, vec![29, 59]);
    }

    #[test]
    fn trigger_while_busy_is_dropped_and_retried() {
        let (optimizer, gate) = gate();
        let mut sim = builder().vehicle(truck(V1, 0, 0)).build(optimizer).unwrap();

        sim.request_replan();
        assert!(sim.advance_tick(&mut NoopObserver).replan_triggered);
        gate.wait_started();

        sim.request_replan();
        let r = sim.advance_tick(&mut NoopObserver);
        assert!(!r.replan_triggered);
        assert!(sim.needs_replan());
        assert!(sim.is_replanning());
        assert_eq!(gate.calls(), 1);

        gate.release.send(()).unwrap();
        assert!(sim.wait_for_replan(Duration::from_secs(5)));
        assert!(sim.advance_tick(&mut NoopObserver).replan_triggered);
        gate.wait_started();
        assert_eq!(gate.calls(), 2);
        gate.release.send(()).unwrap();
        assert!(sim.wait_for_replan(Duration::from_secs(5)));
    }

    #[test]
    fn snapshot_hook_fires_on_interval() {
        let mut sim = SimBuilder::new(SimConfig { snapshot_interval_ticks: 5, ..config() }, router())
            .depot(plant())
            .build(no_routes)
            .unwrap();
        let mut rec = Recorder::default();
        let summary = sim.run_ticks(20, &mut rec);
        assert_eq!(summary.ticks, 20);
        assert_eq!(rec.snapshots, 4);
    }
}

// ── Registry ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod registry {
    use gd_core::SimulationId;
    use gd_spatial::TimeDependentRouter;

    use super::helpers::*;
    use crate::{NoopObserver, SimError, SimRegistry};

    #[test]
    fn create_get_remove() {
        let mut reg: SimRegistry<TimeDependentRouter> = SimRegistry::new();
        let a = reg.create(builder(), no_routes).unwrap();
        let b = reg.create(builder(), no_routes).unwrap();
        assert_ne!(a, b);
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.get(a).unwrap().id(), a);

        reg.get_mut(b).unwrap().run_ticks(3, &mut NoopObserver);
        assert_eq!(reg.get(b).unwrap().tick_count(), 3);

        reg.remove(a).unwrap();
        assert!(matches!(reg.get(a), Err(SimError::UnknownSimulation(id)) if id == a));
        assert!(matches!(reg.remove(SimulationId(99)), Err(SimError::UnknownSimulation(_))));
        assert_eq!(reg.ids().collect::<Vec<_>>(), vec![b]);
    }
}
