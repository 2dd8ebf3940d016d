//! Fluent builder for constructing an [`Orchestrator`].

use std::sync::Arc;

use gd_core::{SimClock, SimConfig, SimulationId};
use gd_exec::ExecutionEngine;
use gd_spatial::{Blockage, Router};
use gd_world::{Depot, MaintenanceWindow, Order, Vehicle, WorldState};
use rustc_hash::FxHashSet;
use tracing::info;

use crate::{
    Event, EventQueue, EventSource, NoSource, Optimizer, Orchestrator, ReplanCoordinator, SharedPlans,
    SimError, SimResult,
};

/// Fluent builder for [`Orchestrator<R>`].
///
/// # Required inputs
///
/// - [`SimConfig`]: start time, tick length, replanning cadence and grid
/// - `R: Router`, the path finder (e.g. [`gd_spatial::TimeDependentRouter`])
/// - at least one depot, exactly one of them the main plant
/// - an [`Optimizer`], passed to [`build`][Self::build]
///
/// # Optional inputs (have defaults)
///
/// | Method           | Default                 |
/// |------------------|-------------------------|
/// | `.id(i)`         | `SimulationId(0)`       |
/// | `.vehicle(v)`    | no vehicles             |
/// | `.order(o)`      | no initial orders       |
/// | `.blockage(b)`   | no initial blockages    |
/// | `.maintenance(w)`| no maintenance windows  |
/// | `.event(e)`      | no extra events         |
/// | `.source(s)`     | [`NoSource`]            |
///
/// # Example
///
/// ```rust,ignore
/// let router = TimeDependentRouter::from_config(&config);
/// let mut sim = SimBuilder::new(config, router)
///     .depot(Depot::main(DepotId(0), "plant", Position::new(12, 8), 10_000.0))
///     .vehicle(Vehicle::new(VehicleId(1), VehicleType::TA, Position::new(12, 8)))
///     .source(StaticSource::new(orders, blockages))
///     .build(MyOptimizer)?;
/// sim.run_ticks(1_440, &mut NoopObserver);
/// ```
pub struct SimBuilder<R: Router> {
    config:      SimConfig,
    router:      R,
    id:          SimulationId,
    vehicles:    Vec<Vehicle>,
    depots:      Vec<Depot>,
    orders:      Vec<Order>,
    blockages:   Vec<Blockage>,
    maintenance: Vec<MaintenanceWindow>,
    events:      Vec<Event>,
    source:      Option<Box<dyn EventSource>>,
}

impl<R: Router> SimBuilder<R> {
    pub fn new(config: SimConfig, router: R) -> Self {
        Self {
            config,
            router,
            id:          SimulationId(0),
            vehicles:    Vec::new(),
            depots:      Vec::new(),
            orders:      Vec::new(),
            blockages:   Vec::new(),
            maintenance: Vec::new(),
            events:      Vec::new(),
            source:      None,
        }
    }

    pub fn id(mut self, id: SimulationId) -> Self {
        self.id = id;
        self
    }

    pub fn vehicle(mut self, vehicle: Vehicle) -> Self {
        self.vehicles.push(vehicle);
        self
    }

    pub fn vehicles(mut self, vehicles: impl IntoIterator<Item = Vehicle>) -> Self {
        self.vehicles.extend(vehicles);
        self
    }

    pub fn depot(mut self, depot: Depot) -> Self {
        self.depots.push(depot);
        self
    }

    /// An order known up front.  Orders that arrived before the start time
    /// show up on the first tick.
    pub fn order(mut self, order: Order) -> Self {
        self.orders.push(order);
        self
    }

    pub fn blockage(mut self, blockage: Blockage) -> Self {
        self.blockages.push(blockage);
        self
    }

    /// A planned maintenance window; schedules its start and end events.
    pub fn maintenance(mut self, window: MaintenanceWindow) -> Self {
        self.maintenance.push(window);
        self
    }

    /// Any other pre-scheduled event (e.g. a scripted breakdown).
    pub fn event(mut self, event: Event) -> Self {
        self.events.push(event);
        self
    }

    pub fn source(mut self, source: impl EventSource + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Validate inputs, populate the world, schedule the initial events,
    /// start the replanning worker and return a ready-to-run
    /// [`Orchestrator`].
    pub fn build<O: Optimizer>(self, optimizer: O) -> SimResult<Orchestrator<R>> {
        self.config.validate()?;
        if self.router.secs_per_cell() <= 0 {
            return Err(SimError::Config("router must take a positive time per cell".into()));
        }
        let start = self.config.start;

        // ── World ─────────────────────────────────────────────────────────
        let mut world = WorldState::new(self.config.grid, start);
        for depot in self.depots {
            world.add_depot(depot)?;
        }
        if world.main_depot().is_none() {
            return Err(SimError::NoMainDepot);
        }
        for vehicle in self.vehicles {
            world.add_vehicle(vehicle)?;
        }
        for window in &self.maintenance {
            world.add_maintenance(window.clone());
        }

        // ── Replanning ────────────────────────────────────────────────────
        let router = Arc::new(self.router);
        let plans = Arc::new(SharedPlans::new());
        let coordinator =
            ReplanCoordinator::spawn(optimizer, Arc::clone(&router), self.config.ops.clone(), Arc::clone(&plans))?;

        let mut sim = Orchestrator {
            id:                  self.id,
            clock:               SimClock::new(start, self.config.tick_secs),
            config:              self.config,
            world,
            events:              EventQueue::new(),
            source:              self.source.unwrap_or_else(|| Box::new(NoSource) as Box<dyn EventSource>),
            router,
            engine:              ExecutionEngine::new(),
            plans,
            coordinator,
            dirty:               false,
            poll_due:            false,
            ticks:               0,
            last_replan:         start,
            scheduled_orders:    FxHashSet::default(),
            scheduled_blockages: FxHashSet::default(),
        };

        // ── Initial events ────────────────────────────────────────────────
        sim.events.push(Event::new_day(start.next_midnight()));
        for order in self.orders {
            let at = order.arrival.max(start);
            sim.schedule(Event::new(at, crate::EventKind::OrderArrival(order)));
        }
        for blockage in self.blockages {
            sim.schedule(Event::blockage_start(blockage));
        }
        for window in &self.maintenance {
            for event in Event::maintenance(window) {
                sim.events.push(event);
            }
        }
        for event in self.events {
            sim.schedule(event);
        }

        info!(
            sim      = %sim.id,
            start    = %start,
            vehicles = sim.world.vehicle_count(),
            pending  = sim.events.len(),
            "simulation built"
        );
        Ok(sim)
    }
}
