//! fleet_day — one simulated day of GLP deliveries.
//!
//! Eight trucks work out of the plant at (12, 8) with two auxiliary tanks
//! in the north-east and east.  Orders trickle in from a static feed, two
//! road works close streets for a few hours, one truck breaks down mid-
//! morning and another is in the shop after lunch.  Replanning uses the
//! greedy [`NearestOrder`] heuristic.
//!
//! Logs go to stderr (`RUST_LOG=debug` for per-tick detail); the final
//! summary and fleet state are printed to stdout as JSON.

mod optimizer;

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde_json::json;
use tracing::info;

use gd_core::{BlockageId, DepotId, OrderId, Position, SimConfig, SimTime, VehicleId};
use gd_sim::{Event, PlanTable, SimBuilder, SimObserver, StaticSource};
use gd_spatial::{Blockage, TimeDependentRouter};
use gd_world::{Depot, IncidentKind, MaintenanceWindow, Order, Vehicle, VehicleType, WorldState};

use optimizer::NearestOrder;

// ── Constants ─────────────────────────────────────────────────────────────────

const PLANT: DepotId = DepotId(0);
const PLANT_POS: Position = Position::new(12, 8);
const SNAPSHOT_EVERY_TICKS: u64 = 60;

/// `(hour, minute, x, y, m3, hours to deadline)`
const ORDERS: [(u32, u32, i32, i32, f64, i64); 14] = [
    (0, 30, 20, 15, 8.0, 6),
    (1, 10, 5, 30, 4.0, 8),
    (2, 0, 44, 12, 12.0, 10),
    (3, 45, 30, 40, 6.0, 6),
    (5, 5, 60, 5, 15.0, 12),
    (6, 20, 14, 22, 3.0, 4),
    (7, 0, 38, 33, 9.0, 6),
    (8, 40, 55, 47, 10.0, 12),
    (10, 15, 25, 4, 5.0, 5),
    (12, 0, 8, 45, 7.0, 8),
    (13, 30, 66, 20, 20.0, 14),
    (15, 10, 33, 18, 2.0, 4),
    (17, 45, 48, 28, 11.0, 8),
    (20, 0, 18, 36, 6.0, 10),
];

// ── Observer ──────────────────────────────────────────────────────────────────

#[derive(Default)]
struct DayLog {
    events: BTreeMap<&'static str, usize>,
    peak_busy: usize,
}

impl SimObserver for DayLog {
    fn on_event(&mut self, event: &Event) {
        *self.events.entry(event.kind.label()).or_default() += 1;
    }

    fn on_snapshot(&mut self, now: SimTime, world: &WorldState, plans: &PlanTable) {
        self.peak_busy = self.peak_busy.max(plans.len());
        info!(
            %now,
            busy     = plans.len(),
            open     = world.orders().count(),
            overdue  = world.overdue_orders(now).len(),
            blocked  = world.active_blockages(now).count(),
            "fleet status"
        );
    }
}

// ── Scenario ──────────────────────────────────────────────────────────────────

fn fleet() -> Vec<Vehicle> {
    let kinds = [
        VehicleType::TA,
        VehicleType::TA,
        VehicleType::TB,
        VehicleType::TB,
        VehicleType::TC,
        VehicleType::TC,
        VehicleType::TD,
        VehicleType::TD,
    ];
    kinds
        .into_iter()
        .zip(1..)
        .map(|(kind, id)| Vehicle::new(VehicleId(id), kind, PLANT_POS).with_glp(kind.profile().glp_capacity_m3))
        .collect()
}

fn feed() -> Result<StaticSource> {
    let orders = ORDERS
        .iter()
        .zip(1..)
        .map(|(&(h, m, x, y, m3, window), id)| {
            Order::with_window_hours(OrderId(id), Position::new(x, y), SimTime::from_dhm(0, h, m), window, m3)
        })
        .collect();

    let road_works = vec![
        Blockage::new(
            BlockageId(1),
            SimTime::from_dhm(0, 6, 0),
            SimTime::from_dhm(0, 11, 0),
            vec![Position::new(25, 0), Position::new(25, 30)],
        )?,
        Blockage::new(
            BlockageId(2),
            SimTime::from_dhm(0, 14, 0),
            SimTime::from_dhm(0, 18, 30),
            vec![Position::new(35, 25), Position::new(60, 25), Position::new(60, 35)],
        )?,
    ];
    Ok(StaticSource::new(orders, road_works))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = SimConfig { snapshot_interval_ticks: SNAPSHOT_EVERY_TICKS, ..SimConfig::default() };
    let end = config.start.next_midnight();
    let router = TimeDependentRouter::from_config(&config);

    let mut sim = SimBuilder::new(config, router)
        .depot(Depot::main(PLANT, "plant", PLANT_POS, 100_000.0))
        .depot(Depot::auxiliary(DepotId(1), "north-east", Position::new(42, 42), 160.0, false))
        .depot(Depot::auxiliary(DepotId(2), "east", Position::new(63, 3), 160.0, false))
        .vehicles(fleet())
        .maintenance(MaintenanceWindow::new(VehicleId(4), SimTime::from_dhm(0, 13, 0), SimTime::from_dhm(0, 17, 0)))
        .event(Event::breakdown(SimTime::from_dhm(0, 9, 30), VehicleId(2), IncidentKind::Type1))
        .source(feed()?)
        .build(NearestOrder { plant: PLANT })
        .context("building the simulation")?;

    let mut log = DayLog::default();
    let t0 = Instant::now();
    let summary = sim.run_until(end, &mut log);
    sim.wait_for_replan(Duration::from_secs(5));
    let elapsed = t0.elapsed();

    let world = sim.world();
    let vehicles: Vec<&Vehicle> = world.vehicles().collect();
    let open: Vec<&Order> = world.orders().collect();
    let out = json!({
        "simulated_until": sim.now().to_string(),
        "wall_clock_secs": elapsed.as_secs_f64(),
        "summary": summary,
        "events": log.events,
        "peak_busy_vehicles": log.peak_busy,
        "completed_orders": world.completed_orders().iter().map(|o| o.id.0).collect::<Vec<_>>(),
        "open_orders": open,
        "overdue_orders": sim.overdue_orders().iter().map(|o| o.0).collect::<Vec<_>>(),
        "fleet": vehicles,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
