//! `WorldState` — the single source of truth for the live simulation.
//!
//! Entity tables are `BTreeMap`s keyed by typed id so every iteration order
//! (execution, fallback assignment, snapshots) is deterministic.  Orders are
//! kept in the active table until fully delivered, then moved to an archive;
//! their ids stay in `seen_orders` so a later poll of the event source cannot
//! re-introduce them.

use std::collections::BTreeMap;

use rustc_hash::FxHashSet;

use gd_core::{
    BlockageId, DepotId, GdError, GdResult, GridBounds, OrderId, Position, SimTime, VehicleId,
    VehicleStatus,
};
use gd_spatial::{Blockage, BlockageView};

use crate::{Depot, Incident, IncidentKind, MaintenanceWindow, Order, Vehicle, WorldError, WorldResult};

#[derive(Debug)]
pub struct WorldState {
    now: SimTime,
    bounds: GridBounds,
    main_depot: Option<DepotId>,
    vehicles: BTreeMap<VehicleId, Vehicle>,
    depots: BTreeMap<DepotId, Depot>,
    orders: BTreeMap<OrderId, Order>,
    completed: Vec<Order>,
    seen_orders: FxHashSet<OrderId>,
    blockages: Vec<Blockage>,
    incidents: BTreeMap<VehicleId, Incident>,
    maintenance: Vec<MaintenanceWindow>,
}

impl WorldState {
    pub fn new(bounds: GridBounds, now: SimTime) -> Self {
        Self {
            now,
            bounds,
            main_depot: None,
            vehicles: BTreeMap::new(),
            depots: BTreeMap::new(),
            orders: BTreeMap::new(),
            completed: Vec::new(),
            seen_orders: FxHashSet::default(),
            blockages: Vec::new(),
            incidents: BTreeMap::new(),
            maintenance: Vec::new(),
        }
    }

    // ── Clock ─────────────────────────────────────────────────────────────

    #[inline]
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Commit a new current instant.  Only the orchestrator calls this.
    pub fn set_now(&mut self, now: SimTime) {
        self.now = now;
    }

    #[inline]
    pub fn bounds(&self) -> GridBounds {
        self.bounds
    }

    // ── Registration ──────────────────────────────────────────────────────

    pub fn add_vehicle(&mut self, vehicle: Vehicle) -> WorldResult<()> {
        self.check_in_bounds("vehicle", vehicle.position)?;
        if self.vehicles.contains_key(&vehicle.id) {
            return Err(WorldError::Duplicate { what: "vehicle", id: vehicle.id.0 });
        }
        self.vehicles.insert(vehicle.id, vehicle);
        Ok(())
    }

    pub fn add_depot(&mut self, depot: Depot) -> WorldResult<()> {
        self.check_in_bounds("depot", depot.position)?;
        if self.depots.contains_key(&depot.id) {
            return Err(WorldError::Duplicate { what: "depot", id: depot.id.0 });
        }
        if depot.is_main() {
            if let Some(existing) = self.main_depot {
                return Err(WorldError::SecondMainDepot(existing));
            }
            self.main_depot = Some(depot.id);
        }
        self.depots.insert(depot.id, depot);
        Ok(())
    }

    /// Add an order to the active queue.  Returns `false` (and changes
    /// nothing) if the id was ever seen before.
    pub fn add_order(&mut self, order: Order) -> bool {
        if !self.seen_orders.insert(order.id) {
            return false;
        }
        self.orders.insert(order.id, order);
        true
    }

    /// Returns `false` if a blockage with the same id is already active.
    pub fn add_blockage(&mut self, blockage: Blockage) -> bool {
        if self.knows_blockage(blockage.id) {
            return false;
        }
        self.blockages.push(blockage);
        true
    }

    pub fn remove_blockage(&mut self, id: BlockageId) -> Option<Blockage> {
        let idx = self.blockages.iter().position(|b| b.id == id)?;
        Some(self.blockages.remove(idx))
    }

    /// Drop every blockage whose window has closed by `now`.
    pub fn prune_expired_blockages(&mut self, now: SimTime) -> usize {
        let before = self.blockages.len();
        self.blockages.retain(|b| !b.is_expired_at(now));
        before - self.blockages.len()
    }

    pub fn add_maintenance(&mut self, window: MaintenanceWindow) {
        self.maintenance.push(window);
    }

    /// Forget maintenance windows that ended by `now`.
    pub fn prune_finished_maintenance(&mut self, now: SimTime) -> usize {
        let before = self.maintenance.len();
        self.maintenance.retain(|m| m.end > now);
        before - self.maintenance.len()
    }

    fn check_in_bounds(&self, what: &'static str, pos: Position) -> WorldResult<()> {
        if self.bounds.contains(pos) {
            Ok(())
        } else {
            Err(WorldError::OutOfBounds { what, pos })
        }
    }

    // ── Read-only queries ─────────────────────────────────────────────────

    pub fn vehicle(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(&id)
    }

    pub fn vehicle_mut(&mut self, id: VehicleId) -> Option<&mut Vehicle> {
        self.vehicles.get_mut(&id)
    }

    pub fn vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.values()
    }

    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    pub fn depot(&self, id: DepotId) -> Option<&Depot> {
        self.depots.get(&id)
    }

    pub fn depots(&self) -> impl Iterator<Item = &Depot> {
        self.depots.values()
    }

    pub fn main_depot(&self) -> Option<&Depot> {
        self.main_depot.and_then(|id| self.depots.get(&id))
    }

    pub fn order(&self, id: OrderId) -> Option<&Order> {
        self.orders.get(&id)
    }

    pub fn order_mut(&mut self, id: OrderId) -> Option<&mut Order> {
        self.orders.get_mut(&id)
    }

    /// Active (not yet fully delivered) orders.
    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.values()
    }

    pub fn completed_orders(&self) -> &[Order] {
        &self.completed
    }

    /// Ids of active orders past their deadline at `now`.
    pub fn overdue_orders(&self, now: SimTime) -> Vec<OrderId> {
        self.orders
            .values()
            .filter(|o| o.is_overdue(now))
            .map(|o| o.id)
            .collect()
    }

    pub fn knows_order(&self, id: OrderId) -> bool {
        self.seen_orders.contains(&id)
    }

    pub fn knows_blockage(&self, id: BlockageId) -> bool {
        self.blockages.iter().any(|b| b.id == id)
    }

    /// Every registered blockage, active or not yet started.
    pub fn blockages(&self) -> &[Blockage] {
        &self.blockages
    }

    pub fn active_blockages(&self, at: SimTime) -> impl Iterator<Item = &Blockage> {
        self.blockages.iter().filter(move |b| b.is_active_at(at))
    }

    pub fn is_blocked(&self, p: Position, at: SimTime) -> bool {
        self.blockages.is_blocked(p, at)
    }

    pub fn incident(&self, vehicle: VehicleId) -> Option<&Incident> {
        self.incidents.get(&vehicle)
    }

    pub fn incidents(&self) -> impl Iterator<Item = &Incident> {
        self.incidents.values()
    }

    pub fn maintenance_windows(&self) -> &[MaintenanceWindow] {
        &self.maintenance
    }

    // ── Split borrows for the execution engine ────────────────────────────

    /// Disjoint mutable access to a vehicle and an order.
    pub fn vehicle_and_order_mut(
        &mut self,
        vehicle: VehicleId,
        order: OrderId,
    ) -> (Option<&mut Vehicle>, Option<&mut Order>) {
        (self.vehicles.get_mut(&vehicle), self.orders.get_mut(&order))
    }

    /// Disjoint mutable access to a vehicle and a depot.
    pub fn vehicle_and_depot_mut(
        &mut self,
        vehicle: VehicleId,
        depot: DepotId,
    ) -> (Option<&mut Vehicle>, Option<&mut Depot>) {
        (self.vehicles.get_mut(&vehicle), self.depots.get_mut(&depot))
    }

    // ── Mutations driven by events ────────────────────────────────────────

    /// Move fully delivered orders from the active table to the archive.
    pub fn prune_delivered_orders(&mut self) -> Vec<OrderId> {
        let done: Vec<OrderId> = self
            .orders
            .values()
            .filter(|o| o.is_delivered())
            .map(|o| o.id)
            .collect();
        for id in &done {
            if let Some(order) = self.orders.remove(id) {
                self.completed.push(order);
            }
        }
        done
    }

    /// Top up every auxiliary depot.  Returns how many were refilled.
    pub fn refill_auxiliary_depots(&mut self) -> usize {
        let mut refilled = 0;
        for depot in self.depots.values_mut().filter(|d| !d.is_main()) {
            depot.refill();
            refilled += 1;
        }
        refilled
    }

    pub fn set_status(&mut self, vehicle: VehicleId, status: VehicleStatus) -> GdResult<()> {
        let v = self
            .vehicles
            .get_mut(&vehicle)
            .ok_or(GdError::VehicleNotFound(vehicle))?;
        v.status = status;
        Ok(())
    }

    /// Put `vehicle` out of service for a breakdown of `kind` at `at`.
    pub fn begin_incident(
        &mut self,
        vehicle: VehicleId,
        kind: IncidentKind,
        at: SimTime,
    ) -> GdResult<Incident> {
        let v = self
            .vehicles
            .get_mut(&vehicle)
            .ok_or(GdError::VehicleNotFound(vehicle))?;
        v.status = VehicleStatus::Incident;
        let incident = Incident::new(vehicle, kind, at, v.position);
        self.incidents.insert(vehicle, incident.clone());
        Ok(incident)
    }

    /// Return `vehicle` to service.  Vehicles that went to the workshop
    /// reappear at the main depot.  Returns the closed incident, if any.
    pub fn end_incident(&mut self, vehicle: VehicleId) -> GdResult<Option<Incident>> {
        let workshop = self.main_depot().map(|d| d.position);
        let v = self
            .vehicles
            .get_mut(&vehicle)
            .ok_or(GdError::VehicleNotFound(vehicle))?;
        let incident = self.incidents.remove(&vehicle);
        if v.status == VehicleStatus::Incident {
            v.status = VehicleStatus::Available;
        }
        if let (Some(inc), Some(pos)) = (&incident, workshop) {
            if inc.needs_workshop {
                v.position = pos;
            }
        }
        Ok(incident)
    }

    pub fn begin_maintenance(&mut self, vehicle: VehicleId) -> GdResult<()> {
        self.set_status(vehicle, VehicleStatus::Maintenance)
    }

    /// Returns `true` if the vehicle was in maintenance and is now available.
    pub fn end_maintenance(&mut self, vehicle: VehicleId) -> GdResult<bool> {
        let v = self
            .vehicles
            .get_mut(&vehicle)
            .ok_or(GdError::VehicleNotFound(vehicle))?;
        if v.status == VehicleStatus::Maintenance {
            v.status = VehicleStatus::Available;
            return Ok(true);
        }
        Ok(false)
    }

    // ── Snapshot ──────────────────────────────────────────────────────────

    /// A structurally independent copy of the whole world.
    ///
    /// Every entity is a plain owned value, so copying field by field and
    /// rebuilding each collection yields a graph that shares nothing with
    /// `self`.
    pub fn snapshot(&self) -> WorldState {
        WorldState {
            now:         self.now,
            bounds:      self.bounds,
            main_depot:  self.main_depot,
            vehicles:    self.vehicles.iter().map(|(id, v)| (*id, v.clone())).collect(),
            depots:      self.depots.iter().map(|(id, d)| (*id, d.clone())).collect(),
            orders:      self.orders.iter().map(|(id, o)| (*id, o.clone())).collect(),
            completed:   self.completed.to_vec(),
            seen_orders: self.seen_orders.iter().copied().collect(),
            blockages:   self.blockages.to_vec(),
            incidents:   self.incidents.iter().map(|(id, i)| (*id, i.clone())).collect(),
            maintenance: self.maintenance.to_vec(),
        }
    }
}
