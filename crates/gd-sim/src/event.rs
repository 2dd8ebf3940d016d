//! Timestamped world events and the queue that orders them.
//!
//! `EventQueue` is a `BTreeMap<SimTime, VecDeque<Event>>`: O(log T) push and
//! pop where T is the number of distinct pending timestamps.  Events sharing
//! a timestamp come out in the order they were pushed.

use std::collections::{BTreeMap, VecDeque};

use gd_core::{BlockageId, SimTime, VehicleId};
use gd_spatial::Blockage;
use gd_world::{IncidentKind, MaintenanceWindow, Order};

// ── Event ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventKind {
    OrderArrival(Order),
    BlockageStart(Blockage),
    BlockageEnd(BlockageId),
    Breakdown { vehicle: VehicleId, kind: IncidentKind },
    /// The vehicle is back in service after a breakdown.
    BreakdownEnd { vehicle: VehicleId },
    MaintenanceStart { vehicle: VehicleId },
    MaintenanceEnd { vehicle: VehicleId },
    /// Midnight: auxiliary depots are refilled and the next rollover is
    /// scheduled.
    NewDay,
}

impl EventKind {
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::OrderArrival(_)         => "ORDER_ARRIVAL",
            EventKind::BlockageStart(_)        => "BLOCKAGE_START",
            EventKind::BlockageEnd(_)          => "BLOCKAGE_END",
            EventKind::Breakdown { .. }        => "BREAKDOWN",
            EventKind::BreakdownEnd { .. }     => "BREAKDOWN_END",
            EventKind::MaintenanceStart { .. } => "MAINTENANCE_START",
            EventKind::MaintenanceEnd { .. }   => "MAINTENANCE_END",
            EventKind::NewDay                  => "NEW_DAY",
        }
    }

    /// Vehicle the event is about, if any.
    pub fn vehicle(&self) -> Option<VehicleId> {
        match self {
            EventKind::Breakdown { vehicle, .. }
            | EventKind::BreakdownEnd { vehicle }
            | EventKind::MaintenanceStart { vehicle }
            | EventKind::MaintenanceEnd { vehicle } => Some(*vehicle),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Event {
    pub at: SimTime,
    pub kind: EventKind,
}

impl Event {
    pub fn new(at: SimTime, kind: EventKind) -> Self {
        Self { at, kind }
    }

    /// The order shows up at its arrival time.
    pub fn order_arrival(order: Order) -> Self {
        Self::new(order.arrival, EventKind::OrderArrival(order))
    }

    /// The blockage starts at its window start.
    pub fn blockage_start(blockage: Blockage) -> Self {
        Self::new(blockage.start, EventKind::BlockageStart(blockage))
    }

    pub fn breakdown(at: SimTime, vehicle: VehicleId, kind: IncidentKind) -> Self {
        Self::new(at, EventKind::Breakdown { vehicle, kind })
    }

    pub fn new_day(at: SimTime) -> Self {
        Self::new(at, EventKind::NewDay)
    }

    /// Start and end events for a maintenance window.
    pub fn maintenance(window: &MaintenanceWindow) -> [Self; 2] {
        [
            Self::new(window.start, EventKind::MaintenanceStart { vehicle: window.vehicle }),
            Self::new(window.end, EventKind::MaintenanceEnd { vehicle: window.vehicle }),
        ]
    }
}

// ── EventQueue ────────────────────────────────────────────────────────────────

/// Min-priority queue of pending events keyed by timestamp.
#[derive(Clone, Debug, Default)]
pub struct EventQueue {
    inner: BTreeMap<SimTime, VecDeque<Event>>,
    total: usize,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: Event) {
        self.inner.entry(event.at).or_default().push_back(event);
        self.total += 1;
    }

    /// Remove and return the earliest event with `at < limit`.
    pub fn pop_before(&mut self, limit: SimTime) -> Option<Event> {
        let mut entry = self.inner.first_entry()?;
        if *entry.key() >= limit {
            return None;
        }
        let event = entry.get_mut().pop_front();
        if entry.get().is_empty() {
            entry.remove();
        }
        if event.is_some() {
            self.total -= 1;
        }
        event
    }

    /// Timestamp of the earliest pending event.
    pub fn next_time(&self) -> Option<SimTime> {
        self.inner.keys().next().copied()
    }

    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Pending events in processing order.
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.inner.values().flatten()
    }

    /// Pending events matching `pred`.
    pub fn count_where(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.iter().filter(|e| pred(e)).count()
    }
}
