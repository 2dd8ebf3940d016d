//! Breakdowns and preventive maintenance.
//!
//! Availability after a breakdown depends only on the incident kind and the
//! instant it happened, so it is a pure function ([`incident_times`]) rather
//! than behaviour attached to the kind.
//!
//! | Kind  | Immobilized | Then                 | Available again                         |
//! |-------|-------------|----------------------|-----------------------------------------|
//! | Type1 | 2 h         | continues in place   | occurrence + 2 h                        |
//! | Type2 | 2 h         | workshop             | start of the shift two shifts later     |
//! | Type3 | 4 h         | workshop             | 00:00 of occurrence day + 3             |

use gd_core::time::{DAY, HOUR};
use gd_core::{Position, Shift, SimTime, VehicleId};

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IncidentKind {
    Type1,
    Type2,
    Type3,
}

/// When a broken-down vehicle can move and when it can work again.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct IncidentTimes {
    pub immobilized_until: SimTime,
    pub available_at: SimTime,
    pub needs_workshop: bool,
}

pub fn incident_times(kind: IncidentKind, occurred_at: SimTime) -> IncidentTimes {
    match kind {
        IncidentKind::Type1 => IncidentTimes {
            immobilized_until: occurred_at + 2 * HOUR,
            available_at:      occurred_at + 2 * HOUR,
            needs_workshop:    false,
        },
        IncidentKind::Type2 => {
            let shift_start = Shift::of(occurred_at).start_on_day_of(occurred_at);
            IncidentTimes {
                immobilized_until: occurred_at + 2 * HOUR,
                available_at:      shift_start + 2 * Shift::LENGTH_SECS,
                needs_workshop:    true,
            }
        }
        IncidentKind::Type3 => IncidentTimes {
            immobilized_until: occurred_at + 4 * HOUR,
            available_at:      occurred_at.start_of_day() + 3 * DAY,
            needs_workshop:    true,
        },
    }
}

/// An active breakdown.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Incident {
    pub vehicle: VehicleId,
    pub kind: IncidentKind,
    pub occurred_at: SimTime,
    /// Where the vehicle broke down.
    pub position: Position,
    pub immobilized_until: SimTime,
    pub available_at: SimTime,
    pub needs_workshop: bool,
}

impl Incident {
    pub fn new(vehicle: VehicleId, kind: IncidentKind, occurred_at: SimTime, position: Position) -> Self {
        let times = incident_times(kind, occurred_at);
        Self {
            vehicle,
            kind,
            occurred_at,
            position,
            immobilized_until: times.immobilized_until,
            available_at:      times.available_at,
            needs_workshop:    times.needs_workshop,
        }
    }
}

/// A scheduled maintenance slot `[start, end)`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MaintenanceWindow {
    pub vehicle: VehicleId,
    pub start: SimTime,
    pub end: SimTime,
}

impl MaintenanceWindow {
    pub fn new(vehicle: VehicleId, start: SimTime, end: SimTime) -> Self {
        Self { vehicle, start, end }
    }

    /// A whole-day slot on `day`.
    pub fn full_day(vehicle: VehicleId, day: u32) -> Self {
        let start = SimTime::from_dhm(day, 0, 0);
        Self { vehicle, start, end: start + DAY }
    }

    #[inline]
    pub fn contains(&self, t: SimTime) -> bool {
        self.start <= t && t < self.end
    }
}
