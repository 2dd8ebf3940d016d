//! GLP depots.

use gd_core::{DepotId, Position};

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DepotKind {
    /// The plant.  Withdrawals never deplete it.
    Main,
    /// Finite intermediate tank, topped up once per simulated day.
    Auxiliary,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Depot {
    pub id: DepotId,
    pub name: String,
    pub kind: DepotKind,
    pub position: Position,
    pub capacity_m3: f64,
    glp_m3: f64,
    pub can_refuel: bool,
}

impl Depot {
    /// The main plant: full, refuels trucks.
    pub fn main(id: DepotId, name: impl Into<String>, position: Position, capacity_m3: f64) -> Self {
        let capacity_m3 = capacity_m3.max(0.0);
        Self {
            id,
            name: name.into(),
            kind: DepotKind::Main,
            position,
            capacity_m3,
            glp_m3: capacity_m3,
            can_refuel: true,
        }
    }

    /// An auxiliary tank, starting full.
    pub fn auxiliary(
        id: DepotId,
        name: impl Into<String>,
        position: Position,
        capacity_m3: f64,
        can_refuel: bool,
    ) -> Self {
        let capacity_m3 = capacity_m3.max(0.0);
        Self {
            id,
            name: name.into(),
            kind: DepotKind::Auxiliary,
            position,
            capacity_m3,
            glp_m3: capacity_m3,
            can_refuel,
        }
    }

    #[inline]
    pub fn glp_m3(&self) -> f64 {
        self.glp_m3
    }

    #[inline]
    pub fn is_main(&self) -> bool {
        self.kind == DepotKind::Main
    }

    /// Volume a vehicle could draw right now.
    pub fn available(&self) -> f64 {
        match self.kind {
            DepotKind::Main => f64::INFINITY,
            DepotKind::Auxiliary => self.glp_m3,
        }
    }

    /// Draw up to `volume`; returns what was actually handed out.
    pub fn withdraw(&mut self, volume: f64) -> f64 {
        let wanted = if volume.is_nan() { 0.0 } else { volume.max(0.0) };
        match self.kind {
            DepotKind::Main => wanted,
            DepotKind::Auxiliary => {
                let moved = wanted.min(self.glp_m3);
                self.glp_m3 = (self.glp_m3 - moved).clamp(0.0, self.capacity_m3);
                moved
            }
        }
    }

    pub fn refill(&mut self) {
        self.glp_m3 = self.capacity_m3;
    }
}
