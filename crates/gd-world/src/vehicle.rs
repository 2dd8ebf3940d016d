//! Tanker trucks and their fuel model.
//!
//! # Fuel model
//!
//! ```text
//! weight_t = tare_t + glp_m3 × 0.5
//! fuel_gal = distance_km × weight_t / 180
//! ```
//!
//! GLP and fuel levels are clamped to `[0, capacity]` by every mutator, so no
//! sequence of actions can push them out of range.

use gd_core::{Position, VehicleId, VehicleStatus};

/// Tonnes per m³ of liquefied petroleum gas.
pub const GLP_DENSITY_T_PER_M3: f64 = 0.5;

/// Divisor of the km × tonne product that yields gallons burned.
pub const FUEL_DIVISOR: f64 = 180.0;

// ── VehicleType ───────────────────────────────────────────────────────────────

/// Capacity/weight profile shared by all trucks of one type.
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehicleProfile {
    pub glp_capacity_m3: f64,
    pub tare_t: f64,
    pub fuel_capacity_gal: f64,
}

/// The four truck classes of the fleet.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VehicleType {
    TA,
    TB,
    TC,
    TD,
}

impl VehicleType {
    pub const fn profile(self) -> VehicleProfile {
        match self {
            VehicleType::TA => VehicleProfile { glp_capacity_m3: 25.0, tare_t: 2.5, fuel_capacity_gal: 25.0 },
            VehicleType::TB => VehicleProfile { glp_capacity_m3: 15.0, tare_t: 2.0, fuel_capacity_gal: 25.0 },
            VehicleType::TC => VehicleProfile { glp_capacity_m3: 10.0, tare_t: 1.5, fuel_capacity_gal: 25.0 },
            VehicleType::TD => VehicleProfile { glp_capacity_m3: 5.0,  tare_t: 1.0, fuel_capacity_gal: 25.0 },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VehicleType::TA => "TA",
            VehicleType::TB => "TB",
            VehicleType::TC => "TC",
            VehicleType::TD => "TD",
        }
    }
}

/// Gallons burned driving `km` with `glp_m3` on board.
pub fn fuel_for_trip(profile: VehicleProfile, km: f64, glp_m3: f64) -> f64 {
    let weight = profile.tare_t + glp_m3.max(0.0) * GLP_DENSITY_T_PER_M3;
    km.max(0.0) * weight / FUEL_DIVISOR
}

// ── Vehicle ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vehicle {
    pub id: VehicleId,
    /// Fleet code such as `TA01`.
    pub code: String,
    pub kind: VehicleType,
    pub position: Position,
    glp_m3: f64,
    fuel_gal: f64,
    pub status: VehicleStatus,
}

impl Vehicle {
    /// A new, fully fuelled, empty vehicle.
    pub fn new(id: VehicleId, kind: VehicleType, position: Position) -> Self {
        Self {
            id,
            code: format!("{}{:02}", kind.as_str(), id.0),
            kind,
            position,
            glp_m3: 0.0,
            fuel_gal: kind.profile().fuel_capacity_gal,
            status: VehicleStatus::Available,
        }
    }

    /// Builder-style initial GLP (clamped).
    pub fn with_glp(mut self, glp_m3: f64) -> Self {
        self.set_glp(glp_m3);
        self
    }

    /// Builder-style initial fuel (clamped).
    pub fn with_fuel(mut self, fuel_gal: f64) -> Self {
        self.set_fuel(fuel_gal);
        self
    }

    #[inline]
    pub fn profile(&self) -> VehicleProfile {
        self.kind.profile()
    }

    #[inline]
    pub fn glp_m3(&self) -> f64 {
        self.glp_m3
    }

    #[inline]
    pub fn fuel_gal(&self) -> f64 {
        self.fuel_gal
    }

    pub fn glp_capacity(&self) -> f64 {
        self.profile().glp_capacity_m3
    }

    pub fn fuel_capacity(&self) -> f64 {
        self.profile().fuel_capacity_gal
    }

    pub fn free_glp_capacity(&self) -> f64 {
        (self.glp_capacity() - self.glp_m3).max(0.0)
    }

    /// Tare plus cargo, in tonnes.
    pub fn laden_weight_t(&self) -> f64 {
        self.profile().tare_t + self.glp_m3 * GLP_DENSITY_T_PER_M3
    }

    /// Fuel this vehicle would burn over `km` with its current load.
    pub fn fuel_for_km(&self, km: f64) -> f64 {
        fuel_for_trip(self.profile(), km, self.glp_m3)
    }

    pub fn set_glp(&mut self, glp_m3: f64) {
        self.glp_m3 = clamp_level(glp_m3, self.glp_capacity());
    }

    pub fn set_fuel(&mut self, fuel_gal: f64) {
        self.fuel_gal = clamp_level(fuel_gal, self.fuel_capacity());
    }

    /// Add up to `volume` of GLP; returns what actually fit.
    pub fn load_glp(&mut self, volume: f64) -> f64 {
        let moved = volume.max(0.0).min(self.free_glp_capacity());
        self.set_glp(self.glp_m3 + moved);
        moved
    }

    /// Remove up to `volume` of GLP; returns what was actually on board.
    pub fn unload_glp(&mut self, volume: f64) -> f64 {
        let moved = volume.max(0.0).min(self.glp_m3);
        self.set_glp(self.glp_m3 - moved);
        moved
    }

    /// Burn up to `gallons`; returns what was actually in the tank.
    pub fn burn_fuel(&mut self, gallons: f64) -> f64 {
        let burned = gallons.max(0.0).min(self.fuel_gal);
        self.set_fuel(self.fuel_gal - burned);
        burned
    }

    pub fn refuel_full(&mut self) {
        self.fuel_gal = self.fuel_capacity();
    }
}

/// Clamp to `[0, capacity]`, mapping NaN to 0.
fn clamp_level(value: f64, capacity: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, capacity) }
}
