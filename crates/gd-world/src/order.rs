//! Customer orders and their delivery log.

use gd_core::{OrderId, Position, SimTime, VehicleId};

/// Remaining volumes below this are treated as fully delivered.
const VOLUME_EPSILON: f64 = 1e-9;

/// One discharge into an order.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeliveryRecord {
    pub vehicle: VehicleId,
    pub at: SimTime,
    pub volume_m3: f64,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Order {
    pub id: OrderId,
    pub position: Position,
    pub arrival: SimTime,
    pub deadline: SimTime,
    pub requested_m3: f64,
    remaining_m3: f64,
    deliveries: Vec<DeliveryRecord>,
}

impl Order {
    pub fn new(
        id: OrderId,
        position: Position,
        arrival: SimTime,
        deadline: SimTime,
        requested_m3: f64,
    ) -> Self {
        let requested_m3 = requested_m3.max(0.0);
        Self {
            id,
            position,
            arrival,
            deadline,
            requested_m3,
            remaining_m3: requested_m3,
            deliveries: Vec::new(),
        }
    }

    /// Convenience: deadline expressed as hours after arrival.
    pub fn with_window_hours(
        id: OrderId,
        position: Position,
        arrival: SimTime,
        hours: i64,
        requested_m3: f64,
    ) -> Self {
        Self::new(id, position, arrival, arrival + hours * gd_core::time::HOUR, requested_m3)
    }

    #[inline]
    pub fn remaining_m3(&self) -> f64 {
        self.remaining_m3
    }

    pub fn delivered_m3(&self) -> f64 {
        self.requested_m3 - self.remaining_m3
    }

    pub fn deliveries(&self) -> &[DeliveryRecord] {
        &self.deliveries
    }

    /// Apply a discharge of up to `volume`.  Returns the volume accepted,
    /// which never exceeds what is still outstanding.
    pub fn record_delivery(&mut self, vehicle: VehicleId, at: SimTime, volume: f64) -> f64 {
        let accepted = if volume.is_nan() { 0.0 } else { volume.clamp(0.0, self.remaining_m3) };
        if accepted <= 0.0 {
            return 0.0;
        }
        self.remaining_m3 -= accepted;
        if self.remaining_m3 < VOLUME_EPSILON {
            self.remaining_m3 = 0.0;
        }
        self.deliveries.push(DeliveryRecord { vehicle, at, volume_m3: accepted });
        accepted
    }

    #[inline]
    pub fn is_delivered(&self) -> bool {
        self.remaining_m3 <= 0.0
    }

    #[inline]
    pub fn is_overdue(&self, now: SimTime) -> bool {
        now > self.deadline && !self.is_delivered()
    }
}
