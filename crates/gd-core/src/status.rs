//! Vehicle status enum shared by the world model, executor and orchestrator.

/// What a vehicle is doing right now.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VehicleStatus {
    /// Idle and dispatchable (default state).
    #[default]
    Available,
    Driving,
    /// Taking GLP on at a depot.
    Loading,
    /// Discharging GLP to a customer.
    Serving,
    Refueling,
    /// Scheduled preventive maintenance; not dispatchable.
    Maintenance,
    /// Broken down; not dispatchable until the incident ends.
    Incident,
}

impl VehicleStatus {
    /// `false` while broken down or in maintenance.
    #[inline]
    pub fn is_operational(self) -> bool {
        !matches!(self, VehicleStatus::Maintenance | VehicleStatus::Incident)
    }

    /// Upper-case label, matching the names used by the transport layer.
    pub fn as_str(self) -> &'static str {
        match self {
            VehicleStatus::Available   => "AVAILABLE",
            VehicleStatus::Driving     => "DRIVING",
            VehicleStatus::Loading     => "LOADING",
            VehicleStatus::Serving     => "SERVING",
            VehicleStatus::Refueling   => "REFUELING",
            VehicleStatus::Maintenance => "MAINTENANCE",
            VehicleStatus::Incident    => "INCIDENT",
        }
    }
}

impl std::fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
