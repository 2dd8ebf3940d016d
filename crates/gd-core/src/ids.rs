//! Strongly typed identifier wrappers.
//!
//! All IDs are `Copy + Ord + Hash` so they can key `BTreeMap`s and hash sets
//! without ceremony.  Distinct types keep a vehicle id from ever being passed
//! where an order id is expected.

use std::fmt;

/// Generate a typed ID wrapper around a `u32` with a short display prefix.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident => $prefix:literal;) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub u32);

        impl $name {
            #[inline(always)]
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            #[inline(always)]
            pub const fn raw(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }

        impl From<u32> for $name {
            #[inline(always)]
            fn from(raw: u32) -> Self {
                Self(raw)
            }
        }
    };
}

typed_id! {
    /// A fleet vehicle.
    pub struct VehicleId => "V";
}

typed_id! {
    /// A customer order.
    pub struct OrderId => "O";
}

typed_id! {
    /// A GLP depot (main plant or auxiliary tank).
    pub struct DepotId => "D";
}

typed_id! {
    /// A road blockage.
    pub struct BlockageId => "B";
}

typed_id! {
    /// A simulation held in a `SimRegistry`.
    pub struct SimulationId => "S";
}
