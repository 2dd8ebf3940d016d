//! Engine-wide error type.
//!
//! Sub-crates define their own error enums and wrap `GdError` as one variant
//! via `#[from]`.

use thiserror::Error;

use crate::{DepotId, OrderId, VehicleId};

/// The common base error for all `gd-*` crates.
#[derive(Debug, Error)]
pub enum GdError {
    #[error("vehicle {0} not found")]
    VehicleNotFound(VehicleId),

    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    #[error("depot {0} not found")]
    DepotNotFound(DepotId),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for all `gd-*` crates.
pub type GdResult<T> = Result<T, GdError>;
