//! Spatial-subsystem error type.

use thiserror::Error;

use gd_core::BlockageId;

/// Errors produced by `gd-spatial`.
///
/// Routing itself never fails with an error (an unreachable target is an
/// empty path); these cover malformed blockage input.
#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("blockage {0} has no vertices")]
    EmptyPolyline(BlockageId),

    #[error("blockage {id} ends before it starts ({start} >= {end})")]
    EmptyWindow { id: BlockageId, start: i64, end: i64 },
}

pub type SpatialResult<T> = Result<T, SpatialError>;
