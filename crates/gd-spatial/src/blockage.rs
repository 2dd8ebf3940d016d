//! Time-bounded road blockages.
//!
//! A blockage closes every cell lying on its polyline for `[start, end)`.
//! Only axis-aligned segments close the cells between their endpoints; a
//! diagonal segment (malformed input) closes just its two vertices.

use gd_core::{BlockageId, Position, SimTime};

use crate::{SpatialError, SpatialResult};

/// A closed stretch of road.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Blockage {
    pub id: BlockageId,
    /// First instant the road is closed.
    pub start: SimTime,
    /// First instant the road is open again.
    pub end: SimTime,
    pub vertices: Vec<Position>,
}

impl Blockage {
    /// Validated constructor.
    pub fn new(
        id: BlockageId,
        start: SimTime,
        end: SimTime,
        vertices: Vec<Position>,
    ) -> SpatialResult<Self> {
        if vertices.is_empty() {
            return Err(SpatialError::EmptyPolyline(id));
        }
        if start >= end {
            return Err(SpatialError::EmptyWindow { id, start: start.0, end: end.0 });
        }
        Ok(Self { id, start, end, vertices })
    }

    #[inline]
    pub fn is_active_at(&self, t: SimTime) -> bool {
        self.start <= t && t < self.end
    }

    /// `true` once the blockage can never be active again.
    #[inline]
    pub fn is_expired_at(&self, t: SimTime) -> bool {
        t >= self.end
    }

    /// Whether `p` lies on the polyline, regardless of time.
    pub fn covers(&self, p: Position) -> bool {
        if self.vertices.len() == 1 {
            return self.vertices[0] == p;
        }
        self.vertices
            .windows(2)
            .any(|seg| on_segment(seg[0], seg[1], p))
    }

    #[inline]
    pub fn blocks(&self, p: Position, t: SimTime) -> bool {
        self.is_active_at(t) && self.covers(p)
    }
}

fn on_segment(a: Position, b: Position, p: Position) -> bool {
    if a.y == b.y {
        p.y == a.y && (a.x.min(b.x)..=a.x.max(b.x)).contains(&p.x)
    } else if a.x == b.x {
        p.x == a.x && (a.y.min(b.y)..=a.y.max(b.y)).contains(&p.y)
    } else {
        p == a || p == b
    }
}

/// Anything the router can ask "is this cell closed at that instant?".
///
/// Implemented for blockage slices so the router does not depend on the
/// world model.
pub trait BlockageView {
    fn is_blocked(&self, p: Position, at: SimTime) -> bool;
}

impl BlockageView for [Blockage] {
    fn is_blocked(&self, p: Position, at: SimTime) -> bool {
        self.iter().any(|b| b.blocks(p, at))
    }
}

impl BlockageView for Vec<Blockage> {
    fn is_blocked(&self, p: Position, at: SimTime) -> bool {
        self.as_slice().is_blocked(p, at)
    }
}
