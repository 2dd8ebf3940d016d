//! Integer grid positions.
//!
//! The city is a rectangular grid of 1 km cells.  Vehicles move only along
//! grid lines, so distance is always Manhattan distance.

use std::fmt;

/// A cell on the city grid.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance in cells.
    #[inline]
    pub fn manhattan(self, other: Position) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// The four orthogonal neighbours, in E, W, N, S order.
    #[inline]
    pub fn neighbors4(self) -> [Position; 4] {
        [
            Position::new(self.x + 1, self.y),
            Position::new(self.x - 1, self.y),
            Position::new(self.x, self.y + 1),
            Position::new(self.x, self.y - 1),
        ]
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Inclusive grid extent: valid cells are `0..=max_x` × `0..=max_y`.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridBounds {
    pub max_x: i32,
    pub max_y: i32,
}

impl GridBounds {
    pub const fn new(max_x: i32, max_y: i32) -> Self {
        Self { max_x, max_y }
    }

    #[inline]
    pub fn contains(self, p: Position) -> bool {
        (0..=self.max_x).contains(&p.x) && (0..=self.max_y).contains(&p.y)
    }

    /// Number of cells, used to size dense per-cell arrays.
    #[inline]
    pub fn cell_count(self) -> usize {
        (self.max_x as usize + 1) * (self.max_y as usize + 1)
    }

    /// Row-major dense index of `p`.  Caller must check `contains` first.
    #[inline]
    pub fn index_of(self, p: Position) -> usize {
        p.y as usize * (self.max_x as usize + 1) + p.x as usize
    }
}

impl Default for GridBounds {
    /// The 70 × 50 km city.
    fn default() -> Self {
        Self::new(70, 50)
    }
}
