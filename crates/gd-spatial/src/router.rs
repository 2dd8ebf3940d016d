//! Routing trait and the default time-dependent grid A*.
//!
//! # Pluggability
//!
//! Plan conversion and the orchestrator call routing through the [`Router`]
//! trait, so applications can swap in a different search (precomputed
//! distance tables, congestion-aware costs) without touching the core.
//!
//! # Time dependence
//!
//! Every move costs one cell and takes `secs_per_cell` seconds, so the
//! arrival time at a node is `departure + g × secs_per_cell`.  A neighbour is
//! rejected if a blockage covers it at that arrival time.  The destination is
//! never rejected: callers asked for it explicitly and decide themselves what
//! to do about a closed target.
//!
//! # Failure
//!
//! An unreachable target yields an **empty path**, never an error.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use gd_core::{GridBounds, Position, SimConfig, SimTime};

use crate::BlockageView;

// ── Router trait ──────────────────────────────────────────────────────────────

/// Pluggable path finder.
///
/// # Thread safety
///
/// Implementations must be `Send + Sync`: the replanning worker converts
/// routes on a background thread (and on rayon with the `parallel` feature)
/// while the tick loop uses the same router for return-to-depot plans.
pub trait Router: Send + Sync + 'static {
    /// Cells from `from` to `to` inclusive, in travel order, departing at
    /// `departure`.
    ///
    /// - `from == to` → `[from]`.
    /// - `from` blocked at `departure`, out-of-grid endpoints, or no path →
    ///   empty.
    fn find_path<B: BlockageView + ?Sized>(
        &self,
        blockages: &B,
        from:      Position,
        to:        Position,
        departure: SimTime,
    ) -> Vec<Position>;

    /// Seconds needed to move one cell.
    fn secs_per_cell(&self) -> i64;

    /// Travel time of a path returned by [`find_path`][Self::find_path].
    fn travel_secs(&self, path: &[Position]) -> i64 {
        path_cells(path) as i64 * self.secs_per_cell()
    }
}

/// Number of moves in a path (`0` for empty and single-cell paths).
#[inline]
pub fn path_cells(path: &[Position]) -> usize {
    path.len().saturating_sub(1)
}

// ── TimeDependentRouter ───────────────────────────────────────────────────────

/// 4-connected grid A* with Manhattan heuristic and time-varying obstacles.
#[derive(Clone, Debug)]
pub struct TimeDependentRouter {
    pub bounds: GridBounds,
    pub secs_per_cell: i64,
}

impl TimeDependentRouter {
    pub fn new(bounds: GridBounds, secs_per_cell: i64) -> Self {
        Self { bounds, secs_per_cell: secs_per_cell.max(1) }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(config.grid, config.ops.secs_per_cell())
    }
}

impl Router for TimeDependentRouter {
    fn find_path<B: BlockageView + ?Sized>(
        &self,
        blockages: &B,
        from:      Position,
        to:        Position,
        departure: SimTime,
    ) -> Vec<Position> {
        astar(self.bounds, self.secs_per_cell, blockages, from, to, departure)
    }

    fn secs_per_cell(&self) -> i64 {
        self.secs_per_cell
    }
}

// ── A* internals ──────────────────────────────────────────────────────────────

/// Open-set entry: `(f, seq, g, cell)`.  `seq` grows with every push so equal
/// `f` values pop in insertion/update order.
type OpenEntry = Reverse<(u32, u64, u32, Position)>;

fn astar<B: BlockageView + ?Sized>(
    bounds:        GridBounds,
    secs_per_cell: i64,
    blockages:     &B,
    from:          Position,
    to:            Position,
    departure:     SimTime,
) -> Vec<Position> {
    if from == to {
        return vec![from];
    }
    if !bounds.contains(from) || !bounds.contains(to) {
        return Vec::new();
    }
    if blockages.is_blocked(from, departure) {
        return Vec::new();
    }

    let n = bounds.cell_count();
    // g[v] = best known move count to reach v.
    let mut g      = vec![u32::MAX; n];
    let mut prev   = vec![None::<Position>; n];
    let mut closed = vec![false; n];
    let mut seq: u64 = 0;

    let mut open: BinaryHeap<OpenEntry> = BinaryHeap::new();
    g[bounds.index_of(from)] = 0;
    open.push(Reverse((from.manhattan(to), seq, 0, from)));

    while let Some(Reverse((_f, _, cost, node))) = open.pop() {
        let idx = bounds.index_of(node);
        // Skip entries superseded by a cheaper re-insertion.
        if closed[idx] || cost > g[idx] {
            continue;
        }
        if node == to {
            return reconstruct(bounds, &prev, from, to);
        }
        closed[idx] = true;

        let next_cost = cost + 1;
        let arrival = departure + next_cost as i64 * secs_per_cell;

        for neighbor in node.neighbors4() {
            if !bounds.contains(neighbor) {
                continue;
            }
            let nidx = bounds.index_of(neighbor);
            if closed[nidx] {
                continue;
            }
            if neighbor != to && blockages.is_blocked(neighbor, arrival) {
                continue;
            }
            if next_cost < g[nidx] {
                g[nidx] = next_cost;
                prev[nidx] = Some(node);
                seq += 1;
                open.push(Reverse((next_cost + neighbor.manhattan(to), seq, next_cost, neighbor)));
            }
        }
    }

    Vec::new()
}

fn reconstruct(
    bounds: GridBounds,
    prev:   &[Option<Position>],
    from:   Position,
    to:     Position,
) -> Vec<Position> {
    let mut path = vec![to];
    let mut cur = to;
    while cur != from {
        match prev[bounds.index_of(cur)] {
            Some(p) => {
                path.push(p);
                cur = p;
            }
            None => return Vec::new(),
        }
    }
    path.reverse();
    path
}
