//! `VehiclePlan` — an ordered action list with a resumable cursor.

use gd_core::{Position, SimTime, VehicleId};

use crate::Action;

/// The work assigned to one vehicle.
///
/// Actions are stored in execution order; `cursor` indexes the action that is
/// currently running (or next to run).  The plan is finished once the cursor
/// passes the last action.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehiclePlan {
    pub vehicle: VehicleId,
    pub start: SimTime,
    pub actions: Vec<Action>,
    pub cursor: usize,
}

impl VehiclePlan {
    pub fn new(vehicle: VehicleId, start: SimTime) -> Self {
        Self { vehicle, start, actions: Vec::new(), cursor: 0 }
    }

    pub fn with_actions(vehicle: VehicleId, start: SimTime, actions: Vec<Action>) -> Self {
        Self { vehicle, start, actions, cursor: 0 }
    }

    pub fn push(&mut self, action: Action) {
        self.actions.push(action);
    }

    #[inline]
    pub fn current(&self) -> Option<&Action> {
        self.actions.get(self.cursor)
    }

    #[inline]
    pub fn current_mut(&mut self) -> Option<&mut Action> {
        self.actions.get_mut(self.cursor)
    }

    /// Move the cursor past the current action.  Returns `true` if another
    /// action follows.
    pub fn advance(&mut self) -> bool {
        if self.cursor < self.actions.len() {
            self.cursor += 1;
        }
        self.cursor < self.actions.len()
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.cursor >= self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Actions not yet completed, current one included.
    pub fn remaining(&self) -> &[Action] {
        &self.actions[self.cursor.min(self.actions.len())..]
    }

    /// End of the last action, or `start` for an empty plan.
    pub fn end_time(&self) -> SimTime {
        self.actions.last().map_or(self.start, |a| a.end)
    }

    /// Push the whole plan `secs` later.  Progress already made is kept.
    pub fn delay(&mut self, secs: i64) {
        self.start += secs;
        for action in &mut self.actions {
            action.start += secs;
            action.end += secs;
        }
    }

    /// Cell the vehicle ends the plan on, if the plan moves it at all.
    pub fn final_position(&self) -> Option<Position> {
        self.actions.iter().rev().find_map(Action::destination)
    }
}
