//! An owned table of running simulations.
//!
//! Whatever serves the simulations (HTTP handlers, a CLI, tests) owns one of
//! these and passes it around; there is no process-wide table.

use std::collections::BTreeMap;

use gd_core::SimulationId;
use gd_spatial::Router;

use crate::{Optimizer, Orchestrator, SimBuilder, SimError, SimResult};

pub struct SimRegistry<R: Router> {
    sims: BTreeMap<SimulationId, Orchestrator<R>>,
    next_id: u32,
}

impl<R: Router> Default for SimRegistry<R> {
    fn default() -> Self {
        Self { sims: BTreeMap::new(), next_id: 1 }
    }
}

impl<R: Router> SimRegistry<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a simulation under a fresh id and keep it.
    pub fn create<O: Optimizer>(&mut self, builder: SimBuilder<R>, optimizer: O) -> SimResult<SimulationId> {
        let id = SimulationId(self.next_id);
        let sim = builder.id(id).build(optimizer)?;
        self.next_id += 1;
        self.sims.insert(id, sim);
        Ok(id)
    }

    pub fn get(&self, id: SimulationId) -> SimResult<&Orchestrator<R>> {
        self.sims.get(&id).ok_or(SimError::UnknownSimulation(id))
    }

    pub fn get_mut(&mut self, id: SimulationId) -> SimResult<&mut Orchestrator<R>> {
        self.sims.get_mut(&id).ok_or(SimError::UnknownSimulation(id))
    }

    /// Remove a simulation.  Dropping it stops its replanning worker.
    pub fn remove(&mut self, id: SimulationId) -> SimResult<Orchestrator<R>> {
        self.sims.remove(&id).ok_or(SimError::UnknownSimulation(id))
    }

    pub fn ids(&self) -> impl Iterator<Item = SimulationId> + '_ {
        self.sims.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.sims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sims.is_empty()
    }
}
