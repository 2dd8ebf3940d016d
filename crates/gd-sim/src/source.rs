//! External feeds of orders and blockages.
//!
//! The orchestrator polls its source every `poll_interval_ticks` ticks for
//! the current day and merges whatever it has not seen yet.  Implementations
//! may read a database, files or anything else; the orchestrator only sees
//! events.

use gd_core::SimTime;
use gd_spatial::Blockage;
use gd_world::Order;

use crate::{Event, SourceError};

pub trait EventSource {
    /// Order-arrival events for simulated `day`.
    fn orders_for_day(&self, day: u32) -> Result<Vec<Event>, SourceError>;

    /// Blockage-start events for windows touching simulated `day`.
    fn blockages_for_day(&self, day: u32) -> Result<Vec<Event>, SourceError>;
}

/// A source with nothing in it.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoSource;

impl EventSource for NoSource {
    fn orders_for_day(&self, _day: u32) -> Result<Vec<Event>, SourceError> {
        Ok(Vec::new())
    }

    fn blockages_for_day(&self, _day: u32) -> Result<Vec<Event>, SourceError> {
        Ok(Vec::new())
    }
}

/// In-memory source, mostly for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct StaticSource {
    orders: Vec<Order>,
    blockages: Vec<Blockage>,
}

impl StaticSource {
    pub fn new(orders: Vec<Order>, blockages: Vec<Blockage>) -> Self {
        Self { orders, blockages }
    }

    pub fn with_order(mut self, order: Order) -> Self {
        self.orders.push(order);
        self
    }

    pub fn with_blockage(mut self, blockage: Blockage) -> Self {
        self.blockages.push(blockage);
        self
    }
}

impl EventSource for StaticSource {
    fn orders_for_day(&self, day: u32) -> Result<Vec<Event>, SourceError> {
        Ok(self
            .orders
            .iter()
            .filter(|o| o.arrival.day() == day)
            .cloned()
            .map(Event::order_arrival)
            .collect())
    }

    fn blockages_for_day(&self, day: u32) -> Result<Vec<Event>, SourceError> {
        let day_start = SimTime::from_dhm(day, 0, 0);
        let day_end = day_start + gd_core::time::DAY;
        Ok(self
            .blockages
            .iter()
            .filter(|b| b.start < day_end && b.end > day_start)
            .cloned()
            .map(Event::blockage_start)
            .collect())
    }
}
