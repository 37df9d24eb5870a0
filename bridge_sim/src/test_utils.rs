//! Test utilities for bridge scenarios
//!
//! A [`SimWorld`] bundles one bus and one clock, the two collaborators every
//! channel test needs, and knows how to let both settle.

use crate::bus::{SimBus, SimEndpoint};
use crate::fault_injection::FaultPlan;
use crate::timer::SimTimer;
use bridge_types::Duration;

/// A simulated environment: one bus, one clock
#[derive(Clone, Default)]
pub struct SimWorld {
    pub bus: SimBus,
    pub timer: SimTimer,
}

impl SimWorld {
    /// Creates an environment with no faults
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an environment whose bus applies `plan`
    pub fn with_fault_plan(plan: FaultPlan) -> Self {
        Self {
            bus: SimBus::with_fault_plan(plan),
            timer: SimTimer::new(),
        }
    }

    /// Opens a context with the given origin
    pub fn open(&self, origin: &str) -> SimEndpoint {
        self.bus.open_context(origin)
    }

    /// Delivers everything in flight, without moving the clock
    pub fn settle(&self) -> usize {
        self.bus.deliver_all()
    }

    /// Moves the clock forward, then delivers anything the timers posted
    pub fn advance(&self, millis: u64) -> usize {
        let fired = self.timer.advance(Duration::from_millis(millis));
        self.bus.deliver_all();
        fired
    }
}
