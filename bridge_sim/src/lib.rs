//! # Bridge Simulation
//!
//! Deterministic stand-ins for the environment a frame bridge runs in.
//!
//! ## Philosophy
//!
//! A real page delivers cross-window messages and fires timers on its own
//! schedule. Here nothing happens until a test says so:
//!
//! - [`SimBus`] holds every post in flight until it is delivered
//! - [`SimTimer`] only advances when told to
//! - [`FaultPlan`] drops, duplicates, or reorders traffic on request
//!
//! Every interleaving a test exercises is therefore reproducible.

pub mod bus;
pub mod fault_injection;
pub mod test_utils;
pub mod timer;

pub use bus::{DeliveryOutcome, Posted, SimBus, SimEndpoint};
pub use fault_injection::{FaultInjector, FaultPlan, MessageFault, PostDecision};
pub use test_utils::SimWorld;
pub use timer::SimTimer;
