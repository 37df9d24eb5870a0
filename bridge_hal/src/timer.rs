//! # Timer Facility
//!
//! Cooperative timer abstraction used for response timeouts.
//!
//! ## Philosophy
//!
//! **Time is a service, not a global variable.**
//!
//! A timer facility runs callbacks after a delay. It does NOT:
//! - Block or sleep
//! - Run callbacks on another thread
//! - Run a callback from inside `schedule` itself
//!
//! Callbacks are scheduled against the same event loop that delivers
//! transport messages, so a callback never overlaps an inbound handler.

use bridge_types::Duration;
use std::fmt;

/// Handle to a scheduled callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

impl TimerId {
    /// Wraps a raw timer handle
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timer({})", self.0)
    }
}

/// Callback run when a timer elapses
pub type TimerCallback = Box<dyn FnOnce()>;

/// Cooperative, single-threaded timer
///
/// # Implementation Notes
///
/// - `schedule` must return without running the callback
/// - A cancelled callback must never run
/// - Cancelling an unknown or already-fired timer is a no-op
pub trait TimerFacility {
    /// Runs `callback` once `after` has elapsed
    fn schedule(&self, after: Duration, callback: TimerCallback) -> TimerId;

    /// Cancels a scheduled callback
    fn cancel(&self, id: TimerId);
}
