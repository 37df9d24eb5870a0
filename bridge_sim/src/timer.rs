//! # Simulated Timer Facility
//!
//! Deterministic timer implementation for testing.
//!
//! ## Philosophy
//!
//! **Determinism enables thorough testing.**
//!
//! This timer provides controllable, deterministic time progression.
//! Unlike a browser event loop, it only advances when explicitly told to
//! do so, and it fires due callbacks in deadline order (ties in scheduling
//! order) while advancing.

use bridge_hal::{TimerCallback, TimerFacility, TimerId};
use bridge_types::{Duration, Instant};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

#[derive(Default)]
struct TimerState {
    now: Instant,
    next_id: u64,
    scheduled: BTreeMap<(Instant, TimerId), TimerCallback>,
}

/// Simulated timer with controllable time progression
///
/// Cloning yields another handle to the same clock.
///
/// # Examples
///
/// ```
/// use bridge_hal::TimerFacility;
/// use bridge_sim::timer::SimTimer;
/// use bridge_types::Duration;
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let timer = SimTimer::new();
/// let fired = Rc::new(Cell::new(false));
/// let flag = fired.clone();
/// timer.schedule(Duration::from_millis(100), Box::new(move || flag.set(true)));
///
/// timer.advance(Duration::from_millis(99));
/// assert!(!fired.get());
/// timer.advance(Duration::from_millis(1));
/// assert!(fired.get());
/// ```
#[derive(Clone, Default)]
pub struct SimTimer {
    state: Rc<RefCell<TimerState>>,
}

impl SimTimer {
    /// Creates a new simulated timer starting at instant zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current virtual instant
    pub fn now(&self) -> Instant {
        self.state.borrow().now
    }

    /// Returns the number of callbacks still scheduled
    pub fn pending(&self) -> usize {
        self.state.borrow().scheduled.len()
    }

    /// Advances the clock, firing every callback that falls due
    ///
    /// Callbacks run with the clock set to their own deadline, so a callback
    /// that schedules another timer measures from the right instant. A timer
    /// scheduled by a callback that falls due before the end of this advance
    /// fires in the same call.
    ///
    /// Returns the number of callbacks fired.
    pub fn advance(&self, delta: Duration) -> usize {
        let target = self.now() + delta;
        let mut fired = 0;

        loop {
            let due = {
                let mut state = self.state.borrow_mut();
                let next_key = match state.scheduled.keys().next() {
                    Some(key) if key.0 <= target => *key,
                    _ => break,
                };
                state.now = next_key.0;
                state.scheduled.remove(&next_key)
            };

            // Borrow released: the callback may schedule or cancel timers.
            if let Some(callback) = due {
                callback();
                fired += 1;
            }
        }

        self.state.borrow_mut().now = target;
        fired
    }
}

impl TimerFacility for SimTimer {
    fn schedule(&self, after: Duration, callback: TimerCallback) -> TimerId {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let id = TimerId::new(state.next_id);
        let deadline = state.now + after;
        state.scheduled.insert((deadline, id), callback);
        id
    }

    fn cancel(&self, id: TimerId) {
        self.state
            .borrow_mut()
            .scheduled
            .retain(|(_, scheduled), _| *scheduled != id);
    }
}
