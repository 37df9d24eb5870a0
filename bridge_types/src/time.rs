//! Time abstractions

use core::ops::{Add, Sub};

/// A point in virtual time
///
/// Opaque millisecond count since the timer facility started. It only
/// has meaning relative to other instants from the same facility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Instant {
    millis: u64,
}

impl Instant {
    /// The facility's starting instant
    pub const ZERO: Instant = Instant { millis: 0 };

    /// Creates an instant from milliseconds
    pub const fn from_millis(millis: u64) -> Self {
        Self { millis }
    }

    /// Returns milliseconds since the facility started
    pub const fn as_millis(&self) -> u64 {
        self.millis
    }

    /// Returns the duration since another instant
    pub fn duration_since(&self, earlier: Instant) -> Duration {
        Duration::from_millis(self.millis.saturating_sub(earlier.millis))
    }
}

impl Add<Duration> for Instant {
    type Output = Instant;

    fn add(self, duration: Duration) -> Self::Output {
        Instant::from_millis(self.millis.saturating_add(duration.as_millis()))
    }
}

impl Sub<Duration> for Instant {
    type Output = Instant;

    fn sub(self, duration: Duration) -> Self::Output {
        Instant::from_millis(self.millis.saturating_sub(duration.as_millis()))
    }
}

/// A duration of time, in milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Duration {
    millis: u64,
}

impl Duration {
    /// Zero-length duration
    pub const ZERO: Duration = Duration { millis: 0 };

    /// Creates a duration from milliseconds
    pub const fn from_millis(millis: u64) -> Self {
        Self { millis }
    }

    /// Creates a duration from seconds, saturating at `u64::MAX` millis
    pub const fn from_secs(secs: u64) -> Self {
        Self {
            millis: secs.saturating_mul(1_000),
        }
    }

    /// Returns the duration in milliseconds
    pub const fn as_millis(&self) -> u64 {
        self.millis
    }
}

impl Add for Duration {
    type Output = Duration;

    fn add(self, other: Duration) -> Self::Output {
        Duration::from_millis(self.millis.saturating_add(other.millis))
    }
}

impl Sub for Duration {
    type Output = Duration;

    fn sub(self, other: Duration) -> Self::Output {
        Duration::from_millis(self.millis.saturating_sub(other.millis))
    }
}
