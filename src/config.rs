//! # Group configuration.
//!
//! Provides [`Config`] centralized settings for a [`Group`](crate::Group).
//!
//! ## Sentinel values
//! - `shutdown_timeout = 0s` → no shutdown deadline (wait indefinitely)
//! - `bus_capacity = 0` → clamped to 1

use std::time::Duration;

/// Default shutdown deadline.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings for a group run.
///
/// ## Field semantics
/// - `shutdown_timeout`: deadline handed to every shutdown operation (`0s` = none)
/// - `bus_capacity`: event bus ring buffer size (min 1)
///
/// ## Notes
/// All fields are public for flexibility. Prefer the helper accessors to avoid
/// sprinkling sentinel checks (`0`) across the codebase.
#[derive(Clone, Debug)]
pub struct Config {
    /// How long shutdown operations are given before their context expires.
    ///
    /// The deadline is advisory: the group still waits for every shutdown
    /// operation to return, so an operation that ignores its context delays
    /// `wait` past this value.
    pub shutdown_timeout: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` events skip
    /// the oldest ones.
    pub bus_capacity: usize,
}

impl Config {
    /// Returns the shutdown deadline as an `Option`.
    ///
    /// - `None` → no deadline
    /// - `Some(d)` → shutdown context expires `d` after shutdown begins
    #[inline]
    pub fn shutdown_deadline(&self) -> Option<Duration> {
        if self.shutdown_timeout == Duration::ZERO {
            None
        } else {
            Some(self.shutdown_timeout)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns a copy with a different shutdown timeout.
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `shutdown_timeout = 5s`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            bus_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.shutdown_deadline(), Some(Duration::from_secs(5)));
        assert_eq!(cfg.bus_capacity_clamped(), 1024);
    }

    #[test]
    fn test_zero_timeout_means_unbounded() {
        let cfg = Config::default().with_shutdown_timeout(Duration::ZERO);
        assert_eq!(cfg.shutdown_deadline(), None);
    }

    #[test]
    fn test_bus_capacity_clamped() {
        let cfg = Config {
            bus_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
