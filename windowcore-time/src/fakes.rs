//! Fake clocks for deterministic tests.
//!
//! Modeled directly on `metrique-timesource::fakes`: a clock that never
//! moves, and a clock that can be advanced from a shared handle.

use crate::clock::Clock;
use std::sync::Mutex;
use std::time::SystemTime;

/// A clock that always reports the same instant.
#[derive(Debug)]
pub struct StaticClock {
    at: SystemTime,
}

impl StaticClock {
    /// Create a clock pinned at `at`.
    pub fn at(at: impl Into<SystemTime>) -> Self {
        StaticClock { at: at.into() }
    }
}

impl Clock for StaticClock {
    fn now(&self) -> SystemTime {
        self.at
    }
}

/// A clock that starts at a fixed instant and can be advanced later through
/// a cloneable handle, for tests that need to drive several ticks.
#[derive(Debug)]
pub struct ManuallyAdvancedClock {
    at: Mutex<SystemTime>,
}

impl ManuallyAdvancedClock {
    /// Create a clock starting at `at`.
    pub fn at(at: impl Into<SystemTime>) -> Self {
        ManuallyAdvancedClock {
            at: Mutex::new(at.into()),
        }
    }

    /// Move the clock forward to an absolute time.
    pub fn set(&self, at: impl Into<SystemTime>) {
        *self.at.lock().unwrap() = at.into();
    }

    /// Move the clock forward by a duration.
    pub fn advance(&self, by: std::time::Duration) {
        let mut guard = self.at.lock().unwrap();
        *guard += by;
    }
}

impl Clock for ManuallyAdvancedClock {
    fn now(&self) -> SystemTime {
        *self.at.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn manually_advanced_clock_moves_forward() {
        let clock = ManuallyAdvancedClock::at(UNIX_EPOCH);
        check!(clock.now() == UNIX_EPOCH);
        clock.advance(Duration::from_secs(5));
        check!(clock.now() == UNIX_EPOCH + Duration::from_secs(5));
    }
}
