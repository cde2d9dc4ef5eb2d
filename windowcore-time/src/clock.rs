use crate::Timestamp;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::SystemTime;

/// A pluggable source of wall-clock time.
///
/// Production code uses [`TimeSource::System`]; tests swap in
/// [`crate::fakes::StaticClock`] or [`crate::fakes::ManuallyAdvancedClock`]
/// so that tick derivation is deterministic.
pub trait Clock: Debug + Send + Sync {
    /// The current wall-clock time.
    fn now(&self) -> SystemTime;
}

/// Unified handle to a time source, either the real system clock or a custom
/// one substituted for testing.
#[derive(Clone, Debug)]
pub enum TimeSource {
    /// The real OS clock.
    System,
    /// A caller-supplied clock, generally a fake used in tests.
    Custom(Arc<dyn Clock>),
}

impl Default for TimeSource {
    fn default() -> Self {
        Self::System
    }
}

impl TimeSource {
    /// Wrap a custom [`Clock`] implementation.
    pub fn custom(clock: impl Clock + 'static) -> Self {
        Self::Custom(Arc::new(clock))
    }

    /// The current time as a [`Timestamp`] (milliseconds since the epoch).
    ///
    /// Clamps to [`i64::MIN`]/[`i64::MAX`] rather than panicking if the
    /// underlying clock ever reports a time outside the representable range
    /// of a signed 64-bit millisecond count.
    pub fn now_timestamp(&self) -> Timestamp {
        let now = match self {
            TimeSource::System => SystemTime::now(),
            TimeSource::Custom(clock) => clock.now(),
        };
        let millis = match now.duration_since(SystemTime::UNIX_EPOCH) {
            Ok(since_epoch) => i64::try_from(since_epoch.as_millis()).unwrap_or(i64::MAX),
            Err(before_epoch) => {
                i64::try_from(before_epoch.duration().as_millis())
                    .map(|m| -m)
                    .unwrap_or(i64::MIN)
            }
        };
        Timestamp::from_millis(millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::StaticClock;
    use assert2::check;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn static_clock_round_trips() {
        let ts = TimeSource::custom(StaticClock::at(UNIX_EPOCH + Duration::from_secs(100)));
        check!(ts.now_timestamp().millis() == 100_000);
    }

    #[test]
    fn before_epoch_is_negative() {
        let ts = TimeSource::custom(StaticClock::at(UNIX_EPOCH - Duration::from_millis(500)));
        check!(ts.now_timestamp().millis() == -500);
    }
}
