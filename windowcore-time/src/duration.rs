use std::fmt;

/// A window width, expressed in whole milliseconds.
///
/// Kept as a dedicated newtype (rather than `std::time::Duration`) because
/// every operation that matters here — alignment, bucket-number conversion,
/// re-bucketing — is integer division on the millisecond count, and a
/// `std::time::Duration` with sub-millisecond precision has no meaning in
/// this system.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowDuration(i64);

impl WindowDuration {
    /// The raw, finest-grained bucket width: 1 millisecond.
    pub const RAW: WindowDuration = WindowDuration(1);

    /// Construct a window duration from a whole millisecond count.
    ///
    /// # Panics
    ///
    /// Panics if `millis` is not strictly positive — a zero or negative
    /// window width has no sensible alignment semantics.
    pub const fn from_millis(millis: i64) -> Self {
        assert!(millis > 0, "window duration must be positive");
        WindowDuration(millis)
    }

    /// The window width in milliseconds.
    pub const fn millis(self) -> i64 {
        self.0
    }
}

impl fmt::Debug for WindowDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WindowDuration({}ms)", self.0)
    }
}

impl fmt::Display for WindowDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}
