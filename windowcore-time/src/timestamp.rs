use crate::{WindowDuration, bucket::BucketNumber};
use std::fmt;

/// Milliseconds since the Unix epoch.
///
/// Signed so that timestamps before the epoch (rare, but not excluded by the
/// spec) still align and convert correctly under integer division.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timestamp(i64);

impl Timestamp {
    /// Wrap a raw millisecond-since-epoch value.
    pub const fn from_millis(millis: i64) -> Self {
        Timestamp(millis)
    }

    /// The raw millisecond-since-epoch value.
    pub const fn millis(self) -> i64 {
        self.0
    }

    /// The largest multiple of `d.millis()` that is `<= self`.
    ///
    /// Uses [`i64::div_euclid`] rather than plain integer division so that
    /// negative timestamps round *down* towards negative infinity instead of
    /// towards zero, preserving "largest multiple `<=` self" for timestamps
    /// before the epoch.
    pub fn aligned_to(self, d: WindowDuration) -> Timestamp {
        Timestamp(self.0.div_euclid(d.millis()) * d.millis())
    }

    /// The bucket number of duration `d` that contains this timestamp.
    pub fn to_bucket_number_of(self, d: WindowDuration) -> BucketNumber {
        BucketNumber::new(self.0.div_euclid(d.millis()), d)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

impl From<i64> for Timestamp {
    fn from(millis: i64) -> Self {
        Timestamp(millis)
    }
}
