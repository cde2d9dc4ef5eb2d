use crate::{BucketNumber, TimeSource, WindowDuration};
use std::time::Duration;

/// A discrete processing instant, expressed as a bucket number at the
/// smallest (raw) window duration.
///
/// `Tick` lags the wall clock by a configured safety interval so that
/// cross-node clock skew doesn't cause one node to consider data "already
/// processed" before another node has even ingested it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tick {
    bucket_number: BucketNumber,
}

impl Tick {
    /// Derive the current tick from a time source, lagging wall-clock time
    /// by `safety_interval`.
    pub fn now(time_source: &TimeSource, raw_duration: WindowDuration, safety_interval: Duration) -> Self {
        let now = time_source.now_timestamp();
        let safety_millis = i64::try_from(safety_interval.as_millis()).unwrap_or(i64::MAX);
        let lagged = crate::Timestamp::from_millis(now.millis().saturating_sub(safety_millis));
        Tick {
            bucket_number: lagged.to_bucket_number_of(raw_duration),
        }
    }

    /// Construct a tick directly from its raw-duration bucket number.
    ///
    /// Primarily useful in tests that want to pin a tick without going
    /// through a [`TimeSource`].
    pub const fn at(bucket_number: BucketNumber) -> Self {
        Tick { bucket_number }
    }

    /// The raw-duration bucket number this tick represents.
    pub const fn bucket_number(self) -> BucketNumber {
        self.bucket_number
    }

    /// Whether a raw bucket number has already been covered by this tick.
    ///
    /// # Panics
    ///
    /// Panics (via `BucketNumber`'s `PartialOrd`) if `raw_bn`'s duration
    /// differs from this tick's duration — callers always pass the raw
    /// bucket number corresponding to this tick's own window.
    pub fn already_processed(self, raw_bn: BucketNumber) -> bool {
        raw_bn
            .partial_cmp(&self.bucket_number)
            .expect("already_processed compares bucket numbers of the raw window")
            .is_le()
    }
}
