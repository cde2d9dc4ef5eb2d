use crate::error::{Result, WindowCoreError};
use hdrhistogram::Histogram;

/// The lowest value the underlying HDR histogram can discriminate.
const LOWEST_DISCERNIBLE_VALUE: u64 = 1;

/// The highest trackable value: one hour expressed in milliseconds, which
/// comfortably covers both timer (duration) and gauge (level) measurements
/// seen in practice. Values above this are clamped by `hdrhistogram` itself
/// rather than rejected, since a clamped-but-recorded outlier is more useful
/// than a silently dropped one.
const HIGHEST_TRACKABLE_VALUE: u64 = 60 * 60 * 1000;

/// Significant decimal digits of precision retained per value.
const SIGNIFICANT_DIGITS: u8 = 3;

pub(crate) fn new_histogram() -> Histogram<u64> {
    Histogram::new_with_bounds(LOWEST_DISCERNIBLE_VALUE, HIGHEST_TRACKABLE_VALUE, SIGNIFICANT_DIGITS)
        .expect("bounds are fixed constants known to be valid")
}

/// The aggregated contents of one bucket for a `Timer` or `Gauge` metric.
///
/// `HdrHistogram` is used as an opaque recording and merging primitive here:
/// this type never computes a percentile itself, it only records values and
/// merges other buckets in, leaving percentile extraction to [`crate::Summary`].
#[derive(Debug, Clone)]
pub enum HistogramBucket {
    /// No measurement has ever been recorded into this bucket.
    Empty,
    /// At least one measurement has been recorded.
    Recorded(Box<Histogram<u64>>),
}

impl HistogramBucket {
    /// The empty bucket, with no recorded measurements.
    pub fn empty() -> Self {
        HistogramBucket::Empty
    }

    /// Record a single value into this bucket, allocating the underlying
    /// histogram lazily on the first recorded value.
    ///
    /// Negative values never reach this method — the ingest path drops them
    /// before dispatch — so `value` is unsigned.
    pub fn record(&mut self, value: u64) -> Result<()> {
        match self {
            HistogramBucket::Empty => {
                let mut histogram = new_histogram();
                histogram
                    .record(value)
                    .map_err(|e| WindowCoreError::InvalidInput(e.to_string()))?;
                *self = HistogramBucket::Recorded(Box::new(histogram));
            }
            HistogramBucket::Recorded(histogram) => {
                histogram
                    .record(value)
                    .map_err(|e| WindowCoreError::InvalidInput(e.to_string()))?;
            }
        }
        Ok(())
    }

    /// Merge another bucket's recorded values into this one in place.
    ///
    /// Merging into or from an empty bucket is a no-op or a move; merging two
    /// recorded buckets adds `other`'s recorded counts into `self`.
    pub fn merge(&mut self, other: &HistogramBucket) -> Result<()> {
        let HistogramBucket::Recorded(other_histogram) = other else {
            return Ok(());
        };
        match self {
            HistogramBucket::Empty => {
                *self = HistogramBucket::Recorded(other_histogram.clone());
            }
            HistogramBucket::Recorded(histogram) => {
                histogram
                    .add(other_histogram.as_ref())
                    .map_err(|e| WindowCoreError::Corruption(e.to_string()))?;
            }
        }
        Ok(())
    }

    /// Whether this bucket has never recorded a value.
    pub fn is_empty(&self) -> bool {
        matches!(self, HistogramBucket::Empty)
    }

    /// Borrow the underlying histogram, if any value has been recorded.
    pub fn histogram(&self) -> Option<&Histogram<u64>> {
        match self {
            HistogramBucket::Empty => None,
            HistogramBucket::Recorded(histogram) => Some(histogram),
        }
    }
}

/// The aggregated contents of one bucket for a `Counter` metric: a single
/// running sum, since counters have no distribution to preserve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterBucket {
    /// No value has ever been added to this bucket.
    Empty,
    /// At least one value has been added.
    Recorded(u64),
}

impl CounterBucket {
    /// The empty bucket, with a sum of zero.
    pub fn empty() -> Self {
        CounterBucket::Empty
    }

    /// Add a value to the running sum, allocating on the first add.
    pub fn add(&mut self, value: u64) {
        *self = match *self {
            CounterBucket::Empty => CounterBucket::Recorded(value),
            CounterBucket::Recorded(sum) => CounterBucket::Recorded(sum.saturating_add(value)),
        };
    }

    /// Merge another bucket's sum into this one in place.
    pub fn merge(&mut self, other: &CounterBucket) {
        if let CounterBucket::Recorded(other_sum) = *other {
            self.add(other_sum);
        }
    }

    /// Whether this bucket has never accumulated a value.
    pub fn is_empty(&self) -> bool {
        matches!(self, CounterBucket::Empty)
    }

    /// The current running sum, or zero if nothing has been recorded.
    pub fn sum(self) -> u64 {
        match self {
            CounterBucket::Empty => 0,
            CounterBucket::Recorded(sum) => sum,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;

    #[test]
    fn recording_into_empty_bucket_allocates_histogram() {
        let mut bucket = HistogramBucket::empty();
        check!(bucket.is_empty());
        bucket.record(42).unwrap();
        check!(!bucket.is_empty());
        check!(bucket.histogram().unwrap().len() == 1);
    }

    #[test]
    fn merging_two_recorded_buckets_sums_their_counts() {
        let mut a = HistogramBucket::empty();
        a.record(10).unwrap();
        let mut b = HistogramBucket::empty();
        b.record(20).unwrap();
        b.record(30).unwrap();

        a.merge(&b).unwrap();
        check!(a.histogram().unwrap().len() == 3);
    }

    #[test]
    fn merging_empty_into_recorded_is_a_no_op() {
        let mut a = HistogramBucket::empty();
        a.record(10).unwrap();
        a.merge(&HistogramBucket::empty()).unwrap();
        check!(a.histogram().unwrap().len() == 1);
    }

    #[test]
    fn counter_bucket_accumulates_and_merges() {
        let mut a = CounterBucket::empty();
        a.add(5);
        a.add(7);
        check!(a.sum() == 12);

        let mut b = CounterBucket::empty();
        b.add(3);
        a.merge(&b);
        check!(a.sum() == 15);
    }
}
