use crate::histogram_bucket::{CounterBucket, HistogramBucket};
use crate::metric::MetricType;

/// Percentiles and summary statistics read directly off a recorded
/// histogram, for `Timer` metrics.
///
/// Every field is read straight from `hdrhistogram`'s own accessors; this
/// type never computes a percentile itself.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatisticSummary {
    /// Number of values recorded into the source bucket.
    pub count: u64,
    /// The smallest recorded value.
    pub min: u64,
    /// The largest recorded value.
    pub max: u64,
    /// The arithmetic mean of recorded values.
    pub mean: f64,
    /// The 50th percentile.
    pub p50: u64,
    /// The 80th percentile.
    pub p80: u64,
    /// The 90th percentile.
    pub p90: u64,
    /// The 95th percentile.
    pub p95: u64,
    /// The 99th percentile.
    pub p99: u64,
    /// The 99.9th percentile.
    pub p999: u64,
}

impl StatisticSummary {
    /// The all-zero summary: used as the neutral default when a histogram
    /// bucket is empty or its wire bytes can't be decoded.
    pub const NEUTRAL: StatisticSummary = StatisticSummary {
        count: 0,
        min: 0,
        max: 0,
        mean: 0.0,
        p50: 0,
        p80: 0,
        p90: 0,
        p95: 0,
        p99: 0,
        p999: 0,
    };

    fn from_histogram(histogram: &hdrhistogram::Histogram<u64>) -> Self {
        StatisticSummary {
            count: histogram.len(),
            min: histogram.min(),
            max: histogram.max(),
            mean: histogram.mean(),
            p50: histogram.value_at_percentile(50.0),
            p80: histogram.value_at_percentile(80.0),
            p90: histogram.value_at_percentile(90.0),
            p95: histogram.value_at_percentile(95.0),
            p99: histogram.value_at_percentile(99.0),
            p999: histogram.value_at_percentile(99.9),
        }
    }
}

/// Summary statistics for `Gauge` metrics: a level reading's distribution,
/// without the full percentile set a `Timer` carries.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GaugeSummary {
    /// Number of readings recorded into the source bucket.
    pub count: u64,
    /// The smallest recorded reading.
    pub min: u64,
    /// The largest recorded reading.
    pub max: u64,
    /// The arithmetic mean of recorded readings.
    pub mean: f64,
}

impl GaugeSummary {
    /// The all-zero summary: used as the neutral default when a histogram
    /// bucket is empty or its wire bytes can't be decoded.
    pub const NEUTRAL: GaugeSummary = GaugeSummary {
        count: 0,
        min: 0,
        max: 0,
        mean: 0.0,
    };

    fn from_histogram(histogram: &hdrhistogram::Histogram<u64>) -> Self {
        GaugeSummary {
            count: histogram.len(),
            min: histogram.min(),
            max: histogram.max(),
            mean: histogram.mean(),
        }
    }
}

/// Summary for `Counter` metrics: the running sum, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CounterSummary {
    /// The accumulated sum for the bucket.
    pub sum: u64,
}

impl CounterSummary {
    /// The neutral default: a sum of zero.
    pub const NEUTRAL: CounterSummary = CounterSummary { sum: 0 };
}

/// The read-side view of an aggregated bucket: whichever summary shape
/// matches the metric's [`MetricType`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Summary {
    /// A `Timer` metric's percentile summary.
    Statistic(StatisticSummary),
    /// A `Gauge` metric's level summary.
    Gauge(GaugeSummary),
    /// A `Counter` metric's running sum.
    Counter(CounterSummary),
}

impl Summary {
    /// Derive a summary from a histogram bucket, for `Timer` or `Gauge`
    /// metrics. An empty bucket yields the neutral default for the type.
    pub fn from_histogram_bucket(bucket: &HistogramBucket, metric_type: MetricType) -> Self {
        match (bucket.histogram(), metric_type) {
            (Some(histogram), MetricType::Gauge) => Summary::Gauge(GaugeSummary::from_histogram(histogram)),
            (Some(histogram), _) => Summary::Statistic(StatisticSummary::from_histogram(histogram)),
            (None, MetricType::Gauge) => Summary::Gauge(GaugeSummary::NEUTRAL),
            (None, _) => Summary::Statistic(StatisticSummary::NEUTRAL),
        }
    }

    /// Derive a summary from a counter bucket, for `Counter` metrics.
    pub fn from_counter_bucket(bucket: &CounterBucket) -> Self {
        Summary::Counter(CounterSummary { sum: bucket.sum() })
    }

    /// The neutral default summary for a metric type, used when stored bytes
    /// carry an unrecognized wire version.
    pub fn neutral_default(metric_type: MetricType) -> Self {
        match metric_type {
            MetricType::Timer => Summary::Statistic(StatisticSummary::NEUTRAL),
            MetricType::Gauge => Summary::Gauge(GaugeSummary::NEUTRAL),
            MetricType::Counter => Summary::Counter(CounterSummary::NEUTRAL),
        }
    }
}
