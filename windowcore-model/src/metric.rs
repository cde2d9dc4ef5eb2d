use std::fmt;
use std::sync::Arc;

/// The kind of value a metric records, which determines how its
/// measurements are aggregated.
///
/// `Timer` and `Gauge` both aggregate into a [`crate::HistogramBucket`];
/// `Counter` aggregates into a [`crate::CounterBucket`]. Any other value is
/// outside the scope of this system and is dropped at the ingest boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MetricType {
    /// A duration measurement, recorded into a histogram.
    Timer,
    /// An instantaneous level measurement, recorded into a histogram.
    Gauge,
    /// A monotonically-accumulated count, recorded into a counter.
    Counter,
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetricType::Timer => "timer",
            MetricType::Gauge => "gauge",
            MetricType::Counter => "counter",
        };
        f.write_str(name)
    }
}

/// A named, typed metric identity.
///
/// `name` is an `Arc<str>` rather than `String` because the same metric
/// identity is cloned into every bucket key, cache entry, and log line along
/// its path through the pipeline; cloning an `Arc<str>` is a refcount bump.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Metric {
    name: Arc<str>,
    metric_type: MetricType,
}

impl Metric {
    /// Construct a metric from its name and type.
    pub fn new(name: impl Into<Arc<str>>, metric_type: MetricType) -> Self {
        Metric {
            name: name.into(),
            metric_type,
        }
    }

    /// The metric's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The metric's type.
    pub fn metric_type(&self) -> MetricType {
        self.metric_type
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.metric_type)
    }
}
