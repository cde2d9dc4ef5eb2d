use windowcore_model::Metric;
use windowcore_time::Timestamp;

/// One metric's contribution to an ingest batch: a list of `(timestamp,
/// values)` pairs, each representing one wire-level sample group as handed
/// to the store path before any grouping by the ingest granule happens.
///
/// Values are signed: the wire format a client sends can and does contain
/// negative values for a broken emitter, and the ingest path is the layer
/// responsible for dropping them (§4.E) rather than refusing to decode them.
#[derive(Debug, Clone)]
pub struct MetricMeasurement {
    /// The metric these measurements belong to.
    pub metric: Metric,
    /// `(timestamp, values)` pairs, in arrival order.
    pub measurements: Vec<(Timestamp, Vec<i64>)>,
}

impl MetricMeasurement {
    /// Construct a measurement contribution for `metric`.
    pub fn new(metric: Metric, measurements: Vec<(Timestamp, Vec<i64>)>) -> Self {
        MetricMeasurement { metric, measurements }
    }
}

/// A batch of incoming measurements, grouped by metric, as handed to
/// [`crate::MeasurementIngest::store_metric_measurements`].
pub type MeasurementBatch = Vec<MetricMeasurement>;
