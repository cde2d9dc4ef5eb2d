/// The observable result of one [`crate::MeasurementIngest::store_metric_measurements`]
/// call, for tests and callers that want to assert on ingest behavior without
/// reaching back into the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestOutcome {
    /// How many `(metric, coarse-granule)` groups were appended as raw
    /// buckets across the whole batch.
    pub groups_stored: usize,
    /// How many individual negative values were dropped across the whole
    /// batch, counters and histograms combined.
    pub negative_values_dropped: usize,
    /// How many metrics were registered with the meta store for the first
    /// time by this call.
    pub newly_registered_metrics: usize,
}
