use crate::measurement::MetricMeasurement;
use crate::outcome::IngestOutcome;
use crate::rate_limit::rate_limited;
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use windowcore_model::{CounterBucket, HistogramBucket, MetricType, Result, wire};
use windowcore_store::{BucketStore, MetaStore};
use windowcore_time::{Tick, Timestamp, WindowDuration};

/// How often the negative-value-drop warning may fire, per metric call site.
const NEGATIVE_VALUE_WARNING_INTERVAL: Duration = Duration::from_secs(60);

/// A granule's worth of raw measurement values, inlined for the common case
/// of a handful of samples landing in one 5-second bucket before anything
/// spills onto the heap.
type GranuleValues = SmallVec<[i64; 32]>;

/// The write-side ingestion path: classifies incoming measurements by metric
/// type, groups them by a coarse time granule, converts each group to a raw
/// (1ms) bucket, and appends it to the appropriate raw bucket store.
///
/// Holds its collaborators by explicit constructor parameter, matching the
/// window processor's own "plain record, not a trait mixin" shape.
pub struct MeasurementIngest {
    histogram_raw_store: Arc<dyn BucketStore<Vec<u8>>>,
    counter_raw_store: Arc<dyn BucketStore<Vec<u8>>>,
    meta_store: Arc<dyn MetaStore>,
    ingest_granule: WindowDuration,
    insert_chunk_size: usize,
}

impl MeasurementIngest {
    /// Construct an ingest path over the raw bucket stores for each bucket
    /// kind and the shared meta store.
    pub fn new(
        histogram_raw_store: Arc<dyn BucketStore<Vec<u8>>>,
        counter_raw_store: Arc<dyn BucketStore<Vec<u8>>>,
        meta_store: Arc<dyn MetaStore>,
        ingest_granule: WindowDuration,
        insert_chunk_size: usize,
    ) -> Self {
        MeasurementIngest {
            histogram_raw_store,
            counter_raw_store,
            meta_store,
            ingest_granule,
            insert_chunk_size,
        }
    }

    /// Store a batch of measurements for every metric that carries at least
    /// one measurement, gated only informationally by `current_tick` — see
    /// `spec.md` §9's open question: `already_processed` is logged, never
    /// enforced, so at-least-once redelivery of already-rolled-up raw data
    /// is tolerated rather than silently dropped.
    pub async fn store_metric_measurements(
        &self,
        batch: &[MetricMeasurement],
        current_tick: Tick,
    ) -> Result<IngestOutcome> {
        let mut outcome = IngestOutcome::default();

        for entry in batch {
            if entry.measurements.is_empty() {
                continue;
            }
            self.store_one_metric(entry, current_tick, &mut outcome).await?;
        }

        Ok(outcome)
    }

    async fn store_one_metric(
        &self,
        entry: &MetricMeasurement,
        current_tick: Tick,
        outcome: &mut IngestOutcome,
    ) -> Result<()> {
        let groups = self.group_by_granule(&entry.measurements);
        let mut dropped_negatives: SmallVec<[i64; 8]> = SmallVec::new();

        // Groups of one metric are applied in sequence, oldest granule
        // first; the `BTreeMap` iteration order already guarantees this.
        for (&granule_millis, values) in &groups {
            let granule_ts = Timestamp::from_millis(granule_millis);
            let raw_bn = granule_ts.to_bucket_number_of(WindowDuration::RAW);

            if current_tick.already_processed(raw_bn) {
                tracing::warn!(
                    metric = %entry.metric,
                    bucket = %raw_bn,
                    "ingesting a raw bucket already covered by the current tick"
                );
            }

            match entry.metric.metric_type() {
                MetricType::Timer | MetricType::Gauge => {
                    let mut histogram = HistogramBucket::empty();
                    for &value in values {
                        if value < 0 {
                            dropped_negatives.push(value);
                            continue;
                        }
                        histogram.record(value as u64)?;
                    }
                    let bytes = wire::histogram::encode(&histogram);
                    self.histogram_raw_store
                        .store(&entry.metric, WindowDuration::RAW, vec![(granule_ts, bytes)], self.insert_chunk_size)
                        .await?;
                }
                MetricType::Counter => {
                    let mut counter = CounterBucket::empty();
                    for &value in values {
                        if value < 0 {
                            dropped_negatives.push(value);
                            continue;
                        }
                        counter.add(value as u64);
                    }
                    let bytes = wire::counter::encode(&counter);
                    self.counter_raw_store
                        .store(&entry.metric, WindowDuration::RAW, vec![(granule_ts, bytes)], self.insert_chunk_size)
                        .await?;
                }
            }

            outcome.groups_stored += 1;
        }

        if !dropped_negatives.is_empty() {
            outcome.negative_values_dropped += dropped_negatives.len();
            let metric = &entry.metric;
            rate_limited!(
                NEGATIVE_VALUE_WARNING_INTERVAL,
                tracing::warn!(metric = %metric, values = ?dropped_negatives, "dropped negative measurement values")
            );
        }

        if !self.meta_store.contains(&entry.metric).await? {
            self.meta_store.insert(&entry.metric).await?;
            outcome.newly_registered_metrics += 1;
        }

        Ok(())
    }

    /// Group `(timestamp, values)` pairs by `timestamp.aligned_to(ingest_granule)`,
    /// flattening every group's values into one combined list.
    fn group_by_granule(&self, measurements: &[(Timestamp, Vec<i64>)]) -> BTreeMap<i64, GranuleValues> {
        let mut groups: BTreeMap<i64, GranuleValues> = BTreeMap::new();
        for (ts, values) in measurements {
            let granule = ts.aligned_to(self.ingest_granule).millis();
            groups.entry(granule).or_default().extend(values.iter().copied());
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use windowcore_model::Metric;
    use windowcore_store::memory::{InMemoryBucketStore, InMemoryMetaStore};
    use windowcore_time::BucketNumber;

    fn ingest() -> (MeasurementIngest, Arc<InMemoryBucketStore<Vec<u8>>>, Arc<InMemoryBucketStore<Vec<u8>>>) {
        let histogram_store = Arc::new(InMemoryBucketStore::new());
        let counter_store = Arc::new(InMemoryBucketStore::new());
        let meta_store = Arc::new(InMemoryMetaStore::new());
        let ingest = MeasurementIngest::new(
            histogram_store.clone(),
            counter_store.clone(),
            meta_store,
            WindowDuration::from_millis(5_000),
            100,
        );
        (ingest, histogram_store, counter_store)
    }

    /// A tick that has not yet processed anything, so `already_processed`
    /// is false for every bucket used in these tests.
    fn not_yet_processed_tick() -> Tick {
        Tick::at(BucketNumber::new(-1, WindowDuration::RAW))
    }

    #[tokio::test]
    async fn negative_counter_values_are_dropped_and_warned_once() {
        let (ingest, _histogram, counters) = ingest();
        let metric = Metric::new("requests", MetricType::Counter);
        let batch = vec![MetricMeasurement::new(
            metric.clone(),
            vec![(Timestamp::from_millis(0), vec![3, -1, 4, -5, 2])],
        )];

        let outcome = ingest.store_metric_measurements(&batch, not_yet_processed_tick()).await.unwrap();
        check!(outcome.negative_values_dropped == 2);
        check!(outcome.groups_stored == 1);

        let slice = counters
            .slice(&metric, Timestamp::from_millis(0), Timestamp::from_millis(1), WindowDuration::RAW, 10)
            .await
            .unwrap();
        check!(slice.len() == 1);
        let decoded = wire::counter::decode(&slice[0].buckets[0]).unwrap();
        check!(decoded.sum() == 9);
    }

    #[tokio::test]
    async fn measurements_are_grouped_by_the_coarse_granule() {
        let (ingest, histogram, _counters) = ingest();
        let metric = Metric::new("latency", MetricType::Timer);
        let batch = vec![MetricMeasurement::new(
            metric.clone(),
            vec![
                (Timestamp::from_millis(100), vec![10]),
                (Timestamp::from_millis(4_999), vec![20]),
                (Timestamp::from_millis(5_001), vec![30]),
            ],
        )];

        let outcome = ingest.store_metric_measurements(&batch, not_yet_processed_tick()).await.unwrap();
        check!(outcome.groups_stored == 2);
        check!(histogram.row_count() == 2);
    }

    #[tokio::test]
    async fn a_metric_with_no_measurements_is_skipped_entirely() {
        let (ingest, histogram, counters) = ingest();
        let metric = Metric::new("idle", MetricType::Timer);
        let batch = vec![MetricMeasurement::new(metric, vec![])];

        let outcome = ingest.store_metric_measurements(&batch, not_yet_processed_tick()).await.unwrap();
        check!(outcome.groups_stored == 0);
        check!(outcome.newly_registered_metrics == 0);
        check!(histogram.row_count() == 0);
        check!(counters.row_count() == 0);
    }

    #[tokio::test]
    async fn first_sight_of_a_metric_registers_it_once() {
        let (ingest, _histogram, _counters) = ingest();
        let metric = Metric::new("latency", MetricType::Timer);
        let batch = vec![MetricMeasurement::new(metric, vec![(Timestamp::from_millis(0), vec![1])])];

        let outcome = ingest.store_metric_measurements(&batch, not_yet_processed_tick()).await.unwrap();
        check!(outcome.newly_registered_metrics == 1);

        let outcome_again = ingest.store_metric_measurements(&batch, not_yet_processed_tick()).await.unwrap();
        check!(outcome_again.newly_registered_metrics == 0);
    }

    #[tokio::test]
    async fn already_processed_is_logged_but_still_stores() {
        // current_tick far in the past relative to ts=0 means already_processed
        // is false; flip it so the warning path runs and assert storage still
        // happens regardless.
        let (ingest, histogram, _counters) = ingest();
        let metric = Metric::new("latency", MetricType::Timer);
        let batch = vec![MetricMeasurement::new(metric, vec![(Timestamp::from_millis(0), vec![1])])];

        let already_processed_tick = Tick::at(BucketNumber::new(1_000_000, WindowDuration::RAW));
        let outcome = ingest.store_metric_measurements(&batch, already_processed_tick).await.unwrap();
        check!(outcome.groups_stored == 1);
        check!(histogram.row_count() == 1);
    }
}
