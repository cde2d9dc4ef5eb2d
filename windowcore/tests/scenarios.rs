//! End-to-end scenarios spanning ingest, the window processor chain, the
//! bucket cache, and the in-memory stores together, mirroring the concrete
//! scenarios worked through by hand against the source system.

use std::sync::Arc;
use windowcore::{WindowCoreConfig, WindowCoreEngine};
use windowcore_model::{wire, HistogramBucket, Metric, MetricType, Summary};
use windowcore_store::memory::{InMemoryBucketStore, InMemoryMetaStore, InMemorySummaryStore};
use windowcore_store::{BucketStore, SummaryStore};
use windowcore_time::{TimeSource, Timestamp, WindowDuration};

fn histogram_bytes(values: impl IntoIterator<Item = u64>) -> Vec<u8> {
    let mut bucket = HistogramBucket::empty();
    for v in values {
        bucket.record(v).unwrap();
    }
    wire::histogram::encode(&bucket)
}

struct Harness {
    engine: WindowCoreEngine,
    histogram_bucket_store: Arc<InMemoryBucketStore<Vec<u8>>>,
    histogram_summary_store: Arc<InMemorySummaryStore<Summary>>,
}

fn harness(window_durations: Vec<WindowDuration>) -> Harness {
    let histogram_bucket_store = Arc::new(InMemoryBucketStore::new());
    let counter_bucket_store = Arc::new(InMemoryBucketStore::new());
    let histogram_summary_store = Arc::new(InMemorySummaryStore::new());
    let counter_summary_store = Arc::new(InMemorySummaryStore::new());
    let meta_store = Arc::new(InMemoryMetaStore::new());

    let config = WindowCoreConfig::default_for_durations(window_durations);
    let engine = WindowCoreEngine::new(
        config,
        histogram_bucket_store.clone(),
        counter_bucket_store,
        histogram_summary_store.clone(),
        counter_summary_store,
        meta_store,
        TimeSource::System,
    )
    .unwrap();

    Harness {
        engine,
        histogram_bucket_store,
        histogram_summary_store,
    }
}

#[tokio::test]
async fn two_bucket_summary_over_30s_window_from_1ms_raw() {
    use assert2::check;

    let harness = harness(vec![WindowDuration::from_millis(30_000)]);
    let w30s = WindowDuration::from_millis(30_000);
    let metric = Metric::new("latency", MetricType::Timer);

    harness
        .histogram_bucket_store
        .store(
            &metric,
            WindowDuration::RAW,
            vec![
                (Timestamp::from_millis(1), histogram_bytes(1..=50)),
                (Timestamp::from_millis(2), histogram_bytes(51..=100)),
                (Timestamp::from_millis(30_001), histogram_bytes([100, 100])),
            ],
            100,
        )
        .await
        .unwrap();

    let outcomes = harness.engine.roll_up(&metric, Timestamp::from_millis(30_001)).await.unwrap();
    check!(outcomes.len() == 1);
    let outcome = outcomes[0];
    check!(outcome.summaries_emitted == 2);
    check!(outcome.high_water_mark == Some(Timestamp::from_millis(30_000)));

    let bucket0 = harness
        .histogram_summary_store
        .get(&metric, w30s, Timestamp::from_millis(0))
        .unwrap();
    match bucket0 {
        Summary::Statistic(s) => {
            check!(s.count == 100);
            check!(s.min == 1);
            check!(s.max == 100);
            check!(s.p50 == 50);
            check!(s.p80 == 80);
            check!(s.p90 == 90);
            check!(s.p95 == 95);
            check!(s.p99 == 99);
            check!(s.p999 == 100);
        }
        other => panic!("expected a statistic summary, got {other:?}"),
    }

    let bucket1 = harness
        .histogram_summary_store
        .get(&metric, w30s, Timestamp::from_millis(30_000))
        .unwrap();
    match bucket1 {
        Summary::Statistic(s) => {
            check!(s.count == 2);
            check!(s.min == 100);
            check!(s.max == 100);
            check!(s.p999 == 100);
        }
        other => panic!("expected a statistic summary, got {other:?}"),
    }

    // All three raw rows were consumed and swept.
    let remaining = harness
        .histogram_bucket_store
        .slice(&metric, Timestamp::from_millis(0), Timestamp::from_millis(40_000), WindowDuration::RAW, 100)
        .await
        .unwrap();
    check!(remaining.is_empty());
}

#[tokio::test]
async fn reprocessing_an_interval_already_covered_by_h_is_a_no_op_but_still_sweeps() {
    use assert2::check;

    let harness = harness(vec![WindowDuration::from_millis(30_000)]);
    let metric = Metric::new("latency", MetricType::Timer);

    harness
        .histogram_bucket_store
        .store(
            &metric,
            WindowDuration::RAW,
            vec![(Timestamp::from_millis(15_000), histogram_bytes([42]))],
            100,
        )
        .await
        .unwrap();

    // First roll-up establishes H = 30_000 over the target bucket [0, 30000).
    let first = harness.engine.roll_up(&metric, Timestamp::from_millis(29_000)).await.unwrap();
    check!(first[0].summaries_emitted == 1);
    check!(first[0].high_water_mark == Some(Timestamp::from_millis(0)));

    // Re-seed a raw bucket inside the already-covered interval and re-run:
    // no new summary, but the stray raw row is still swept.
    harness
        .histogram_bucket_store
        .store(
            &metric,
            WindowDuration::RAW,
            vec![(Timestamp::from_millis(20_000), histogram_bytes([7]))],
            100,
        )
        .await
        .unwrap();

    let second = harness.engine.roll_up(&metric, Timestamp::from_millis(29_000)).await.unwrap();
    check!(second[0].summaries_emitted == 0);
    check!(second[0].high_water_mark == Some(Timestamp::from_millis(0)));

    let remaining = harness
        .histogram_bucket_store
        .slice(&metric, Timestamp::from_millis(0), Timestamp::from_millis(30_000), WindowDuration::RAW, 100)
        .await
        .unwrap();
    check!(remaining.is_empty());
}

#[tokio::test]
async fn empty_source_slice_is_a_complete_no_op() {
    use assert2::check;

    let harness = harness(vec![WindowDuration::from_millis(30_000)]);
    let metric = Metric::new("idle", MetricType::Timer);

    let outcomes = harness.engine.roll_up(&metric, Timestamp::from_millis(60_000)).await.unwrap();
    check!(outcomes[0].summaries_emitted == 0);
    check!(outcomes[0].high_water_mark == None);
}

#[tokio::test]
async fn multi_window_chain_rolls_raw_up_through_two_coarser_windows() {
    use assert2::check;

    let harness = harness(vec![WindowDuration::from_millis(1_000), WindowDuration::from_millis(30_000)]);
    let metric = Metric::new("latency", MetricType::Timer);

    // Seed 30 raw-window (1s) source rows from 0..30_000ms so they all
    // rebucket into the first w30s target bucket.
    let rows: Vec<_> = (0..30)
        .map(|n| (Timestamp::from_millis(n * 1_000), histogram_bytes([10 + n as u64])))
        .collect();
    harness
        .histogram_bucket_store
        .store(&metric, WindowDuration::from_millis(1_000), rows, 100)
        .await
        .unwrap();

    let outcomes = harness.engine.roll_up(&metric, Timestamp::from_millis(35_000)).await.unwrap();
    check!(outcomes.len() == 2);

    // The 1s -> 30s processor should have emitted one summary at target bucket 0.
    check!(outcomes[1].summaries_emitted == 1);
    let summary = harness
        .histogram_summary_store
        .get(&metric, WindowDuration::from_millis(30_000), Timestamp::from_millis(0))
        .unwrap();
    match summary {
        Summary::Statistic(s) => check!(s.count == 30),
        other => panic!("expected a statistic summary, got {other:?}"),
    }
}

#[tokio::test]
async fn ingest_then_roll_up_produces_a_summary_for_a_counter_metric() {
    use assert2::check;
    use windowcore_ingest::MetricMeasurement;

    let harness = harness(vec![WindowDuration::from_millis(5_000)]);
    let metric = Metric::new("requests", MetricType::Counter);

    let batch = vec![MetricMeasurement::new(
        metric.clone(),
        vec![(Timestamp::from_millis(0), vec![3, -1, 4, -5, 2])],
    )];
    let outcome = harness.engine.ingest_measurements(&batch).await.unwrap();
    check!(outcome.negative_values_dropped == 2);

    let rolled = harness.engine.roll_up(&metric, Timestamp::from_millis(10_000)).await.unwrap();
    check!(rolled[0].summaries_emitted == 1);
}

#[test]
fn configuration_error_aborts_construction_rather_than_surfacing_later() {
    use assert2::check;

    let config = WindowCoreConfig::default_for_durations(vec![]);
    let result = WindowCoreEngine::new(
        config,
        Arc::new(InMemoryBucketStore::new()),
        Arc::new(InMemoryBucketStore::new()),
        Arc::new(InMemorySummaryStore::new()),
        Arc::new(InMemorySummaryStore::new()),
        Arc::new(InMemoryMetaStore::new()),
        TimeSource::System,
    );
    check!(result.is_err());
}
