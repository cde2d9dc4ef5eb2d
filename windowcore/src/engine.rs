use crate::config::WindowCoreConfig;
use std::sync::Arc;
use windowcore_cache::{BucketCache, CacheConfig};
use windowcore_ingest::{IngestOutcome, MeasurementBatch, MeasurementIngest};
use windowcore_model::{Metric, MetricType, Result, Summary};
use windowcore_processor::{BucketKind, CounterKind, HistogramKind, ProcessOutcome, WindowProcessor};
use windowcore_store::memory::{InMemoryBucketStore, InMemoryMetaStore, InMemorySummaryStore};
use windowcore_store::{BucketStore, MetaStore, SummaryStore};
use windowcore_time::{Tick, TimeSource, Timestamp, WindowDuration};

fn cache_config(config: &WindowCoreConfig) -> CacheConfig {
    CacheConfig {
        enabled: config.cache_enabled,
        enabled_for: config.cache_enabled_for.clone(),
        max_metrics: config.cache_max_metrics,
        max_store: config.cache_max_store,
    }
}

/// Build the consecutive chain of `(source, target)` window processors for
/// one bucket kind: raw → `durations[0]` → `durations[1]` → … Every
/// processor in the chain shares the same bucket store, summary store, meta
/// store, and — critically — the same [`BucketCache`] instance, since a
/// bucket number's duration is part of its identity and one cache naturally
/// partitions entries by window.
fn build_chain<K: BucketKind>(
    config: &WindowCoreConfig,
    bucket_store: Arc<dyn BucketStore<Vec<u8>>>,
    summary_store: Arc<dyn SummaryStore<Summary>>,
    meta_store: Arc<dyn MetaStore>,
    cache: Arc<BucketCache>,
) -> Vec<WindowProcessor<K>> {
    let mut processors = Vec::with_capacity(config.window_durations.len());
    let mut source = WindowDuration::RAW;
    for &target in &config.window_durations {
        processors.push(WindowProcessor::<K>::new(
            source,
            target,
            WindowDuration::RAW,
            bucket_store.clone(),
            summary_store.clone(),
            meta_store.clone(),
            cache.clone(),
            config.insert_chunk_size,
            config.source_fetch_size,
        ));
        source = target;
    }
    processors
}

/// A complete, wired-up time-window aggregation pipeline: one chain of
/// [`WindowProcessor`]s per bucket kind (raw → `W1` → `W2` → …), one
/// [`MeasurementIngest`] feeding the raw window, and the bucket caches and
/// meta store every processor in a chain reads and writes through.
///
/// This is the integration point the individual crates (`windowcore-time`,
/// `windowcore-model`, `windowcore-store`, `windowcore-cache`,
/// `windowcore-processor`, `windowcore-ingest`) are designed to be wired
/// into. [`WindowCoreEngine::new`] accepts any implementation of the store
/// traits, so a production deployment plugs in column-store-backed stores
/// and otherwise uses this type unchanged; [`WindowCoreEngine::in_memory`]
/// wires the in-memory reference stores for tests and examples.
pub struct WindowCoreEngine {
    config: WindowCoreConfig,
    ingest: MeasurementIngest,
    histogram_processors: Vec<WindowProcessor<HistogramKind>>,
    counter_processors: Vec<WindowProcessor<CounterKind>>,
    histogram_cache: Arc<BucketCache>,
    counter_cache: Arc<BucketCache>,
    time_source: TimeSource,
}

impl WindowCoreEngine {
    /// Wire a complete pipeline from explicit store implementations,
    /// validating `config` up front (`spec.md` §7: configuration errors
    /// abort startup rather than surfacing lazily during processing).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: WindowCoreConfig,
        histogram_bucket_store: Arc<dyn BucketStore<Vec<u8>>>,
        counter_bucket_store: Arc<dyn BucketStore<Vec<u8>>>,
        histogram_summary_store: Arc<dyn SummaryStore<Summary>>,
        counter_summary_store: Arc<dyn SummaryStore<Summary>>,
        meta_store: Arc<dyn MetaStore>,
        time_source: TimeSource,
    ) -> Result<Self> {
        config.validate()?;

        let histogram_cache = Arc::new(BucketCache::new(cache_config(&config), WindowDuration::RAW));
        let counter_cache = Arc::new(BucketCache::new(cache_config(&config), WindowDuration::RAW));

        let histogram_processors = build_chain::<HistogramKind>(
            &config,
            histogram_bucket_store.clone(),
            histogram_summary_store,
            meta_store.clone(),
            histogram_cache.clone(),
        );
        let counter_processors = build_chain::<CounterKind>(
            &config,
            counter_bucket_store.clone(),
            counter_summary_store,
            meta_store.clone(),
            counter_cache.clone(),
        );

        let ingest_granule_millis = i64::try_from(config.ingest_granule.as_millis()).unwrap_or(i64::MAX);
        let ingest = MeasurementIngest::new(
            histogram_bucket_store,
            counter_bucket_store,
            meta_store,
            WindowDuration::from_millis(ingest_granule_millis.max(1)),
            config.insert_chunk_size,
        );

        Ok(WindowCoreEngine {
            config,
            ingest,
            histogram_processors,
            counter_processors,
            histogram_cache,
            counter_cache,
            time_source,
        })
    }

    /// Build a self-contained pipeline backed entirely by in-memory
    /// reference stores: one histogram and one counter
    /// [`InMemoryBucketStore`], one histogram and one counter
    /// [`InMemorySummaryStore`], and a single shared [`InMemoryMetaStore`].
    /// Sufficient to exercise the full pipeline end to end in tests and
    /// examples, per `spec.md`'s non-goal on the column-store driver.
    pub fn in_memory(config: WindowCoreConfig) -> Result<Self> {
        Self::new(
            config,
            Arc::new(InMemoryBucketStore::new()),
            Arc::new(InMemoryBucketStore::new()),
            Arc::new(InMemorySummaryStore::new()),
            Arc::new(InMemorySummaryStore::new()),
            Arc::new(InMemoryMetaStore::new()),
            TimeSource::System,
        )
    }

    /// The validated configuration this engine was built from.
    pub fn config(&self) -> &WindowCoreConfig {
        &self.config
    }

    /// Derive the current processing tick from this engine's time source,
    /// lagged by `config.tick_safety_interval`.
    pub fn tick_now(&self) -> Tick {
        Tick::now(&self.time_source, WindowDuration::RAW, self.config.tick_safety_interval)
    }

    /// Store a batch of measurements at the raw window, classified and
    /// grouped per `spec.md` §4.E.
    pub async fn ingest_measurements(&self, batch: &MeasurementBatch) -> Result<IngestOutcome> {
        self.ingest.store_metric_measurements(batch, self.tick_now()).await
    }

    /// Run every configured window's roll-up for `metric`, in ascending
    /// window order, through `execution_ts`.
    ///
    /// Windows are processed strictly in order because each processor's
    /// source window is the previous processor's target window: the next
    /// processor in the chain can only see what the previous one has
    /// already persisted, so this is a sequential `.await` chain, not a
    /// concurrent fan-out.
    pub async fn roll_up(&self, metric: &Metric, execution_ts: Timestamp) -> Result<Vec<ProcessOutcome>> {
        match metric.metric_type() {
            MetricType::Timer | MetricType::Gauge => {
                self.roll_up_chain(&self.histogram_processors, metric, execution_ts).await
            }
            MetricType::Counter => self.roll_up_chain(&self.counter_processors, metric, execution_ts).await,
        }
    }

    async fn roll_up_chain<K: BucketKind>(
        &self,
        chain: &[WindowProcessor<K>],
        metric: &Metric,
        execution_ts: Timestamp,
    ) -> Result<Vec<ProcessOutcome>> {
        let mut outcomes = Vec::with_capacity(chain.len());
        for processor in chain {
            outcomes.push(processor.process(metric, execution_ts).await?);
        }
        Ok(outcomes)
    }

    /// Advance both bucket caches' affinity-eviction clock to `tick`,
    /// dropping cached metrics whose entries no longer cover the previous
    /// tick's interval. Callers invoke this once per tick, independent of
    /// how many metrics were processed under it.
    pub fn mark_processed_tick(&self, tick: Tick) {
        self.histogram_cache.mark_processed_tick(tick);
        self.counter_cache.mark_processed_tick(tick);
    }
}
