use crate::{CacheConfig, CacheStats};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use windowcore_model::Metric;
use windowcore_time::{BucketNumber, Tick, WindowDuration};

/// No prior tick has ever been marked, so the first `mark_processed_tick`
/// call never triggers an affinity sweep.
const NO_PRIOR_TICK: i64 = i64::MIN;

/// The lower level of the cache for a single metric: a concurrent map from
/// bucket number to serialized bytes, an empty vector standing in for the
/// `EmptyBucket` sentinel.
#[derive(Debug, Default)]
pub struct MetricBucketCache {
    buckets: DashMap<BucketNumber, Vec<u8>>,
}

impl MetricBucketCache {
    fn covers(&self, timestamp: windowcore_time::Timestamp) -> bool {
        self.buckets
            .iter()
            .any(|entry| entry.key().start_timestamp() <= timestamp && timestamp < entry.key().end_timestamp())
    }

    /// The number of bucket-number slots currently resident for this metric.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Whether this metric currently has no resident bucket-number slots.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// One top-level bucket cache: a bounded mapping from [`Metric`] to a
/// [`MetricBucketCache`], admission-capped by `max_metrics`.
#[derive(Debug)]
pub struct BucketCache {
    config: CacheConfig,
    raw_duration: WindowDuration,
    metrics: DashMap<Metric, Arc<MetricBucketCache>>,
    admitted: AtomicUsize,
    last_known_tick: AtomicI64,
    stats: CacheStats,
}

impl BucketCache {
    /// Build an empty cache under the given admission policy.
    pub fn new(config: CacheConfig, raw_duration: WindowDuration) -> Self {
        BucketCache {
            config,
            raw_duration,
            metrics: DashMap::new(),
            admitted: AtomicUsize::new(0),
            last_known_tick: AtomicI64::new(NO_PRIOR_TICK),
            stats: CacheStats::default(),
        }
    }

    /// Internal counters for test assertions against `spec.md` §8.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// The number of metrics currently holding a live cache entry.
    pub fn resident_metric_count(&self) -> usize {
        self.metrics.len()
    }

    fn get_or_admit(&self, metric: &Metric) -> Option<Arc<MetricBucketCache>> {
        if let Some(existing) = self.metrics.get(metric) {
            return Some(existing.value().clone());
        }

        let admitted = self.admitted.fetch_add(1, Ordering::SeqCst) + 1;
        if admitted > self.config.max_metrics {
            self.admitted.fetch_sub(1, Ordering::SeqCst);
            return None;
        }

        let entry = Arc::new(MetricBucketCache::default());
        match self.metrics.entry(metric.clone()) {
            Entry::Occupied(occupied) => {
                // Lost the race to another inserter for this same metric;
                // release the admission slot we reserved for nothing.
                self.admitted.fetch_sub(1, Ordering::SeqCst);
                Some(occupied.get().clone())
            }
            Entry::Vacant(vacant) => {
                vacant.insert(entry.clone());
                Some(entry)
            }
        }
    }

    /// Insert `buckets` for `metric` across `[from, to)`, filling any
    /// uncovered slot with the `EmptyBucket` sentinel.
    ///
    /// Returns `false` without writing anything if caching is disabled for
    /// `metric`'s type, the requested span exceeds `max_store`, or the
    /// metric could not be admitted under the soft cap this turn.
    pub fn multi_set(
        &self,
        metric: &Metric,
        from: BucketNumber,
        to: BucketNumber,
        buckets: Vec<(BucketNumber, Vec<u8>)>,
    ) -> bool {
        if !self.config.is_enabled_for(metric.metric_type()) {
            return false;
        }
        let span = to.number() - from.number() - 1;
        if span > self.config.max_store {
            return false;
        }

        let Some(entry) = self.get_or_admit(metric) else {
            return false;
        };

        for (bn, bytes) in buckets {
            match entry.buckets.entry(bn) {
                Entry::Occupied(mut occupied) => {
                    tracing::warn!(metric = %metric, bucket = %bn, "replacing cached bucket, insert collision");
                    self.stats.record_collision();
                    occupied.insert(bytes);
                }
                Entry::Vacant(vacant) => {
                    vacant.insert(bytes);
                }
            }
        }

        for n in from.number()..to.number() {
            let bn = BucketNumber::new(n, from.duration());
            entry.buckets.entry(bn).or_insert_with(Vec::new);
        }

        true
    }

    /// Remove and return every bucket-number slot for `metric` across
    /// `[from, to)`, reporting a hit only if every slot was present.
    ///
    /// Always disabled (returns `None` without touching anything) when
    /// `from`'s duration is the raw window: the cache only ever serves
    /// roll-ups, never raw reads.
    pub fn multi_get(&self, metric: &Metric, from: BucketNumber, to: BucketNumber) -> Option<Vec<(BucketNumber, Vec<u8>)>> {
        if from.duration() == self.raw_duration {
            return None;
        }

        let Some(entry) = self.metrics.get(metric).map(|r| r.value().clone()) else {
            self.stats.record_miss();
            return None;
        };

        let expected = (to.number() - from.number()) as usize;
        let mut collected = Vec::with_capacity(expected);
        for n in from.number()..to.number() {
            let bn = BucketNumber::new(n, from.duration());
            if let Some((_, bytes)) = entry.buckets.remove(&bn) {
                collected.push((bn, bytes));
            }
        }

        if collected.len() == expected {
            let sentinel_only = collected.iter().all(|(_, bytes)| bytes.is_empty());
            self.stats.record_hit(sentinel_only);
            Some(collected)
        } else {
            self.stats.record_miss();
            None
        }
    }

    /// Atomically advance the last-known tick. If the tick actually moved,
    /// drop every resident metric whose cache holds no bucket covering the
    /// *previous* tick's interval — the affinity-eviction sweep.
    pub fn mark_processed_tick(&self, tick: Tick) {
        let new_value = tick.bucket_number().number();
        let previous_value = self.last_known_tick.swap(new_value, Ordering::SeqCst);
        if previous_value == new_value || previous_value == NO_PRIOR_TICK {
            return;
        }

        let previous_timestamp = BucketNumber::new(previous_value, self.raw_duration).start_timestamp();
        let to_drop: Vec<Metric> = self
            .metrics
            .iter()
            .filter(|kv| !kv.value().covers(previous_timestamp))
            .map(|kv| kv.key().clone())
            .collect();

        for metric in to_drop {
            if self.metrics.remove(&metric).is_some() {
                self.admitted.fetch_sub(1, Ordering::SeqCst);
                self.stats.record_eviction();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use std::collections::HashSet;
    use windowcore_model::MetricType;

    fn config(max_metrics: usize, max_store: i64) -> CacheConfig {
        CacheConfig {
            enabled: true,
            enabled_for: HashSet::from([MetricType::Timer, MetricType::Gauge, MetricType::Counter]),
            max_metrics,
            max_store,
        }
    }

    fn metric(name: &str) -> Metric {
        Metric::new(name, MetricType::Timer)
    }

    #[test]
    fn multi_set_fills_gaps_with_empty_sentinels() {
        let cache = BucketCache::new(config(10, 100), WindowDuration::RAW);
        let w = WindowDuration::from_millis(1000);
        let m = metric("latency");
        let from = BucketNumber::new(0, w);
        let to = BucketNumber::new(3, w);

        let written = cache.multi_set(&m, from, to, vec![(BucketNumber::new(1, w), vec![9])]);
        check!(written);

        let got = cache.multi_get(&m, from, to).unwrap();
        check!(got.len() == 3);
        check!(got.iter().find(|(bn, _)| *bn == BucketNumber::new(1, w)).unwrap().1 == vec![9]);
        check!(got.iter().find(|(bn, _)| *bn == BucketNumber::new(0, w)).unwrap().1.is_empty());
    }

    #[test]
    fn multi_get_is_disabled_at_raw_duration() {
        let cache = BucketCache::new(config(10, 100), WindowDuration::RAW);
        let m = metric("latency");
        let from = BucketNumber::new(0, WindowDuration::RAW);
        let to = BucketNumber::new(2, WindowDuration::RAW);
        check!(cache.multi_get(&m, from, to).is_none());
    }

    #[test]
    fn multi_get_removes_on_read_so_a_second_get_misses() {
        let cache = BucketCache::new(config(10, 100), WindowDuration::RAW);
        let w = WindowDuration::from_millis(1000);
        let m = metric("latency");
        let from = BucketNumber::new(0, w);
        let to = BucketNumber::new(2, w);

        cache.multi_set(&m, from, to, vec![]);
        check!(cache.multi_get(&m, from, to).is_some());
        check!(cache.multi_get(&m, from, to).is_none());
    }

    #[test]
    fn multi_set_respects_max_store_span() {
        let cache = BucketCache::new(config(10, 1), WindowDuration::RAW);
        let w = WindowDuration::from_millis(1000);
        let m = metric("latency");
        let from = BucketNumber::new(0, w);
        let to = BucketNumber::new(5, w);
        check!(!cache.multi_set(&m, from, to, vec![]));
    }

    #[test]
    fn admission_cap_refuses_beyond_max_metrics() {
        let cache = BucketCache::new(config(1, 100), WindowDuration::RAW);
        let w = WindowDuration::from_millis(1000);
        let from = BucketNumber::new(0, w);
        let to = BucketNumber::new(1, w);

        check!(cache.multi_set(&metric("a"), from, to, vec![]));
        check!(!cache.multi_set(&metric("b"), from, to, vec![]));
        check!(cache.resident_metric_count() == 1);
    }

    #[test]
    fn affinity_eviction_drops_metrics_with_no_coverage_of_previous_tick() {
        let cache = BucketCache::new(config(10, 100), WindowDuration::RAW);
        let raw = WindowDuration::RAW;
        let covering = metric("covering");
        let stale = metric("stale");

        // `covering` has a bucket spanning raw bucket number 5; `stale` only
        // has a bucket spanning raw bucket number 500.
        cache.multi_set(&covering, BucketNumber::new(5, raw), BucketNumber::new(6, raw), vec![]);
        cache.multi_set(&stale, BucketNumber::new(500, raw), BucketNumber::new(501, raw), vec![]);

        cache.mark_processed_tick(Tick::at(BucketNumber::new(5, raw)));
        cache.mark_processed_tick(Tick::at(BucketNumber::new(1000, raw)));

        check!(cache.resident_metric_count() == 1);
        check!(cache.metrics.contains_key(&covering));
    }
}
