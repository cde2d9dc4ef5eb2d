#![deny(missing_docs)]
//! A bounded, two-level cache of serialized buckets that feeds the window
//! processor so it can skip re-reading the store for buckets it just wrote.
//!
//! Topology: the top level bounds the count of distinct cached metrics
//! (soft cap, atomic admission counter); the lower level, one per metric, is
//! a concurrent map from [`BucketNumber`] to serialized bytes, where an
//! empty byte vector is the `EmptyBucket` sentinel. [`WindowBucketCaches`]
//! holds the two independent top-level caches the spec calls for — one for
//! histogram buckets, one for counter buckets — since the payload is opaque
//! bytes either way and only the admission/eviction policy needs to be
//! duplicated.

mod cache;
mod stats;

pub use cache::{BucketCache, MetricBucketCache};
pub use stats::CacheStats;

use windowcore_model::MetricType;
use windowcore_time::WindowDuration;
use std::collections::HashSet;

/// Construction parameters for one [`BucketCache`].
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Global on/off switch for this cache.
    pub enabled: bool,
    /// Which metric types are eligible for caching.
    pub enabled_for: HashSet<MetricType>,
    /// Soft cap on the number of distinct cached metrics.
    pub max_metrics: usize,
    /// Maximum span `(to - from - 1)` a single `multi_set` call may insert.
    pub max_store: i64,
}

impl CacheConfig {
    /// Whether `metric_type` is eligible for caching under this config.
    pub fn is_enabled_for(&self, metric_type: MetricType) -> bool {
        self.enabled && self.enabled_for.contains(&metric_type)
    }
}

/// The pair of independent top-level caches: one for serialized
/// [`windowcore_model::HistogramBucket`]s, one for serialized
/// [`windowcore_model::CounterBucket`]s.
#[derive(Debug)]
pub struct WindowBucketCaches {
    /// The cache of serialized histogram buckets (Timer and Gauge metrics).
    pub histogram: BucketCache,
    /// The cache of serialized counter buckets (Counter metrics).
    pub counter: BucketCache,
}

impl WindowBucketCaches {
    /// Build both caches from the same admission policy, with the raw
    /// window duration used to disable `multi_get` at the raw resolution.
    pub fn new(config: CacheConfig, raw_duration: WindowDuration) -> Self {
        WindowBucketCaches {
            histogram: BucketCache::new(config.clone(), raw_duration),
            counter: BucketCache::new(config, raw_duration),
        }
    }
}
