#![deny(missing_docs)]
//! `windowcore`: the time-window aggregation core of a distributed
//! time-series metrics platform.
//!
//! Raw 1ms measurements are folded up through a configured chain of
//! progressively coarser window durations (for example 1s → 30s → 5m),
//! producing per-metric summaries (percentiles for timers/gauges, running
//! sums for counters) at each level. The core tracks, per `(metric,
//! window)`, a high-water mark that makes re-processing the same interval a
//! no-op, and a bounded cache that lets a coarser window's processor skip
//! re-reading the store for buckets the next-finer processor just wrote.
//!
//! This crate re-exports the individual pipeline crates and wires them
//! together in [`WindowCoreEngine`]:
//!
//! - [`windowcore_time`]: integer-division bucket-number arithmetic and the
//!   pluggable clock.
//! - [`windowcore_model`]: the bucket/summary data model and wire format.
//! - [`windowcore_store`]: the persistence contracts and an in-memory
//!   reference implementation.
//! - [`windowcore_cache`]: the bounded, affinity-evicting bucket cache.
//! - [`windowcore_processor`]: the per-window roll-up algorithm.
//! - [`windowcore_ingest`]: the raw-window measurement write path.
//!
//! Out of scope, per `spec.md` §1: the column-store driver itself, a
//! network-facing read/write API, and metrics/observability of this system
//! (as opposed to the metrics it aggregates).

mod config;
mod engine;

pub use config::WindowCoreConfig;
pub use engine::WindowCoreEngine;

pub use windowcore_cache::{BucketCache, CacheConfig, CacheStats, MetricBucketCache, WindowBucketCaches};
pub use windowcore_ingest::{IngestOutcome, MeasurementBatch, MeasurementIngest, MetricMeasurement};
pub use windowcore_model::{
    CounterBucket, HistogramBucket, Metric, MetricType, Result, Summary, WindowCoreError,
};
pub use windowcore_processor::{BucketKind, CounterKind, HistogramKind, ProcessOutcome, WindowProcessor};
pub use windowcore_store::memory::{FailureInjector, InMemoryBucketStore, InMemoryMetaStore, InMemorySummaryStore};
pub use windowcore_store::{BucketRow, BucketSlice, BucketStore, MetaStore, SummaryStore};
pub use windowcore_time::{BucketNumber, Clock, Tick, TimeSource, Timestamp, WindowDuration};
