#![deny(missing_docs)]
//! The bucket and summary data model for windowed aggregation.
//!
//! This crate owns every type that crosses a store or cache boundary:
//! [`Metric`], the [`HistogramBucket`]/[`CounterBucket`] pair, [`Summary`],
//! and the versioned wire format they serialize to. It has no knowledge of
//! *how* buckets get persisted or cached — that's `windowcore-store` and
//! `windowcore-cache` — only of what a bucket or summary *is*.

mod error;
mod histogram_bucket;
mod metric;
mod summary;
pub mod wire;

pub use error::{Result, WindowCoreError};
pub use histogram_bucket::{CounterBucket, HistogramBucket};
pub use metric::{Metric, MetricType};
pub use summary::{CounterSummary, GaugeSummary, StatisticSummary, Summary};
