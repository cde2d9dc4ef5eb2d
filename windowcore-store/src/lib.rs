#![deny(missing_docs)]
//! Persistence contracts for windowed aggregation.
//!
//! This crate defines the boundary between the window processor and a
//! durable column store without depending on any particular database
//! driver: [`BucketStore`], [`SummaryStore`], and [`MetaStore`] describe the
//! shape of reads and writes the processor needs, and [`memory`] supplies an
//! in-memory implementation that satisfies them well enough to exercise the
//! whole pipeline in tests.
//!
//! The persisted layout these traits imply is documented on each trait: one
//! table per `(bucket kind, window duration)` keyed by `(metric, timestamp)`
//! holding an append-only blob list, one table per `(summary kind, window
//! duration)` keyed by `(metric, timestamp)` holding a single upserted blob,
//! and one meta table tracking each metric's last-processed timestamp per
//! window and its type descriptor.

mod contracts;
pub mod memory;

pub use contracts::{BucketRow, BucketSlice, BucketStore, MetaStore, SummaryStore};
