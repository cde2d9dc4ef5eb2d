#![deny(missing_docs)]
//! Time and bucket-number primitives for windowed aggregation.
//!
//! This crate has no knowledge of metrics, histograms, or storage — it only
//! provides the integer arithmetic that every other `windowcore` crate builds
//! on: aligning a millisecond timestamp to a window duration, converting a
//! timestamp into a [`BucketNumber`], and re-bucketing a bucket number from
//! one duration to a coarser one.
//!
//! All arithmetic is integer division on milliseconds. There is no
//! floating-point anywhere in this crate: drift at the boundary between two
//! buckets would silently corrupt the partitioning invariants every other
//! component depends on.

mod bucket;
mod clock;
mod duration;
mod tick;
mod timestamp;

pub mod fakes;

pub use bucket::BucketNumber;
pub use clock::{Clock, TimeSource};
pub use duration::WindowDuration;
pub use tick::Tick;
pub use timestamp::Timestamp;
