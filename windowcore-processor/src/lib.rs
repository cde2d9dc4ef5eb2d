#![deny(missing_docs)]
//! The window processor: per-metric, per-window aggregation that folds
//! source buckets into target-window buckets, derives summaries, persists
//! both, and advances a per-metric high-water mark with idempotency
//! guarantees.
//!
//! This crate has no scheduling logic of its own — it does not decide *when*
//! to run or *which* metric to run for. An external dispatcher (out of
//! scope, per `spec.md` §1) calls [`WindowProcessor::process`] once per
//! `(metric, window)` pair per tick; this crate only guarantees that one
//! invocation is safe to retry and that two invocations for the same pair
//! compose correctly regardless of how late or how often they're called.

mod bucket_kind;
mod outcome;
mod processor;

pub use bucket_kind::{BucketKind, CounterKind, HistogramKind};
pub use outcome::ProcessOutcome;
pub use processor::WindowProcessor;
