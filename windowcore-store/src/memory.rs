//! An in-memory reference implementation of the store contracts.
//!
//! Good enough to run every scenario the processor and ingest crates need to
//! test end to end: ordered per-`(metric, timestamp)` row storage, TTL
//! bookkeeping (recorded but never swept — sweeping belongs to the real
//! column store), batched writes that respect `insert_chunk_size`, and
//! optional failure injection for exercising the atomicity guarantees that
//! depend on a store call actually failing.

use crate::contracts::{BucketRow, BucketSlice, BucketStore, MetaStore, SummaryStore};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use windowcore_model::{Metric, Result, WindowCoreError};
use windowcore_time::{Timestamp, WindowDuration};

/// A row key ordered first by metric name, then by window width, then by
/// timestamp, so that a `BTreeMap` range query over a fixed `(metric,
/// window)` prefix naturally yields a timestamp-ascending slice.
type RowKey = (String, i64, i64);

fn row_key(metric: &Metric, window: WindowDuration, ts: Timestamp) -> RowKey {
    (metric.name().to_string(), window.millis(), ts.millis())
}

/// Shared failure-injection knob for the in-memory stores, so tests can
/// force the next `n` calls to a store to fail with [`WindowCoreError::Transient`].
///
/// Modeled as a simple countdown rather than a predicate: once the count
/// reaches zero, calls succeed again, so a test can inject a single failure
/// in the middle of a processing run without hand-tracking call counts.
#[derive(Debug, Default)]
pub struct FailureInjector {
    remaining: AtomicUsize,
}

impl FailureInjector {
    /// A failure injector that never fails until configured otherwise.
    pub fn new() -> Arc<Self> {
        Arc::new(FailureInjector {
            remaining: AtomicUsize::new(0),
        })
    }

    /// Make the next `n` store calls fail transiently.
    pub fn fail_next(&self, n: usize) {
        self.remaining.store(n, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        loop {
            let current = self.remaining.load(Ordering::SeqCst);
            if current == 0 {
                return Ok(());
            }
            if self
                .remaining
                .compare_exchange(current, current - 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return Err(WindowCoreError::Transient("injected failure".into()));
            }
        }
    }
}

/// An in-memory [`BucketStore`] backed by a single ordered map across all
/// window durations.
#[derive(Debug)]
pub struct InMemoryBucketStore<T> {
    rows: Mutex<BTreeMap<RowKey, Vec<T>>>,
    retention: Mutex<BTreeMap<i64, Duration>>,
    batches_issued: AtomicUsize,
    failures: Arc<FailureInjector>,
}

impl<T> Default for InMemoryBucketStore<T> {
    fn default() -> Self {
        InMemoryBucketStore {
            rows: Mutex::new(BTreeMap::new()),
            retention: Mutex::new(BTreeMap::new()),
            batches_issued: AtomicUsize::new(0),
            failures: FailureInjector::new(),
        }
    }
}

impl<T> InMemoryBucketStore<T> {
    /// An empty store with no failure injection.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty store whose fallible calls consult `failures`.
    pub fn with_failures(failures: Arc<FailureInjector>) -> Self {
        InMemoryBucketStore {
            failures,
            ..Self::default()
        }
    }

    /// Record a retention period for `window`. Bookkeeping only: the
    /// in-memory store never sweeps expired rows, matching the real column
    /// store's TTL sweep being out of scope for this crate.
    pub fn set_retention(&self, window: WindowDuration, ttl: Duration) {
        self.retention.lock().insert(window.millis(), ttl);
    }

    /// How many distinct batched write calls have been issued so far, for
    /// tests asserting on `insert_chunk_size` behavior.
    pub fn batches_issued(&self) -> usize {
        self.batches_issued.load(Ordering::SeqCst)
    }

    /// The number of rows currently resident, across every metric and
    /// window, for tests asserting on `remove`.
    pub fn row_count(&self) -> usize {
        self.rows.lock().len()
    }
}

#[async_trait]
impl<T> BucketStore<T> for InMemoryBucketStore<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn slice(
        &self,
        metric: &Metric,
        from: Timestamp,
        to: Timestamp,
        source_window: WindowDuration,
        limit: usize,
    ) -> Result<BucketSlice<T>> {
        self.failures.check()?;

        let lower = row_key(metric, source_window, from);
        let upper = row_key(metric, source_window, to);
        let rows = self.rows.lock();
        Ok(rows
            .range(lower..upper)
            .take(limit)
            .map(|((_, _, ts), buckets)| BucketRow {
                timestamp: Timestamp::from_millis(*ts),
                buckets: buckets.clone(),
            })
            .collect())
    }

    async fn store(
        &self,
        metric: &Metric,
        window: WindowDuration,
        buckets: Vec<(Timestamp, T)>,
        insert_chunk_size: usize,
    ) -> Result<()> {
        self.failures.check()?;
        let chunk_size = insert_chunk_size.max(1);

        for chunk in buckets.chunks(chunk_size) {
            let mut rows = self.rows.lock();
            for (ts, bucket) in chunk {
                rows.entry(row_key(metric, window, *ts)).or_default().push(bucket.clone());
            }
            drop(rows);
            self.batches_issued.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn remove(&self, metric: &Metric, window: WindowDuration, timestamps: &[Timestamp]) -> Result<()> {
        self.failures.check()?;
        let mut rows = self.rows.lock();
        for ts in timestamps {
            rows.remove(&row_key(metric, window, *ts));
        }
        Ok(())
    }
}

/// An in-memory [`SummaryStore`], upserting a single blob per `(metric,
/// window, timestamp)`.
#[derive(Debug)]
pub struct InMemorySummaryStore<S> {
    rows: Mutex<BTreeMap<RowKey, S>>,
    failures: Arc<FailureInjector>,
}

impl<S> Default for InMemorySummaryStore<S> {
    fn default() -> Self {
        InMemorySummaryStore {
            rows: Mutex::new(BTreeMap::new()),
            failures: FailureInjector::new(),
        }
    }
}

impl<S> InMemorySummaryStore<S> {
    /// An empty store with no failure injection.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty store whose fallible calls consult `failures`.
    pub fn with_failures(failures: Arc<FailureInjector>) -> Self {
        InMemorySummaryStore {
            failures,
            ..Self::default()
        }
    }

    /// The currently stored summary for `(metric, window, ts)`, for test
    /// assertions.
    pub fn get(&self, metric: &Metric, window: WindowDuration, ts: Timestamp) -> Option<S>
    where
        S: Clone,
    {
        self.rows.lock().get(&row_key(metric, window, ts)).cloned()
    }
}

#[async_trait]
impl<S> SummaryStore<S> for InMemorySummaryStore<S>
where
    S: Clone + Send + Sync + 'static,
{
    async fn store(&self, metric: &Metric, window: WindowDuration, summaries: Vec<(Timestamp, S)>) -> Result<()> {
        self.failures.check()?;
        let mut rows = self.rows.lock();
        for (ts, summary) in summaries {
            rows.insert(row_key(metric, window, ts), summary);
        }
        Ok(())
    }
}

/// An in-memory [`MetaStore`] tracking per-metric, per-window progress and
/// metric registration with concurrent maps, since metadata lookups happen
/// on every processing tick for every known metric.
#[derive(Debug, Default)]
pub struct InMemoryMetaStore {
    last_processed: DashMap<(String, i64), Timestamp>,
    registered: DashMap<String, ()>,
    failures: Arc<FailureInjector>,
}

impl InMemoryMetaStore {
    /// An empty meta store with no failure injection.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty meta store whose fallible calls consult `failures`.
    pub fn with_failures(failures: Arc<FailureInjector>) -> Self {
        InMemoryMetaStore {
            failures,
            ..Self::default()
        }
    }
}

#[async_trait]
impl MetaStore for InMemoryMetaStore {
    async fn get_last_processed(&self, metric: &Metric, window: WindowDuration) -> Result<Option<Timestamp>> {
        self.failures.check()?;
        Ok(self
            .last_processed
            .get(&(metric.name().to_string(), window.millis()))
            .map(|ts| *ts))
    }

    async fn update_last_processed(&self, metric: &Metric, window: WindowDuration, ts: Timestamp) -> Result<()> {
        self.failures.check()?;
        self.last_processed.insert((metric.name().to_string(), window.millis()), ts);
        Ok(())
    }

    async fn insert(&self, metric: &Metric) -> Result<()> {
        self.failures.check()?;
        self.registered.entry(metric.name().to_string()).or_insert(());
        Ok(())
    }

    async fn contains(&self, metric: &Metric) -> Result<bool> {
        self.failures.check()?;
        Ok(self.registered.contains_key(metric.name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use windowcore_model::MetricType;

    fn metric(name: &str) -> Metric {
        Metric::new(name, MetricType::Timer)
    }

    #[tokio::test]
    async fn store_then_slice_round_trips_in_timestamp_order() {
        let store: InMemoryBucketStore<u8> = InMemoryBucketStore::new();
        let m = metric("latency");
        let w = WindowDuration::from_millis(1);

        store
            .store(
                &m,
                w,
                vec![(Timestamp::from_millis(2), 2), (Timestamp::from_millis(1), 1)],
                10,
            )
            .await
            .unwrap();

        let slice = store
            .slice(&m, Timestamp::from_millis(0), Timestamp::from_millis(10), w, 100)
            .await
            .unwrap();
        let timestamps: Vec<i64> = slice.iter().map(|row| row.timestamp.millis()).collect();
        check!(timestamps == vec![1, 2]);
    }

    #[tokio::test]
    async fn store_respects_insert_chunk_size() {
        let store: InMemoryBucketStore<u8> = InMemoryBucketStore::new();
        let m = metric("latency");
        let w = WindowDuration::from_millis(1);
        let buckets: Vec<_> = (0..5).map(|i| (Timestamp::from_millis(i), i as u8)).collect();

        store.store(&m, w, buckets, 2).await.unwrap();
        check!(store.batches_issued() == 3);
    }

    #[tokio::test]
    async fn remove_deletes_the_row() {
        let store: InMemoryBucketStore<u8> = InMemoryBucketStore::new();
        let m = metric("latency");
        let w = WindowDuration::from_millis(1);
        store.store(&m, w, vec![(Timestamp::from_millis(1), 9)], 10).await.unwrap();
        check!(store.row_count() == 1);

        store.remove(&m, w, &[Timestamp::from_millis(1)]).await.unwrap();
        check!(store.row_count() == 0);
    }

    #[tokio::test]
    async fn injected_failure_surfaces_as_transient() {
        let failures = FailureInjector::new();
        let store: InMemoryBucketStore<u8> = InMemoryBucketStore::with_failures(failures.clone());
        failures.fail_next(1);

        let m = metric("latency");
        let w = WindowDuration::from_millis(1);
        let err = store.store(&m, w, vec![(Timestamp::from_millis(1), 1)], 10).await.unwrap_err();
        check!(err.is_transient());

        store.store(&m, w, vec![(Timestamp::from_millis(1), 1)], 10).await.unwrap();
    }

    #[tokio::test]
    async fn meta_store_tracks_last_processed_and_registration() {
        let meta = InMemoryMetaStore::new();
        let m = metric("latency");
        let w = WindowDuration::from_millis(1);

        check!(meta.get_last_processed(&m, w).await.unwrap() == None);
        check!(!meta.contains(&m).await.unwrap());

        meta.insert(&m).await.unwrap();
        meta.update_last_processed(&m, w, Timestamp::from_millis(42)).await.unwrap();

        check!(meta.contains(&m).await.unwrap());
        check!(meta.get_last_processed(&m, w).await.unwrap() == Some(Timestamp::from_millis(42)));
    }
}
