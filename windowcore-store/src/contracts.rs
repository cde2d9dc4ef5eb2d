use async_trait::async_trait;
use windowcore_model::{Metric, Result};
use windowcore_time::{Timestamp, WindowDuration};

/// One stored row: the buckets appended for a single `(metric, timestamp)`
/// key. A row can hold more than one bucket because storage appends rather
/// than overwrites — repeated `store` calls for the same timestamp grow the
/// same row's blob list.
#[derive(Debug, Clone)]
pub struct BucketRow<T> {
    /// The timestamp this row is keyed on.
    pub timestamp: Timestamp,
    /// The buckets appended to this row, oldest append first.
    pub buckets: Vec<T>,
}

/// An ordered, timestamp-ascending page of [`BucketRow`]s returned by
/// [`BucketStore::slice`].
pub type BucketSlice<T> = Vec<BucketRow<T>>;

/// Durable storage for serialized buckets of a single kind (histogram or
/// counter), across all window durations.
///
/// Persisted as one column-store table per `(bucket kind, window duration)`:
/// `(metric text, timestamp i64, buckets list<blob>)`, primary key
/// `(metric, timestamp)`, `gc_grace_seconds = 0`, leveled compaction. `T` is
/// the wire-encoded blob type the caller chooses to store — typically the
/// `Vec<u8>` produced by `windowcore_model::wire`.
#[async_trait]
pub trait BucketStore<T>: Send + Sync
where
    T: Clone + Send + Sync + 'static,
{
    /// Read buckets for `metric` at `source_window` whose timestamps fall in
    /// `[from, to)`, up to `limit` rows, ordered by timestamp ascending.
    async fn slice(
        &self,
        metric: &Metric,
        from: Timestamp,
        to: Timestamp,
        source_window: WindowDuration,
        limit: usize,
    ) -> Result<BucketSlice<T>>;

    /// Append `buckets` — each paired with the timestamp of the row it
    /// belongs to — for `metric` at `window`. Writes are issued in batches
    /// of at most `insert_chunk_size` rows.
    async fn store(
        &self,
        metric: &Metric,
        window: WindowDuration,
        buckets: Vec<(Timestamp, T)>,
        insert_chunk_size: usize,
    ) -> Result<()>;

    /// Delete the rows at the given timestamps for `metric` at `window`.
    async fn remove(&self, metric: &Metric, window: WindowDuration, timestamps: &[Timestamp]) -> Result<()>;
}

/// Durable storage for derived summaries, across all window durations.
///
/// Persisted as one column-store table per `(summary kind, window
/// duration)`: `(metric, timestamp, summary_blob)`, upserted by
/// `(metric, timestamp)`, with a TTL derived from the window's retention
/// policy.
#[async_trait]
pub trait SummaryStore<S>: Send + Sync
where
    S: Clone + Send + Sync + 'static,
{
    /// Upsert `summaries`, each paired with the timestamp it summarizes, for
    /// `metric` at `window`.
    async fn store(&self, metric: &Metric, window: WindowDuration, summaries: Vec<(Timestamp, S)>) -> Result<()>;
}

/// Durable tracking of per-metric, per-window processing progress and
/// metric registration.
///
/// Persisted as a single meta table keyed by metric, holding the
/// last-processed timestamp for every window duration plus the metric's
/// type descriptor.
#[async_trait]
pub trait MetaStore: Send + Sync {
    /// The last timestamp successfully processed for `(metric, window)`, or
    /// `None` if this metric has never been processed at that window.
    async fn get_last_processed(&self, metric: &Metric, window: WindowDuration) -> Result<Option<Timestamp>>;

    /// Record that `(metric, window)` has now been processed through `ts`.
    async fn update_last_processed(&self, metric: &Metric, window: WindowDuration, ts: Timestamp) -> Result<()>;

    /// Register a metric's type descriptor on first sight. A no-op if the
    /// metric is already registered.
    async fn insert(&self, metric: &Metric) -> Result<()>;

    /// Whether `metric` has been registered via [`MetaStore::insert`].
    async fn contains(&self, metric: &Metric) -> Result<bool>;
}
