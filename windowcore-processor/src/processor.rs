use crate::bucket_kind::BucketKind;
use crate::outcome::ProcessOutcome;
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::Instrument;
use windowcore_cache::BucketCache;
use windowcore_model::{Metric, Result, Summary};
use windowcore_store::{BucketStore, MetaStore, SummaryStore};
use windowcore_time::{BucketNumber, Timestamp, WindowDuration};

/// Dependencies and configuration for aggregating one `(source window,
/// target window)` pair of one bucket kind.
///
/// Modeled as a plain record holding explicit references to the three store
/// interfaces plus the shared bucket cache, per the source's own
/// re-architecture guidance: dependency injection is constructor-parameter
/// passing, not trait-mixin composition.
pub struct WindowProcessor<K: BucketKind> {
    source_window: WindowDuration,
    target_window: WindowDuration,
    raw_duration: WindowDuration,
    bucket_store: Arc<dyn BucketStore<Vec<u8>>>,
    summary_store: Arc<dyn SummaryStore<Summary>>,
    meta_store: Arc<dyn MetaStore>,
    cache: Arc<BucketCache>,
    insert_chunk_size: usize,
    read_limit: usize,
    _kind: PhantomData<K>,
}

/// One member contributing to a target bucket: its source bucket-number
/// (kept for bookkeeping/logging) and its decoded value.
struct Member<B> {
    source_bn: BucketNumber,
    bucket: B,
}

impl<K: BucketKind> WindowProcessor<K> {
    /// Construct a processor for one `(source, target)` window pair.
    ///
    /// `source_window` must be the configured next-smaller duration to
    /// `target_window` (raw, for the smallest configured window) — the
    /// caller (the `windowcore` facade) is responsible for wiring the chain
    /// in ascending order; this type does not validate it.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source_window: WindowDuration,
        target_window: WindowDuration,
        raw_duration: WindowDuration,
        bucket_store: Arc<dyn BucketStore<Vec<u8>>>,
        summary_store: Arc<dyn SummaryStore<Summary>>,
        meta_store: Arc<dyn MetaStore>,
        cache: Arc<BucketCache>,
        insert_chunk_size: usize,
        read_limit: usize,
    ) -> Self {
        WindowProcessor {
            source_window,
            target_window,
            raw_duration,
            bucket_store,
            summary_store,
            meta_store,
            cache,
            insert_chunk_size,
            read_limit,
            _kind: PhantomData,
        }
    }

    /// The window duration this processor reads from.
    pub fn source_window(&self) -> WindowDuration {
        self.source_window
    }

    /// The window duration this processor emits summaries and buckets at.
    pub fn target_window(&self) -> WindowDuration {
        self.target_window
    }

    /// Consume all source buckets available for `metric` in `(H,
    /// execution_ts]`, emit summaries at the target window, advance the
    /// metric's high-water mark, and sweep the consumed source buckets.
    ///
    /// See `spec.md` §4.C for the eight-step algorithm this implements.
    pub async fn process(&self, metric: &Metric, execution_ts: Timestamp) -> Result<ProcessOutcome> {
        let span = tracing::info_span!(
            "window_processor.process",
            metric = %metric,
            source_window = %self.source_window,
            target_window = %self.target_window,
            execution_ts = execution_ts.millis(),
        );
        self.process_inner(metric, execution_ts).instrument(span).await
    }

    async fn process_inner(&self, metric: &Metric, execution_ts: Timestamp) -> Result<ProcessOutcome> {
        // Step 1: H = meta.lastProcessed(metric, W); absent == -infinity.
        let high_water_mark = self.meta_store.get_last_processed(metric, self.target_window).await?;

        // `from_bn` (a bucket-aligned view of H) is only meaningful for the
        // cache lookup, which is already gated on `H` being present: deriving
        // it unconditionally by round-tripping `-infinity` through
        // `bucket_number * duration` overflows `i64` for any source window
        // wider than 1ms (the ordinary first-tick state of every chain window
        // past the first). The store-read lower bound is `H` itself, a plain
        // `Timestamp`, never a bucket-number reconstruction of it.
        let from_bn = high_water_mark.map(|h| h.to_bucket_number_of(self.source_window));
        let from_ts = high_water_mark.unwrap_or(Timestamp::from_millis(i64::MIN));
        let to_bn_exclusive = {
            let at_execution = execution_ts.to_bucket_number_of(self.source_window);
            BucketNumber::new(at_execution.number() + 1, self.source_window)
        };

        if let Some(bn) = from_bn {
            if bn.number() >= to_bn_exclusive.number() {
                // Nothing newer than H: no-op, not even a removal call.
                return Ok(ProcessOutcome::unchanged(high_water_mark));
            }
        }

        let (members, sweep_timestamps, cache_hit) = self
            .fetch_source_members(metric, from_bn, from_ts, to_bn_exclusive)
            .await?;

        if members.is_empty() && sweep_timestamps.is_empty() {
            // Step 2 edge case: empty source set is a no-op, removal skipped too.
            return Ok(ProcessOutcome {
                summaries_emitted: 0,
                high_water_mark,
                cache_hit,
            });
        }

        // Steps 3-4: partition by target bucket-number and fold.
        let mut groups: BTreeMap<i64, K::Bucket> = BTreeMap::new();
        for member in members {
            let target_bn = member.source_bn.rebucket(self.target_window);
            let entry = groups.entry(target_bn.number()).or_insert_with(K::empty);
            K::merge(entry, &member.bucket)?;
        }

        let mut emitted: Vec<(BucketNumber, K::Bucket)> = Vec::new();
        for (number, bucket) in groups {
            let target_bn = BucketNumber::new(number, self.target_window);
            let emit = match high_water_mark {
                Some(h) => target_bn.start_timestamp() > h,
                None => true,
            };
            if emit {
                emitted.push((target_bn, bucket));
            }
            // Groups that fail the idempotency check are dropped here: their
            // source rows are still swept below, but they contribute no
            // summary and do not move H.
        }

        let new_high_water_mark = if emitted.is_empty() {
            high_water_mark
        } else {
            self.publish_emitted(metric, &emitted).await?;
            let advanced = emitted.iter().map(|(bn, _)| bn.start_timestamp()).max();
            advanced
        };

        if let Some(ts) = new_high_water_mark {
            if new_high_water_mark != high_water_mark {
                self.meta_store.update_last_processed(metric, self.target_window, ts).await?;
            }
        }

        // Step 7: sweep consumed (and idempotently-skipped) source rows.
        // Non-fatal: a failure here is logged and retried at the next tick.
        if !sweep_timestamps.is_empty() {
            if let Err(err) = self
                .bucket_store
                .remove(metric, self.source_window, &sweep_timestamps)
                .await
            {
                tracing::warn!(metric = %metric, window = %self.source_window, error = %err, "failed to sweep consumed source buckets; will retry next invocation");
            }
        }

        Ok(ProcessOutcome {
            summaries_emitted: emitted.len(),
            high_water_mark: new_high_water_mark,
            cache_hit,
        })
    }

    /// Step 5: persist summaries newest-first, then publish the emitted
    /// buckets into this window's bucket store (so the next-coarser window's
    /// processor can read them as source) and into the shared bucket cache.
    async fn publish_emitted(&self, metric: &Metric, emitted: &[(BucketNumber, K::Bucket)]) -> Result<()> {
        let metric_type = metric.metric_type();

        let mut summaries: Vec<(Timestamp, Summary)> = emitted
            .iter()
            .map(|(bn, bucket)| (bn.start_timestamp(), K::summary(bucket, metric_type)))
            .collect();
        summaries.sort_by(|a, b| b.0.millis().cmp(&a.0.millis()));
        self.summary_store.store(metric, self.target_window, summaries).await?;

        let encoded: Vec<(Timestamp, Vec<u8>)> = emitted
            .iter()
            .map(|(bn, bucket)| (bn.start_timestamp(), K::encode(bucket)))
            .collect();
        self.bucket_store
            .store(metric, self.target_window, encoded, self.insert_chunk_size)
            .await?;

        let min_bn = emitted.iter().map(|(bn, _)| bn.number()).min().expect("emitted is non-empty");
        let max_bn = emitted.iter().map(|(bn, _)| bn.number()).max().expect("emitted is non-empty");
        let cache_entries: Vec<(BucketNumber, Vec<u8>)> = emitted
            .iter()
            .map(|(bn, bucket)| (*bn, K::encode(bucket)))
            .collect();
        self.cache.multi_set(
            metric,
            BucketNumber::new(min_bn, self.target_window),
            BucketNumber::new(max_bn + 1, self.target_window),
            cache_entries,
        );

        Ok(())
    }

    /// Step 2 + step 8: read source buckets for `[from_bn, to_bn_exclusive)`,
    /// trying the shared bucket cache first (when eligible) and falling
    /// through to the bucket store on a miss.
    ///
    /// Returns the decoded, non-empty members to fold, the full list of
    /// source-window timestamps to sweep afterward, and whether the cache
    /// served the read.
    async fn fetch_source_members(
        &self,
        metric: &Metric,
        from_bn: Option<BucketNumber>,
        from_ts: Timestamp,
        to_bn_exclusive: BucketNumber,
    ) -> Result<(Vec<Member<K::Bucket>>, Vec<Timestamp>, Option<bool>)> {
        let try_cache = self.source_window != self.raw_duration;

        if let (true, Some(from_bn)) = (try_cache, from_bn) {
            if let Some(entries) = self.cache.multi_get(metric, from_bn, to_bn_exclusive) {
                let mut members = Vec::with_capacity(entries.len());
                let mut sweep = Vec::with_capacity(entries.len());
                for (bn, bytes) in entries {
                    sweep.push(bn.start_timestamp());
                    let bucket = K::decode(&bytes)?;
                    if !K::is_empty(&bucket) {
                        members.push(Member { source_bn: bn, bucket });
                    }
                }
                return Ok((members, sweep, Some(true)));
            }
        }

        let to_ts = to_bn_exclusive.start_timestamp();
        let rows = self
            .bucket_store
            .slice(metric, from_ts, to_ts, self.source_window, self.read_limit)
            .await?;

        let mut members = Vec::new();
        let mut sweep = Vec::with_capacity(rows.len());
        for row in &rows {
            sweep.push(row.timestamp);
            let source_bn = row.timestamp.to_bucket_number_of(self.source_window);
            for blob in &row.buckets {
                let bucket = K::decode(blob)?;
                if !K::is_empty(&bucket) {
                    members.push(Member { source_bn, bucket });
                }
            }
        }

        let cache_hit = if self.source_window == self.raw_duration { None } else { Some(false) };
        Ok((members, sweep, cache_hit))
    }
}
