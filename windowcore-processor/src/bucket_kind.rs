//! The one seam the processor's algorithm is generic over: a histogram
//! bucket and a counter bucket merge, encode, and summarize differently, but
//! the eight-step aggregation algorithm in [`crate::WindowProcessor`] is
//! identical for both. Rather than duplicate that algorithm, it is written
//! once against this trait and instantiated at [`HistogramKind`] and
//! [`CounterKind`].

use windowcore_model::{CounterBucket, HistogramBucket, MetricType, Result, Summary};

/// The bucket-kind-specific operations the window processor needs: merge two
/// buckets, tell whether a bucket carries any recorded value, and cross the
/// wire-format/summary boundary.
pub trait BucketKind: Send + Sync + 'static {
    /// The in-memory bucket type this kind folds source buckets into.
    type Bucket: Clone + Send + Sync;

    /// A bucket with nothing recorded, the fold's starting point.
    fn empty() -> Self::Bucket;

    /// Merge `other`'s contents into `target` in place.
    fn merge(target: &mut Self::Bucket, other: &Self::Bucket) -> Result<()>;

    /// Whether `bucket` has never recorded a value — an `EmptyBucket` in all
    /// but name, whether it arrived that way from the wire or was simply
    /// never recorded into.
    fn is_empty(bucket: &Self::Bucket) -> bool;

    /// Encode to the versioned wire format used by both the bucket store and
    /// the bucket cache.
    fn encode(bucket: &Self::Bucket) -> Vec<u8>;

    /// Decode from the versioned wire format. Unreadable or unknown-version
    /// bytes decode to [`BucketKind::empty`], per `windowcore_model::wire`'s
    /// forward-compatibility contract — never an error.
    fn decode(bytes: &[u8]) -> Result<Self::Bucket>;

    /// Derive this bucket's [`Summary`] for a metric of the given type.
    fn summary(bucket: &Self::Bucket, metric_type: MetricType) -> Summary;
}

/// The bucket kind for `Timer` and `Gauge` metrics: a recorded HDR
/// histogram, merged by union and summarized as percentiles/moments.
#[derive(Debug, Clone, Copy, Default)]
pub struct HistogramKind;

impl BucketKind for HistogramKind {
    type Bucket = HistogramBucket;

    fn empty() -> Self::Bucket {
        HistogramBucket::empty()
    }

    fn merge(target: &mut Self::Bucket, other: &Self::Bucket) -> Result<()> {
        target.merge(other)
    }

    fn is_empty(bucket: &Self::Bucket) -> bool {
        bucket.is_empty()
    }

    fn encode(bucket: &Self::Bucket) -> Vec<u8> {
        windowcore_model::wire::histogram::encode(bucket)
    }

    fn decode(bytes: &[u8]) -> Result<Self::Bucket> {
        windowcore_model::wire::histogram::decode(bytes)
    }

    fn summary(bucket: &Self::Bucket, metric_type: MetricType) -> Summary {
        Summary::from_histogram_bucket(bucket, metric_type)
    }
}

/// The bucket kind for `Counter` metrics: a running sum, merged by addition.
#[derive(Debug, Clone, Copy, Default)]
pub struct CounterKind;

impl BucketKind for CounterKind {
    type Bucket = CounterBucket;

    fn empty() -> Self::Bucket {
        CounterBucket::empty()
    }

    fn merge(target: &mut Self::Bucket, other: &Self::Bucket) -> Result<()> {
        target.merge(other);
        Ok(())
    }

    fn is_empty(bucket: &Self::Bucket) -> bool {
        bucket.is_empty()
    }

    fn encode(bucket: &Self::Bucket) -> Vec<u8> {
        windowcore_model::wire::counter::encode(bucket)
    }

    fn decode(bytes: &[u8]) -> Result<Self::Bucket> {
        windowcore_model::wire::counter::decode(bytes)
    }

    fn summary(bucket: &Self::Bucket, _metric_type: MetricType) -> Summary {
        Summary::from_counter_bucket(bucket)
    }
}
