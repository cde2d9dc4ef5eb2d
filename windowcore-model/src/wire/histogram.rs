//! Wire format for [`HistogramBucket`].
//!
//! An empty bucket serializes to zero bytes — the same sentinel the cache
//! layer uses for `EmptyBucket` — so a cache entry and a stored row agree on
//! what "nothing recorded" looks like without a round trip through this
//! module. A non-empty bucket serializes as a version byte followed by the
//! recorded value/count pairs replayed from `iter_recorded()`, each as a
//! pair of varints.

use super::varint;
use crate::error::Result;
use crate::histogram_bucket::{self, HistogramBucket};

/// The only wire version this build knows how to write.
const VERSION: u8 = 1;

/// Serialize a histogram bucket. Returns an empty vector for [`HistogramBucket::Empty`].
pub fn encode(bucket: &HistogramBucket) -> Vec<u8> {
    let Some(histogram) = bucket.histogram() else {
        return Vec::new();
    };

    let mut out = Vec::new();
    out.push(VERSION);
    varint::encode_u64(histogram.len(), &mut out);
    for value in histogram.iter_recorded() {
        varint::encode_u64(value.value_iterated_to(), &mut out);
        varint::encode_u64(value.count_at_value(), &mut out);
    }
    out
}

/// Deserialize a histogram bucket.
///
/// An empty byte slice decodes to [`HistogramBucket::Empty`]. Bytes tagged
/// with a version this build doesn't recognize, or that are otherwise
/// malformed, decode to the empty bucket as well rather than propagating an
/// error — corrupted or forward-versioned stored data must never stop the
/// pipeline, it just loses the contribution of that one bucket.
pub fn decode(bytes: &[u8]) -> Result<HistogramBucket> {
    if bytes.is_empty() {
        return Ok(HistogramBucket::empty());
    }

    match try_decode(bytes) {
        Ok(bucket) => Ok(bucket),
        Err(err) => {
            tracing::warn!(error = %err, "discarding unreadable histogram bucket");
            Ok(HistogramBucket::empty())
        }
    }
}

fn try_decode(bytes: &[u8]) -> Result<HistogramBucket> {
    let (&version, rest) = bytes
        .split_first()
        .ok_or_else(|| crate::error::WindowCoreError::Corruption("empty version tag".into()))?;
    if version != VERSION {
        return Err(crate::error::WindowCoreError::Corruption(format!(
            "unsupported histogram wire version {version}"
        )));
    }

    let mut cursor = rest;
    let pair_count = varint::decode_u64(&mut cursor)?;

    let mut histogram = histogram_bucket::new_histogram();

    for _ in 0..pair_count {
        let value = varint::decode_u64(&mut cursor)?;
        let count = varint::decode_u64(&mut cursor)?;
        histogram
            .record_n(value, count)
            .map_err(|e| crate::error::WindowCoreError::Corruption(e.to_string()))?;
    }

    Ok(HistogramBucket::Recorded(Box::new(histogram)))
}
