//! Wire format for [`CounterBucket`]: an empty bucket is zero bytes, a
//! recorded bucket is a version byte followed by a single varint sum.

use super::varint;
use crate::error::Result;
use crate::histogram_bucket::CounterBucket;

const VERSION: u8 = 1;

/// Serialize a counter bucket. Returns an empty vector for [`CounterBucket::Empty`].
pub fn encode(bucket: &CounterBucket) -> Vec<u8> {
    match bucket {
        CounterBucket::Empty => Vec::new(),
        CounterBucket::Recorded(sum) => {
            let mut out = Vec::new();
            out.push(VERSION);
            varint::encode_u64(*sum, &mut out);
            out
        }
    }
}

/// Deserialize a counter bucket. See [`super::histogram::decode`] for the
/// shared rationale behind treating unreadable bytes as the empty bucket
/// rather than an error.
pub fn decode(bytes: &[u8]) -> Result<CounterBucket> {
    if bytes.is_empty() {
        return Ok(CounterBucket::empty());
    }

    match try_decode(bytes) {
        Ok(bucket) => Ok(bucket),
        Err(err) => {
            tracing::warn!(error = %err, "discarding unreadable counter bucket");
            Ok(CounterBucket::empty())
        }
    }
}

fn try_decode(bytes: &[u8]) -> Result<CounterBucket> {
    let (&version, rest) = bytes
        .split_first()
        .ok_or_else(|| crate::error::WindowCoreError::Corruption("empty version tag".into()))?;
    if version != VERSION {
        return Err(crate::error::WindowCoreError::Corruption(format!(
            "unsupported counter wire version {version}"
        )));
    }
    let mut cursor = rest;
    let sum = varint::decode_u64(&mut cursor)?;
    Ok(CounterBucket::Recorded(sum))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;

    #[test]
    fn empty_bucket_round_trips_through_zero_bytes() {
        let bytes = encode(&CounterBucket::empty());
        check!(bytes.is_empty());
        check!(decode(&bytes).unwrap() == CounterBucket::empty());
    }

    #[test]
    fn recorded_bucket_round_trips() {
        let mut bucket = CounterBucket::empty();
        bucket.add(17);
        bucket.add(3);
        let bytes = encode(&bucket);
        check!(decode(&bytes).unwrap() == bucket);
    }

    #[test]
    fn unknown_version_decodes_to_empty_bucket() {
        check!(decode(&[0xFF, 0x01]).unwrap() == CounterBucket::empty());
    }
}
