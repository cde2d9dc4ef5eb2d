//! The versioned, hand-rolled wire format buckets cross store and cache
//! boundaries in.
//!
//! Every encoding starts with a version tag byte, followed by varint fields.
//! An empty bucket is the special case of zero bytes, shared by both bucket
//! kinds and by the cache layer's own `EmptyBucket` sentinel. A version byte
//! this build doesn't recognize never panics and never fails the caller: it
//! decodes to the empty bucket, with a logged warning, since silently
//! contributing nothing is always safer than guessing at an unknown layout.

pub mod counter;
pub mod histogram;
mod varint;
