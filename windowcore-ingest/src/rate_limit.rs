//! A per-call-site rate limiter for the negative-value-drop warning.
//!
//! Ported essentially unchanged from the pattern used for background-queue
//! warnings elsewhere in the stack: without it, a single noisy metric with a
//! broken upstream emitter could flood the logs with one warning per ingest
//! batch forever.

use std::sync::OnceLock;
use std::time::{Duration, Instant};

#[doc(hidden)]
pub(crate) fn time_since_arbitrary_epoch() -> Duration {
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    Instant::now().duration_since(*EPOCH.get_or_init(Instant::now))
}

/// `rate_limited!(duration, expr)` evaluates `expr` at most once every
/// `duration`, across all threads, per call site.
macro_rules! rate_limited {
    ($interval:expr, $call:expr) => {{
        use std::sync::atomic::{AtomicU64, Ordering};
        static NEXT_CALL: AtomicU64 = AtomicU64::new(u64::MIN);
        let interval = $interval;
        assert!(interval >= Duration::from_secs(1), "only second-level granularity is supported");

        let time = $crate::rate_limit::time_since_arbitrary_epoch();
        let next = NEXT_CALL.load(Ordering::Relaxed);
        if next <= time.as_secs() {
            let new_next = time.checked_add(interval).unwrap_or(Duration::MAX).as_secs();
            if NEXT_CALL.compare_exchange(next, new_next, Ordering::Relaxed, Ordering::Relaxed).is_ok() {
                $call;
            }
        }
    }};
}
pub(crate) use rate_limited;
