use std::collections::HashSet;
use std::time::Duration;
use windowcore_model::{MetricType, WindowCoreError};
use windowcore_time::WindowDuration;

/// All tunables for a [`crate::WindowCoreEngine`], validated once at
/// construction time rather than checked piecemeal at call sites.
///
/// Deserializable via `serde` so it can be loaded from the host
/// application's own configuration file; every field also has a sensible
/// default via [`WindowCoreConfig::default_for_durations`] for tests and
/// examples that don't need a full config file.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct WindowCoreConfig {
    /// The configured window durations, raw window excluded, in ascending
    /// order. The smallest entry's source window is the raw (1ms) window;
    /// every other entry's source window is its immediate predecessor here.
    pub window_durations: Vec<WindowDuration>,
    /// Global on/off switch for the bucket cache.
    pub cache_enabled: bool,
    /// Which metric types are eligible for caching.
    pub cache_enabled_for: HashSet<MetricType>,
    /// Soft cap on the number of distinct cached metrics, per bucket kind.
    pub cache_max_metrics: usize,
    /// Maximum bucket-number span a single cache `multi_set` call may
    /// insert before it's rejected as oversized.
    pub cache_max_store: i64,
    /// Maximum number of rows a single store write batches at once.
    pub insert_chunk_size: usize,
    /// Maximum number of rows a single processor read fetches per
    /// [`windowcore_store::BucketStore::slice`] call when folding source
    /// buckets into a target window.
    pub source_fetch_size: usize,
    /// Per-window retention, as `(window, ttl)` pairs rather than a map so
    /// the shape survives every serde data format, not just ones with
    /// string-keyed maps.
    pub retention: Vec<(WindowDuration, Duration)>,
    /// Maximum number of summaries a single read may return.
    pub summary_limit: usize,
    /// Maximum number of rows a single summary-store read fetches at once.
    pub summary_fetch_size: usize,
    /// The coarse grouping interval the ingest path folds measurements into
    /// before writing a raw bucket. Spec default is 5 seconds.
    pub ingest_granule: Duration,
    /// How far behind wall-clock time a derived [`windowcore_time::Tick`]
    /// lags, to tolerate cross-node clock skew.
    pub tick_safety_interval: Duration,
}

impl WindowCoreConfig {
    /// A config with every ambient knob at a reasonable default, for the
    /// given chain of window durations (ascending, raw excluded).
    pub fn default_for_durations(window_durations: Vec<WindowDuration>) -> Self {
        WindowCoreConfig {
            window_durations,
            cache_enabled: true,
            cache_enabled_for: HashSet::from([MetricType::Timer, MetricType::Gauge, MetricType::Counter]),
            cache_max_metrics: 10_000,
            cache_max_store: 10_000,
            insert_chunk_size: 100,
            source_fetch_size: 10_000,
            retention: Vec::new(),
            summary_limit: 1_000,
            summary_fetch_size: 1_000,
            ingest_granule: Duration::from_secs(5),
            tick_safety_interval: Duration::from_secs(2),
        }
    }

    /// Validate the configuration, failing fast with a
    /// [`WindowCoreError::ConfigurationError`] rather than surfacing a
    /// confusing failure partway through processing.
    pub fn validate(&self) -> Result<(), WindowCoreError> {
        if self.window_durations.is_empty() {
            return Err(WindowCoreError::ConfigurationError(
                "at least one window duration must be configured".into(),
            ));
        }

        let mut previous = WindowDuration::RAW;
        for &duration in &self.window_durations {
            if duration <= previous {
                return Err(WindowCoreError::ConfigurationError(format!(
                    "window durations must be strictly ascending and coarser than raw: {duration} is not coarser than {previous}"
                )));
            }
            previous = duration;
        }

        if self.cache_max_metrics == 0 {
            return Err(WindowCoreError::ConfigurationError(
                "cache_max_metrics must be positive when the cache is enabled".into(),
            ));
        }
        if self.cache_max_store <= 0 {
            return Err(WindowCoreError::ConfigurationError("cache_max_store must be positive".into()));
        }
        if self.insert_chunk_size == 0 {
            return Err(WindowCoreError::ConfigurationError("insert_chunk_size must be positive".into()));
        }
        if self.source_fetch_size == 0 {
            return Err(WindowCoreError::ConfigurationError("source_fetch_size must be positive".into()));
        }
        if self.summary_limit == 0 || self.summary_fetch_size == 0 {
            return Err(WindowCoreError::ConfigurationError(
                "summary_limit and summary_fetch_size must be positive".into(),
            ));
        }
        if self.ingest_granule.is_zero() {
            return Err(WindowCoreError::ConfigurationError("ingest_granule must be positive".into()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;

    #[test]
    fn default_config_for_a_sane_chain_validates() {
        let config = WindowCoreConfig::default_for_durations(vec![
            WindowDuration::from_millis(1_000),
            WindowDuration::from_millis(30_000),
        ]);
        check!(config.validate().is_ok());
    }

    #[test]
    fn empty_window_durations_is_a_configuration_error() {
        let config = WindowCoreConfig::default_for_durations(vec![]);
        check!(matches!(config.validate(), Err(WindowCoreError::ConfigurationError(_))));
    }

    #[test]
    fn non_ascending_window_durations_is_a_configuration_error() {
        let config = WindowCoreConfig::default_for_durations(vec![
            WindowDuration::from_millis(30_000),
            WindowDuration::from_millis(1_000),
        ]);
        check!(matches!(config.validate(), Err(WindowCoreError::ConfigurationError(_))));
    }

    #[test]
    fn zero_cache_max_metrics_is_a_configuration_error() {
        let mut config = WindowCoreConfig::default_for_durations(vec![WindowDuration::from_millis(1_000)]);
        config.cache_max_metrics = 0;
        check!(matches!(config.validate(), Err(WindowCoreError::ConfigurationError(_))));
    }
}
