use windowcore_time::Timestamp;

/// The observable result of one [`crate::WindowProcessor::process`]
/// invocation: the spec's `Completion` is described only by its writable
/// side effects, so this is the structured view tests and callers assert
/// against instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// How many summaries were persisted by this invocation.
    pub summaries_emitted: usize,
    /// The metric's high-water mark for this window after this invocation
    /// — unchanged from before the call if nothing was emitted.
    pub high_water_mark: Option<Timestamp>,
    /// Whether the source read was served from the bucket cache.
    ///
    /// `None` when no source read was attempted at all: either the queried
    /// interval was already empty (nothing newer than the high-water mark),
    /// or the source window is the raw window, where the cache is never
    /// consulted.
    pub cache_hit: Option<bool>,
}

impl ProcessOutcome {
    pub(crate) fn unchanged(high_water_mark: Option<Timestamp>) -> Self {
        ProcessOutcome {
            summaries_emitted: 0,
            high_water_mark,
            cache_hit: None,
        }
    }
}
