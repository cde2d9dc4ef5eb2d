use thiserror::Error;

/// The error type shared by every `windowcore` crate.
///
/// The four variants correspond exactly to the four error kinds of the
/// processor's error-handling design: `Transient` failures propagate so the
/// caller can retry, `Corruption` is recovered locally (substitute a neutral
/// default and keep going), `InvalidInput` drops just the offending value or
/// metric, and `ConfigurationError` aborts startup.
#[derive(Error, Debug, Clone)]
pub enum WindowCoreError {
    /// Network, store unavailable, timeout — safe to retry as a whole unit
    /// of work since no partial progress has been durably committed yet.
    #[error("transient failure: {0}")]
    Transient(String),

    /// Unknown serialization version or a malformed stored row. Recovered
    /// locally by substituting a neutral default; never halts the pipeline.
    #[error("corrupted data: {0}")]
    Corruption(String),

    /// Negative counter/histogram values, or an unrecognized metric type.
    /// Scoped to the offending value or metric; never reaches the dispatcher.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Missing window duration, undefined source window, or any other
    /// configuration inconsistency detected at construction time.
    #[error("configuration error: {0}")]
    ConfigurationError(String),
}

impl WindowCoreError {
    /// Whether this error represents a transient failure that the caller
    /// should retry the whole operation for, as opposed to one that has
    /// already been locally recovered or is not retryable at all.
    pub fn is_transient(&self) -> bool {
        matches!(self, WindowCoreError::Transient(_))
    }
}

/// Convenience alias for `windowcore` results.
pub type Result<T> = std::result::Result<T, WindowCoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;

    #[test]
    fn only_transient_is_retryable() {
        check!(WindowCoreError::Transient("x".into()).is_transient());
        check!(!WindowCoreError::Corruption("x".into()).is_transient());
        check!(!WindowCoreError::InvalidInput("x".into()).is_transient());
        check!(!WindowCoreError::ConfigurationError("x".into()).is_transient());
    }
}
