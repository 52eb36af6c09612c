//! Repository configuration.

use redmodel_codec::Format;
use std::time::Duration;

/// Configuration for one [`crate::Repository`].
///
/// Built once at startup and handed to the repository; nothing about a
/// repository's behavior is stored in global state.
#[derive(Debug, Clone, Default)]
pub struct RepositoryConfig {
    /// Fail deletes that find a reverse-key-set member already gone.
    pub strict_delete: bool,

    /// What to do when a commit loses an optimistic race.
    pub retry: RetryPolicy,

    /// Format entity data is stored in.
    pub format: Format,
}

impl RepositoryConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets strict delete checking.
    #[must_use]
    pub const fn strict_delete(mut self, value: bool) -> Self {
        self.strict_delete = value;
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the storage format.
    #[must_use]
    pub const fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }
}

/// Retry behavior after an optimistic conflict.
///
/// The default retries forever without sleeping: every attempt re-reads
/// state, so this is always correct, but it may spin under heavy
/// contention. A bounded policy backs off exponentially and eventually
/// surfaces [`crate::ModelError::Contention`].
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, or `None` for no limit.
    pub max_attempts: Option<u32>,
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub backoff_multiplier: f64,
}

impl RetryPolicy {
    /// Retries forever, immediately.
    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            max_attempts: None,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
        }
    }

    /// Gives up after `max_attempts`, backing off between attempts.
    #[must_use]
    pub fn bounded(max_attempts: u32) -> Self {
        Self {
            max_attempts: Some(max_attempts.max(1)),
            initial_delay: Duration::from_millis(2),
            max_delay: Duration::from_millis(200),
            backoff_multiplier: 2.0,
        }
    }

    /// Sets the initial delay.
    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay.
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the backoff multiplier. Values that are not finite and positive
    /// fall back to `1.0`.
    #[must_use]
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = if multiplier.is_finite() && multiplier > 0.0 {
            multiplier
        } else {
            1.0
        };
        self
    }

    /// Returns true if another attempt may follow attempt number `attempt`
    /// (1-indexed).
    #[must_use]
    pub fn allows_retry_after(&self, attempt: u32) -> bool {
        self.max_attempts.map_or(true, |max| attempt < max)
    }

    /// Calculates the delay before attempt `attempt` (1-indexed). The first
    /// attempt never waits, and no delay exceeds `max_delay`.
    #[must_use]
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 || self.initial_delay.is_zero() {
            return Duration::ZERO;
        }

        let exponent = i32::try_from(attempt - 2).unwrap_or(i32::MAX);
        let delay_secs =
            self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        // f64::max drops NaN, so a bad multiplier set on the field means no delay.
        let capped = delay_secs.max(0.0).min(self.max_delay.as_secs_f64());
        Duration::try_from_secs_f64(capped).unwrap_or(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::unbounded()
    }
}
