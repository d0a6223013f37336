//! Retry policy: which failures are retried and how long to wait.

use std::time::Duration;

use rand::Rng;

/// What went wrong on one attempt, as seen by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The exchange failed before a response arrived (connect failure,
    /// reset, per-attempt timeout).
    Transport,
    /// The server answered with a non-success status.
    Status(http::StatusCode),
}

/// A failed attempt together with the server's retry hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Failure {
    /// Failure classification.
    pub class: FailureClass,
    /// Parsed `Retry-After` header, if any.
    pub retry_after: Option<Duration>,
    /// Parsed `Stripe-Should-Retry` header, if any.
    pub should_retry: Option<bool>,
}

impl Failure {
    /// A transport failure with no server hints.
    #[must_use]
    pub const fn transport() -> Self {
        Self {
            class: FailureClass::Transport,
            retry_after: None,
            should_retry: None,
        }
    }

    /// A status failure with no server hints.
    #[must_use]
    pub const fn status(status: http::StatusCode) -> Self {
        Self {
            class: FailureClass::Status(status),
            retry_after: None,
            should_retry: None,
        }
    }

    /// Attaches a `Retry-After` hint.
    #[must_use]
    pub const fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = Some(retry_after);
        self
    }

    /// Attaches an explicit retry hint from the server.
    #[must_use]
    pub const fn with_should_retry(mut self, should_retry: bool) -> Self {
        self.should_retry = Some(should_retry);
        self
    }
}

/// Outcome of [`RetryPolicy::decide`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait `delay`, then send the same request again.
    Retry {
        /// Time to wait before the next attempt.
        delay: Duration,
    },
    /// Surface the failure to the caller.
    Stop,
}

/// Configuration for exponential backoff with full jitter.
///
/// The backoff ceiling for retry `n` (0 = first retry) is
/// `min(max_delay, initial_delay * 2^n)`; the actual delay is drawn
/// uniformly from `[0, ceiling)` so many clients failing together do not
/// retry in lockstep.
///
/// # Defaults
///
/// - `max_retries`: 2
/// - `initial_delay`: 500 milliseconds
/// - `max_delay`: 2 seconds
/// - `max_retry_after`: 60 seconds
///
/// # Example
///
/// ```
/// use stripe_core::retry::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new()
///     .with_max_retries(3)
///     .with_initial_delay(Duration::from_millis(250))
///     .with_max_delay(Duration::from_secs(4));
///
/// assert_eq!(policy.max_attempts(), 4);
/// assert_eq!(policy.backoff_ceiling(2), Duration::from_secs(1));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt.
    ///
    /// A value of 0 means only the initial attempt is made.
    pub max_retries: u32,

    /// Backoff ceiling for the first retry.
    pub initial_delay: Duration,

    /// Cap on the backoff ceiling.
    pub max_delay: Duration,

    /// Largest `Retry-After` value waited for. A server asking for longer
    /// stops the retry loop so the failure surfaces to the caller.
    pub max_retry_after: Duration,
}

impl RetryPolicy {
    /// Default maximum retries.
    pub const DEFAULT_MAX_RETRIES: u32 = crate::config::defaults::MAX_NETWORK_RETRIES;

    /// Default initial delay (500 milliseconds).
    pub const DEFAULT_INITIAL_DELAY: Duration =
        crate::config::defaults::initial_network_retry_delay();

    /// Default maximum delay (2 seconds).
    pub const DEFAULT_MAX_DELAY: Duration = crate::config::defaults::max_network_retry_delay();

    /// Default maximum honored `Retry-After` (60 seconds).
    pub const DEFAULT_MAX_RETRY_AFTER: Duration = crate::config::defaults::max_retry_after();

    /// Creates a new retry policy with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_retries: Self::DEFAULT_MAX_RETRIES,
            initial_delay: Self::DEFAULT_INITIAL_DELAY,
            max_delay: Self::DEFAULT_MAX_DELAY,
            max_retry_after: Self::DEFAULT_MAX_RETRY_AFTER,
        }
    }

    /// Sets the maximum number of retries.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the backoff ceiling for the first retry.
    ///
    /// Zero delay is supported (useful in tests) but creates a tight retry
    /// loop against a failing server.
    #[must_use]
    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the cap on the backoff ceiling.
    #[must_use]
    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the largest honored `Retry-After` value.
    #[must_use]
    pub const fn with_max_retry_after(mut self, delay: Duration) -> Self {
        self.max_retry_after = delay;
        self
    }

    /// Total attempts allowed, including the first.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Returns true if another retry is allowed after `retries_done` retries.
    #[must_use]
    pub const fn has_budget(&self, retries_done: u32) -> bool {
        retries_done < self.max_retries
    }

    /// Computes the backoff ceiling for a given retry number (0-indexed):
    /// `min(max_delay, initial_delay * 2^retry)`.
    #[must_use]
    pub fn backoff_ceiling(&self, retry: u32) -> Duration {
        2u32.checked_pow(retry)
            .and_then(|factor| self.initial_delay.checked_mul(factor))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// Draws a jittered delay in `[0, backoff_ceiling(retry))`.
    ///
    /// A zero ceiling yields a zero delay.
    #[must_use]
    pub fn backoff_delay<R: Rng + ?Sized>(&self, retry: u32, rng: &mut R) -> Duration {
        let ceiling = self.backoff_ceiling(retry);
        let nanos = u64::try_from(ceiling.as_nanos()).unwrap_or(u64::MAX);
        if nanos == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(rng.gen_range(0..nanos))
    }

    /// Returns true if this failure class is worth retrying at all.
    ///
    /// An explicit server hint wins over the status-based rule:
    /// - transport failures are retried
    /// - 5xx and 429 are retried
    /// - 409 is retried only when an idempotency key makes it safe
    /// - every other status is terminal
    #[must_use]
    pub fn is_retryable(&self, failure: &Failure, idempotent: bool) -> bool {
        if let Some(hint) = failure.should_retry {
            return hint;
        }

        match failure.class {
            FailureClass::Transport => true,
            FailureClass::Status(status) => {
                status.is_server_error()
                    || status == http::StatusCode::TOO_MANY_REQUESTS
                    || (status == http::StatusCode::CONFLICT && idempotent)
            }
        }
    }

    /// Decides what to do after a failed attempt.
    ///
    /// `retries_done` is the number of retries already performed for this
    /// logical call (0 after the first attempt fails).
    ///
    /// `Retry-After` is a floor on the delay, never a ceiling. A hint above
    /// `max_retry_after` stops retrying instead of retrying early.
    pub fn decide<R: Rng + ?Sized>(
        &self,
        retries_done: u32,
        failure: &Failure,
        idempotent: bool,
        rng: &mut R,
    ) -> RetryDecision {
        if !self.has_budget(retries_done) || !self.is_retryable(failure, idempotent) {
            return RetryDecision::Stop;
        }

        let backoff = self.backoff_delay(retries_done, rng);
        let delay = match failure.retry_after {
            Some(retry_after) if retry_after > self.max_retry_after => {
                return RetryDecision::Stop;
            }
            Some(retry_after) => backoff.max(retry_after),
            None => backoff,
        };

        RetryDecision::Retry { delay }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses a `Retry-After` header given in whole seconds.
///
/// HTTP-date values are not used by the API and are ignored.
#[must_use]
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Parses a `Stripe-Should-Retry` header.
#[must_use]
pub fn parse_should_retry(value: &str) -> Option<bool> {
    match value.trim() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}
