//! Per-call retry bookkeeping.

use std::time::Duration;

use tokio::time::Instant;

use crate::error::ErrorKind;

/// Progress of one logical call through the retry loop.
///
/// Created when the call starts and dropped when it resolves; it is never
/// shared between calls.
#[derive(Debug)]
pub struct RetryState {
    attempt: u32,
    started: Instant,
    last_error: Option<ErrorKind>,
}

impl RetryState {
    /// Starts tracking a new logical call.
    #[must_use]
    pub fn start() -> Self {
        Self {
            attempt: 0,
            started: Instant::now(),
            last_error: None,
        }
    }

    /// Number of retries performed so far (0 while the first attempt runs).
    #[must_use]
    pub const fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Number of attempts started so far, including the current one.
    #[must_use]
    pub const fn attempts_made(&self) -> u32 {
        self.attempt + 1
    }

    /// Time since the call started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Kind of the most recent failure, if any.
    #[must_use]
    pub const fn last_error(&self) -> Option<ErrorKind> {
        self.last_error
    }

    /// Records a failed attempt.
    pub const fn record_failure(&mut self, kind: ErrorKind) {
        self.last_error = Some(kind);
    }

    /// Moves on to the next attempt.
    pub const fn advance(&mut self) {
        self.attempt += 1;
    }
}
