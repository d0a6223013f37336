//! Error types for webhook verification.

use thiserror::Error;

/// Why a webhook payload was rejected.
///
/// Signature and timestamp failures are distinct variants so callers can tell
/// a forged payload from a replayed or delayed one.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureVerificationError {
    /// The header has no parseable `t=` timestamp.
    #[error("Unable to extract timestamp and signatures from header")]
    MalformedHeader,

    /// The header carries no signature for the expected scheme.
    #[error("No signatures found with expected scheme {scheme}")]
    NoSignaturesForScheme {
        /// Scheme that was looked for (`v1`).
        scheme: &'static str,
    },

    /// None of the signatures matches the payload for any secret.
    #[error("No signatures found matching the expected signature for payload")]
    Mismatch,

    /// The signature is valid but the timestamp is too far from now.
    #[error("Timestamp outside the tolerance zone ({timestamp}, now {now}, tolerance {tolerance}s)")]
    TimestampOutsideTolerance {
        /// Timestamp from the header.
        timestamp: i64,
        /// Current time used for the check.
        now: i64,
        /// Tolerance in seconds.
        tolerance: i64,
    },

    /// The payload was authentic but is not a valid event.
    #[error("Invalid event payload: {0}")]
    InvalidPayload(String),
}
