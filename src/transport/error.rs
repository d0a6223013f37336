//! Error types for transport operations.

use thiserror::Error;

/// Error type for a single HTTP exchange.
///
/// Describes what went wrong on the wire without dictating recovery strategy.
/// The request executor decides whether a given variant is worth retrying.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    ///
    /// This includes DNS resolution failures, refused or reset connections,
    /// TLS handshake failures and errors while reading the response body.
    #[error("Connection error: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Request timed out.
    ///
    /// The server did not respond within the per-attempt timeout.
    #[error("Request timed out")]
    Timeout,

    /// The request could not be constructed (bad URL, bad header).
    ///
    /// This indicates a programming or configuration error rather than
    /// a transient failure.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The transport could not be configured (proxy, trust bundle, TLS).
    #[error("Transport configuration error: {0}")]
    Configuration(String),
}

impl TransportError {
    /// Returns true if the failure is transient and the same request may
    /// succeed on a fresh connection.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout)
    }

    /// Returns true if this error is a timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}
