//! Default values for configuration options.
//!
//! Centralized constants to avoid magic numbers scattered across the codebase.

use std::time::Duration;

/// Base URL for the main API.
pub const API_BASE: &str = "https://api.stripe.com";

/// Base URL for file uploads.
pub const UPLOADS_BASE: &str = "https://files.stripe.com";

/// Base URL for Connect OAuth endpoints.
pub const CONNECT_BASE: &str = "https://connect.stripe.com";

/// API version pinned by this library.
pub const API_VERSION: &str = "2024-06-20";

/// API version sent for preview-mode requests.
pub const PREVIEW_API_VERSION: &str = "2024-06-20.preview";

/// Connection open timeout in seconds.
pub const OPEN_TIMEOUT_SECS: u64 = 30;

/// Read timeout in seconds.
pub const READ_TIMEOUT_SECS: u64 = 80;

/// Write timeout in seconds.
pub const WRITE_TIMEOUT_SECS: u64 = 30;

/// Default number of retries after the first attempt.
pub const MAX_NETWORK_RETRIES: u32 = 2;

/// Initial retry delay in milliseconds.
pub const INITIAL_NETWORK_RETRY_DELAY_MS: u64 = 500;

/// Maximum retry delay in milliseconds.
pub const MAX_NETWORK_RETRY_DELAY_MS: u64 = 2_000;

/// Largest `Retry-After` value honored, in seconds. Larger values end the
/// retry loop.
pub const MAX_RETRY_AFTER_SECS: u64 = 60;

/// Idle connections kept per host.
pub const MAX_CONNECTIONS_PER_HOST: usize = 5;

/// Open connections allowed across all hosts.
pub const MAX_CONNECTIONS: usize = 32;

/// Idle connections older than this are discarded on the next acquire.
pub const CONNECTION_IDLE_TTL_SECS: u64 = 60;

/// Default webhook timestamp tolerance in seconds.
pub const WEBHOOK_TOLERANCE_SECS: i64 = 300;

/// Default config file name used by `init`.
pub const CONFIG_FILE_NAME: &str = "stripe-core.toml";

/// Default connection open timeout as Duration.
#[must_use]
pub const fn open_timeout() -> Duration {
    Duration::from_secs(OPEN_TIMEOUT_SECS)
}

/// Default read timeout as Duration.
#[must_use]
pub const fn read_timeout() -> Duration {
    Duration::from_secs(READ_TIMEOUT_SECS)
}

/// Default write timeout as Duration.
#[must_use]
pub const fn write_timeout() -> Duration {
    Duration::from_secs(WRITE_TIMEOUT_SECS)
}

/// Default initial retry delay as Duration.
#[must_use]
pub const fn initial_network_retry_delay() -> Duration {
    Duration::from_millis(INITIAL_NETWORK_RETRY_DELAY_MS)
}

/// Default maximum retry delay as Duration.
#[must_use]
pub const fn max_network_retry_delay() -> Duration {
    Duration::from_millis(MAX_NETWORK_RETRY_DELAY_MS)
}

/// Default maximum honored `Retry-After` as Duration.
#[must_use]
pub const fn max_retry_after() -> Duration {
    Duration::from_secs(MAX_RETRY_AFTER_SECS)
}

/// Default idle connection TTL as Duration.
#[must_use]
pub const fn connection_idle_ttl() -> Duration {
    Duration::from_secs(CONNECTION_IDLE_TTL_SECS)
}
