//! TOML configuration file parsing.
//!
//! Defines the structure of the configuration file with serde.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::ConfigError;

/// Root configuration structure from TOML file.
///
/// All fields are optional to allow partial configuration
/// that can be merged with CLI arguments.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Credentials, version and base URLs
    #[serde(default)]
    pub api: ApiSection,

    /// Timeouts, proxy and TLS
    #[serde(default)]
    pub network: NetworkSection,

    /// Retry policy configuration
    #[serde(default)]
    pub retry: RetrySection,

    /// Connection pool bounds
    #[serde(default)]
    pub pool: PoolSection,

    /// Embedding application, reported in the user agent
    pub app_info: Option<AppInfoSection>,

    /// Log verbosity
    #[serde(default)]
    pub logging: LoggingSection,

    /// Webhook verification defaults
    #[serde(default)]
    pub webhook: WebhookSection,
}

/// API section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiSection {
    /// Secret API key
    pub api_key: Option<String>,

    /// Connected account to act on behalf of
    pub stripe_account: Option<String>,

    /// API version header value
    pub api_version: Option<String>,

    /// Base URL for API requests
    pub api_base: Option<String>,

    /// Base URL for file uploads
    pub uploads_base: Option<String>,

    /// Base URL for Connect OAuth
    pub connect_base: Option<String>,
}

/// Network section. Durations are in seconds.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkSection {
    /// Connection open timeout
    pub open_timeout: Option<u64>,

    /// Response read timeout
    pub read_timeout: Option<u64>,

    /// Request write timeout
    pub write_timeout: Option<u64>,

    /// Deadline for a whole call including retries
    pub call_timeout: Option<u64>,

    /// Proxy URL for all traffic
    pub proxy: Option<String>,

    /// Whether server certificates are verified
    pub verify_ssl_certs: Option<bool>,

    /// Additional PEM trust bundle; `~` is expanded
    pub ca_bundle_path: Option<PathBuf>,

    /// Whether request metrics are reported on subsequent requests
    pub enable_telemetry: Option<bool>,
}

/// Retry policy configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetrySection {
    /// Maximum number of retries after the first attempt
    pub max_network_retries: Option<u32>,

    /// Backoff ceiling for the first retry, in milliseconds
    pub initial_delay_ms: Option<u64>,

    /// Cap on the backoff ceiling, in milliseconds
    pub max_delay_ms: Option<u64>,
}

/// Connection pool section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoolSection {
    /// Idle connections kept per host
    pub max_connections_per_host: Option<usize>,

    /// Open connections allowed across all hosts
    pub max_connections: Option<usize>,

    /// Idle connection lifetime in seconds
    pub idle_ttl: Option<u64>,
}

/// Application info section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppInfoSection {
    /// Application or plugin name
    pub name: String,

    /// Application version
    pub version: Option<String>,

    /// Application URL
    pub url: Option<String>,

    /// Partner program identifier
    pub partner_id: Option<String>,
}

/// Logging section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Log level: debug, info, warn, or error
    pub level: Option<String>,
}

/// Webhook section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WebhookSection {
    /// Signing secrets accepted by `verify-webhook`
    #[serde(default)]
    pub secrets: Vec<String>,

    /// Timestamp tolerance in seconds
    pub tolerance: Option<i64>,
}

impl TomlConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }
}

/// Generates a default configuration file with comments.
#[must_use]
pub fn default_config_template() -> String {
    r#"# stripe-core configuration file
#
# Priority: command-line flags > environment variables > this file > defaults.

[api]
# Secret API key (prefer the STRIPE_API_KEY environment variable)
# api_key = "sk_test_..."

# Connected account to act on behalf of
# stripe_account = "acct_..."

# API version header (default: the version pinned by this release)
# api_version = "2024-06-20"

# Base URLs
# api_base = "https://api.stripe.com"
# uploads_base = "https://files.stripe.com"
# connect_base = "https://connect.stripe.com"

[network]
# Timeouts in seconds
open_timeout = 30
read_timeout = 80
write_timeout = 30

# Deadline for a whole call including retries (default: none)
# call_timeout = 120

# Proxy for all traffic
# proxy = "http://proxy.internal:3128"

# Verify server certificates (default: true)
# verify_ssl_certs = true

# Additional PEM trust bundle
# ca_bundle_path = "~/certs/corporate.pem"

# Report last-request metrics on the next request (default: true)
# enable_telemetry = true

[retry]
# Retries after the first attempt (default: 2)
max_network_retries = 2

# Backoff bounds in milliseconds
# initial_delay_ms = 500
# max_delay_ms = 2000

[pool]
# Idle connections kept per host (default: 5)
# max_connections_per_host = 5

# Open connections across all hosts (default: 32)
# max_connections = 32

# Idle connection lifetime in seconds (default: 60)
# idle_ttl = 60

# Embedding application, reported in the user agent
# [app_info]
# name = "MyPlugin"
# version = "1.2.3"
# url = "https://example.com/plugin"
# partner_id = "pp_partner_123"

[logging]
# debug, info, warn, or error (overridden by --verbose and STRIPE_LOG)
# level = "info"

[webhook]
# Signing secrets for verify-webhook; list several while rotating
# secrets = ["whsec_..."]

# Timestamp tolerance in seconds; 0 disables the check (default: 300)
# tolerance = 300
"#
    .to_string()
}
