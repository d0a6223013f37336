//! Immutable client configuration consumed by the request executor.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;
use url::Url;

use super::defaults;
use crate::request::ApiBase;
use crate::retry::RetryPolicy;

/// Information about the application embedding this library.
///
/// Sent with every request in the user agent so plugin authors can be
/// identified when communicating with the API provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppInfo {
    /// Application or plugin name.
    pub name: String,
    /// Partner program identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner_id: Option<String>,
    /// Application URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Application version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl AppInfo {
    /// Creates app info with only a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            partner_id: None,
            url: None,
            version: None,
        }
    }

    /// Sets the partner program identifier.
    #[must_use]
    pub fn with_partner_id(mut self, partner_id: impl Into<String>) -> Self {
        self.partner_id = Some(partner_id.into());
        self
    }

    /// Sets the application URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the application version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Formats the user agent fragment: `name/version (url)`.
    #[must_use]
    pub fn user_agent_fragment(&self) -> String {
        let mut s = self.name.clone();
        if let Some(version) = &self.version {
            s.push('/');
            s.push_str(version);
        }
        if let Some(url) = &self.url {
            s.push_str(" (");
            s.push_str(url);
            s.push(')');
        }
        s
    }
}

/// Library log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Per-attempt request and response details.
    Debug,
    /// Request summaries.
    Info,
    /// Retries and degraded behavior.
    Warn,
    /// Failures only.
    Error,
}

impl LogLevel {
    /// Returns the `tracing` level for this log level.
    #[must_use]
    pub const fn as_tracing_level(self) -> tracing::Level {
        match self {
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!(
                "unknown log level '{other}': expected debug, info, warn, or error"
            )),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// Process-wide defaults for every request, fixed at executor construction.
///
/// Call-level [`RequestOptions`](crate::request::RequestOptions) are layered
/// on top; a value set on the call always wins.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Secret API key used when a call does not supply one.
    pub api_key: Option<String>,
    /// Connected account to act on behalf of.
    pub stripe_account: Option<String>,
    /// API version header value.
    pub api_version: String,
    /// Base URL for regular API calls.
    pub api_base: Url,
    /// Base URL for file uploads.
    pub uploads_base: Url,
    /// Base URL for Connect OAuth calls.
    pub connect_base: Url,
    /// Connection open timeout.
    pub open_timeout: Duration,
    /// Response read timeout.
    pub read_timeout: Duration,
    /// Request write timeout.
    pub write_timeout: Duration,
    /// Deadline for a whole logical call including retries.
    pub call_timeout: Option<Duration>,
    /// Proxy for all traffic.
    pub proxy: Option<Url>,
    /// Whether server certificates are verified.
    pub verify_ssl_certs: bool,
    /// Additional PEM trust bundle.
    pub ca_bundle_path: Option<PathBuf>,
    /// Retries after the first attempt.
    pub max_network_retries: u32,
    /// Backoff ceiling for the first retry.
    pub initial_network_retry_delay: Duration,
    /// Backoff ceiling cap.
    pub max_network_retry_delay: Duration,
    /// Idle connections kept per host.
    pub max_connections_per_host: usize,
    /// Open connections allowed across all hosts.
    pub max_connections: usize,
    /// Idle connection lifetime.
    pub connection_idle_ttl: Duration,
    /// Whether last-request metrics are reported on the next request.
    pub enable_telemetry: bool,
    /// Embedding application, if any.
    pub app_info: Option<AppInfo>,
    /// Library log level.
    pub log_level: Option<LogLevel>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            stripe_account: None,
            api_version: defaults::API_VERSION.to_string(),
            api_base: default_url(defaults::API_BASE),
            uploads_base: default_url(defaults::UPLOADS_BASE),
            connect_base: default_url(defaults::CONNECT_BASE),
            open_timeout: defaults::open_timeout(),
            read_timeout: defaults::read_timeout(),
            write_timeout: defaults::write_timeout(),
            call_timeout: None,
            proxy: None,
            verify_ssl_certs: true,
            ca_bundle_path: None,
            max_network_retries: defaults::MAX_NETWORK_RETRIES,
            initial_network_retry_delay: defaults::initial_network_retry_delay(),
            max_network_retry_delay: defaults::max_network_retry_delay(),
            max_connections_per_host: defaults::MAX_CONNECTIONS_PER_HOST,
            max_connections: defaults::MAX_CONNECTIONS,
            connection_idle_ttl: defaults::connection_idle_ttl(),
            enable_telemetry: true,
            app_info: None,
            log_level: None,
        }
    }
}

fn default_url(s: &str) -> Url {
    Url::parse(s).expect("built-in base URLs are valid")
}

impl ClientConfig {
    /// Creates a config builder starting from defaults.
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Returns the base URL for the given address family.
    #[must_use]
    pub const fn base_url(&self, base: ApiBase) -> &Url {
        match base {
            ApiBase::Api => &self.api_base,
            ApiBase::Uploads => &self.uploads_base,
            ApiBase::Connect => &self.connect_base,
        }
    }

    /// Upper bound for a single attempt: connect, write the request, read
    /// the response.
    #[must_use]
    pub fn attempt_timeout(&self) -> Duration {
        self.open_timeout + self.write_timeout + self.read_timeout
    }

    /// Returns the retry policy described by this config.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new()
            .with_max_retries(self.max_network_retries)
            .with_initial_delay(self.initial_network_retry_delay)
            .with_max_delay(self.max_network_retry_delay)
    }
}

impl fmt::Display for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ClientConfig {{ api_base: {}, api_version: {}, api_key: {}, retries: {}, \
             timeouts: {}s/{}s/{}s, pool: {}/{} }}",
            self.api_base,
            self.api_version,
            if self.api_key.is_some() { "set" } else { "none" },
            self.max_network_retries,
            self.open_timeout.as_secs(),
            self.write_timeout.as_secs(),
            self.read_timeout.as_secs(),
            self.max_connections_per_host,
            self.max_connections,
        )
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Sets the default API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    /// Sets the default connected account.
    #[must_use]
    pub fn stripe_account(mut self, account: impl Into<String>) -> Self {
        self.config.stripe_account = Some(account.into());
        self
    }

    /// Sets the API version.
    #[must_use]
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.config.api_version = version.into();
        self
    }

    /// Sets the API base URL.
    #[must_use]
    pub fn api_base(mut self, url: Url) -> Self {
        self.config.api_base = url;
        self
    }

    /// Sets the uploads base URL.
    #[must_use]
    pub fn uploads_base(mut self, url: Url) -> Self {
        self.config.uploads_base = url;
        self
    }

    /// Sets the Connect base URL.
    #[must_use]
    pub fn connect_base(mut self, url: Url) -> Self {
        self.config.connect_base = url;
        self
    }

    /// Sets the connection open timeout.
    #[must_use]
    pub const fn open_timeout(mut self, timeout: Duration) -> Self {
        self.config.open_timeout = timeout;
        self
    }

    /// Sets the read timeout.
    #[must_use]
    pub const fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    /// Sets the write timeout.
    #[must_use]
    pub const fn write_timeout(mut self, timeout: Duration) -> Self {
        self.config.write_timeout = timeout;
        self
    }

    /// Sets the overall deadline for a logical call.
    #[must_use]
    pub const fn call_timeout(mut self, timeout: Duration) -> Self {
        self.config.call_timeout = Some(timeout);
        self
    }

    /// Sets a proxy URL.
    #[must_use]
    pub fn proxy(mut self, url: Url) -> Self {
        self.config.proxy = Some(url);
        self
    }

    /// Enables or disables certificate verification.
    #[must_use]
    pub const fn verify_ssl_certs(mut self, verify: bool) -> Self {
        self.config.verify_ssl_certs = verify;
        self
    }

    /// Sets the PEM trust bundle path.
    #[must_use]
    pub fn ca_bundle_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.ca_bundle_path = Some(path.into());
        self
    }

    /// Sets the number of retries after the first attempt.
    #[must_use]
    pub const fn max_network_retries(mut self, retries: u32) -> Self {
        self.config.max_network_retries = retries;
        self
    }

    /// Sets the retry delay bounds.
    #[must_use]
    pub const fn retry_delays(mut self, initial: Duration, max: Duration) -> Self {
        self.config.initial_network_retry_delay = initial;
        self.config.max_network_retry_delay = max;
        self
    }

    /// Sets the connection pool bounds.
    #[must_use]
    pub const fn pool_limits(mut self, per_host: usize, total: usize) -> Self {
        self.config.max_connections_per_host = per_host;
        self.config.max_connections = total;
        self
    }

    /// Sets the idle connection lifetime.
    #[must_use]
    pub const fn connection_idle_ttl(mut self, ttl: Duration) -> Self {
        self.config.connection_idle_ttl = ttl;
        self
    }

    /// Enables or disables client telemetry.
    #[must_use]
    pub const fn enable_telemetry(mut self, enabled: bool) -> Self {
        self.config.enable_telemetry = enabled;
        self
    }

    /// Sets the embedding application's info.
    #[must_use]
    pub fn app_info(mut self, info: AppInfo) -> Self {
        self.config.app_info = Some(info);
        self
    }

    /// Sets the library log level.
    #[must_use]
    pub const fn log_level(mut self, level: LogLevel) -> Self {
        self.config.log_level = Some(level);
        self
    }

    /// Builds the config.
    #[must_use]
    pub fn build(self) -> ClientConfig {
        self.config
    }
}
