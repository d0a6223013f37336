//! Per-call request options and their merge with the client config.

use std::time::Duration;

use url::Url;

use crate::config::{ClientConfig, defaults};

/// Which base address a call is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiBase {
    /// Regular API calls.
    #[default]
    Api,
    /// File uploads.
    Uploads,
    /// Connect OAuth endpoints.
    Connect,
}

/// Body encoding mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiMode {
    /// Form-encoded bodies.
    #[default]
    Standard,
    /// JSON bodies for preview endpoints.
    Preview,
}

/// Options for a single call. Every field left `None` falls back to the
/// [`ClientConfig`] value.
///
/// # Example
///
/// ```
/// use stripe_core::request::RequestOptions;
/// use std::time::Duration;
///
/// let options = RequestOptions::new()
///     .with_idempotency_key("order-6735")
///     .with_stripe_account("acct_123")
///     .with_timeout(Duration::from_secs(10));
///
/// assert_eq!(options.idempotency_key.as_deref(), Some("order-6735"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// API key for this call.
    pub api_key: Option<String>,
    /// Connected account to act on behalf of.
    pub stripe_account: Option<String>,
    /// Idempotency key; generated for POST calls when absent.
    pub idempotency_key: Option<String>,
    /// Extra headers applied after all others.
    pub headers: Vec<(String, String)>,
    /// Per-attempt timeout.
    pub timeout: Option<Duration>,
    /// Deadline for the whole call including retries.
    pub deadline: Option<Duration>,
    /// API version override.
    pub api_version: Option<String>,
    /// Base address.
    pub base: Option<ApiBase>,
    /// Retry budget override.
    pub max_retries: Option<u32>,
    /// Body encoding mode.
    pub api_mode: Option<ApiMode>,
}

impl RequestOptions {
    /// Creates empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the connected account.
    #[must_use]
    pub fn with_stripe_account(mut self, account: impl Into<String>) -> Self {
        self.stripe_account = Some(account.into());
        self
    }

    /// Sets the idempotency key.
    #[must_use]
    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    /// Adds a header override.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the per-attempt timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the overall call deadline.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets the API version.
    #[must_use]
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    /// Sets the base address.
    #[must_use]
    pub const fn with_base(mut self, base: ApiBase) -> Self {
        self.base = Some(base);
        self
    }

    /// Sets the retry budget.
    #[must_use]
    pub const fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    /// Sets the body encoding mode.
    #[must_use]
    pub const fn with_api_mode(mut self, mode: ApiMode) -> Self {
        self.api_mode = Some(mode);
        self
    }

    /// Fills in preview defaults (JSON bodies, preview API version) without
    /// overriding values the caller set.
    #[must_use]
    pub fn into_preview(mut self) -> Self {
        self.api_mode.get_or_insert(ApiMode::Preview);
        self.api_version
            .get_or_insert_with(|| defaults::PREVIEW_API_VERSION.to_string());
        self
    }

    /// Merges these options over the client config.
    #[must_use]
    pub fn resolve(&self, config: &ClientConfig) -> ResolvedOptions {
        let base = self.base.unwrap_or_default();
        ResolvedOptions {
            api_key: self.api_key.clone().or_else(|| config.api_key.clone()),
            stripe_account: self
                .stripe_account
                .clone()
                .or_else(|| config.stripe_account.clone()),
            idempotency_key: self.idempotency_key.clone(),
            headers: self.headers.clone(),
            attempt_timeout: self.timeout.unwrap_or_else(|| config.attempt_timeout()),
            deadline: self.deadline.or(config.call_timeout),
            api_version: self
                .api_version
                .clone()
                .unwrap_or_else(|| config.api_version.clone()),
            base_url: config.base_url(base).clone(),
            max_retries: self.max_retries.unwrap_or(config.max_network_retries),
            api_mode: self.api_mode.unwrap_or_default(),
        }
    }
}

/// Options after merging with the client config; what a call actually uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOptions {
    /// API key; `None` is rejected when the request is built.
    pub api_key: Option<String>,
    /// Connected account.
    pub stripe_account: Option<String>,
    /// Idempotency key in effect.
    pub idempotency_key: Option<String>,
    /// Header overrides.
    pub headers: Vec<(String, String)>,
    /// Per-attempt timeout.
    pub attempt_timeout: Duration,
    /// Overall call deadline.
    pub deadline: Option<Duration>,
    /// API version.
    pub api_version: String,
    /// Base URL the path is joined to.
    pub base_url: Url,
    /// Retry budget.
    pub max_retries: u32,
    /// Body encoding mode.
    pub api_mode: ApiMode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_values_win_over_config() {
        let config = ClientConfig::builder()
            .api_key("sk_test_config")
            .stripe_account("acct_config")
            .max_network_retries(5)
            .build();
        let options = RequestOptions::new()
            .with_api_key("sk_test_call")
            .with_max_retries(0)
            .with_timeout(Duration::from_secs(3));

        let resolved = options.resolve(&config);

        assert_eq!(resolved.api_key.as_deref(), Some("sk_test_call"));
        assert_eq!(resolved.stripe_account.as_deref(), Some("acct_config"));
        assert_eq!(resolved.max_retries, 0);
        assert_eq!(resolved.attempt_timeout, Duration::from_secs(3));
    }

    #[test]
    fn config_fills_missing_values() {
        let config = ClientConfig::builder()
            .call_timeout(Duration::from_secs(20))
            .build();

        let resolved = RequestOptions::new().resolve(&config);

        assert!(resolved.api_key.is_none());
        assert_eq!(resolved.api_version, defaults::API_VERSION);
        assert_eq!(resolved.deadline, Some(Duration::from_secs(20)));
        assert_eq!(resolved.attempt_timeout, config.attempt_timeout());
        assert_eq!(resolved.base_url.as_str(), "https://api.stripe.com/");
        assert_eq!(resolved.api_mode, ApiMode::Standard);
    }

    #[test]
    fn base_selects_url() {
        let config = ClientConfig::default();

        let resolved = RequestOptions::new()
            .with_base(ApiBase::Uploads)
            .resolve(&config);

        assert_eq!(resolved.base_url.as_str(), "https://files.stripe.com/");
    }

    #[test]
    fn preview_defaults_do_not_override_caller() {
        let preview = RequestOptions::new().into_preview();
        assert_eq!(preview.api_mode, Some(ApiMode::Preview));
        assert_eq!(
            preview.api_version.as_deref(),
            Some(defaults::PREVIEW_API_VERSION)
        );

        let pinned = RequestOptions::new()
            .with_api_version("2023-10-16")
            .into_preview();
        assert_eq!(pinned.api_version.as_deref(), Some("2023-10-16"));
    }
}
