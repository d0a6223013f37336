//! Validated configuration after merging CLI and TOML sources.
//!
//! This module contains the final, validated configuration that is used
//! by the application. All validation is performed during construction.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use url::Url;

use super::cli::{Cli, Command};
use super::client::{AppInfo, ClientConfig, LogLevel};
use super::defaults;
use super::error::{ConfigError, field};
use super::toml::TomlConfig;

/// Webhook verification settings for the `verify-webhook` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookSettings {
    /// Accepted signing secrets.
    pub secrets: Vec<String>,
    /// Timestamp tolerance in seconds.
    pub tolerance: i64,
}

/// Fully validated configuration ready for use by the application.
///
/// # Construction
///
/// Use [`ValidatedConfig::from_raw`] to create from CLI args and optional TOML config.
/// Environment variables reach this layer through clap, so the effective
/// priority is CLI > environment > TOML > defaults.
#[derive(Debug)]
pub struct ValidatedConfig {
    /// Immutable settings handed to the request executor
    pub client: ClientConfig,

    /// Webhook verification settings
    pub webhook: WebhookSettings,

    /// Verbose logging enabled
    pub verbose: bool,
}

impl fmt::Display for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} webhook: {} secret(s), tolerance {}s",
            self.client,
            self.webhook.secrets.len(),
            self.webhook.tolerance,
        )
    }
}

impl ValidatedConfig {
    /// Creates a validated configuration from CLI arguments and optional TOML config.
    ///
    /// CLI arguments take precedence over TOML config values.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A URL is invalid
    /// - A timeout is zero
    /// - Retry or pool bounds are inconsistent
    /// - The log level is unknown
    /// - `verify-webhook` has no signing secret
    pub fn from_raw(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Self, ConfigError> {
        let mut client = ClientConfig::default();

        Self::apply_api(&mut client, cli, toml)?;
        Self::apply_network(&mut client, cli, toml)?;
        Self::apply_retry(&mut client, cli, toml)?;
        Self::apply_pool(&mut client, toml)?;

        client.app_info = toml.and_then(|t| t.app_info.as_ref()).map(|section| {
            let mut info = AppInfo::new(&section.name);
            info.version.clone_from(&section.version);
            info.url.clone_from(&section.url);
            info.partner_id.clone_from(&section.partner_id);
            info
        });

        client.log_level = Self::resolve_log_level(cli, toml)?;

        let webhook = Self::resolve_webhook(cli, toml)?;

        Ok(Self {
            client,
            webhook,
            verbose: cli.verbose,
        })
    }

    /// Loads and merges configuration from CLI and optional config file.
    ///
    /// If `cli.config` is set, loads the TOML file from that path (`~` is
    /// expanded to the home directory).
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file cannot be read or parsed
    /// - The merged configuration is invalid
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let toml = if let Some(ref path) = cli.config {
            Some(TomlConfig::load(&expand_home(path))?)
        } else {
            None
        };

        Self::from_raw(cli, toml.as_ref())
    }

    fn apply_api(
        client: &mut ClientConfig,
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<(), ConfigError> {
        let api = toml.map(|t| &t.api);

        if let Some(key) = cli
            .api_key
            .as_deref()
            .or_else(|| api.and_then(|a| a.api_key.as_deref()))
        {
            client.api_key = Some(validate_api_key(key)?);
        }

        client.stripe_account = cli
            .stripe_account
            .clone()
            .or_else(|| api.and_then(|a| a.stripe_account.clone()));

        if let Some(version) = cli
            .api_version
            .clone()
            .or_else(|| api.and_then(|a| a.api_version.clone()))
        {
            client.api_version = version;
        }

        if let Some(url) = cli
            .api_base
            .as_deref()
            .or_else(|| api.and_then(|a| a.api_base.as_deref()))
        {
            client.api_base = parse_url("api_base", url)?;
        }
        if let Some(url) = api.and_then(|a| a.uploads_base.as_deref()) {
            client.uploads_base = parse_url("uploads_base", url)?;
        }
        if let Some(url) = api.and_then(|a| a.connect_base.as_deref()) {
            client.connect_base = parse_url("connect_base", url)?;
        }

        Ok(())
    }

    fn apply_network(
        client: &mut ClientConfig,
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<(), ConfigError> {
        let network = toml.map(|t| &t.network);

        // Priority: CLI explicit > TOML > default
        client.open_timeout = seconds(
            "open_timeout",
            cli.open_timeout
                .or_else(|| network.and_then(|n| n.open_timeout)),
            client.open_timeout,
        )?;
        client.read_timeout = seconds(
            "read_timeout",
            cli.read_timeout
                .or_else(|| network.and_then(|n| n.read_timeout)),
            client.read_timeout,
        )?;
        client.write_timeout = seconds(
            "write_timeout",
            network.and_then(|n| n.write_timeout),
            client.write_timeout,
        )?;

        if let Some(secs) = cli
            .call_timeout
            .or_else(|| network.and_then(|n| n.call_timeout))
        {
            client.call_timeout = Some(seconds("call_timeout", Some(secs), Duration::ZERO)?);
        }

        if let Some(url) = cli
            .proxy
            .as_deref()
            .or_else(|| network.and_then(|n| n.proxy.as_deref()))
        {
            client.proxy = Some(parse_url("proxy", url)?);
        }

        if let Some(verify) = network.and_then(|n| n.verify_ssl_certs) {
            client.verify_ssl_certs = verify;
        }

        client.ca_bundle_path = cli
            .ca_bundle
            .as_deref()
            .or_else(|| network.and_then(|n| n.ca_bundle_path.as_deref()))
            .map(expand_home);

        // Flags only disable
        client.enable_telemetry = !cli.no_telemetry
            && network
                .and_then(|n| n.enable_telemetry)
                .unwrap_or(client.enable_telemetry);

        Ok(())
    }

    fn apply_retry(
        client: &mut ClientConfig,
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<(), ConfigError> {
        let retry = toml.map(|t| &t.retry);

        client.max_network_retries = cli
            .max_retries
            .or_else(|| retry.and_then(|r| r.max_network_retries))
            .unwrap_or(defaults::MAX_NETWORK_RETRIES);

        let initial_ms = retry
            .and_then(|r| r.initial_delay_ms)
            .unwrap_or(defaults::INITIAL_NETWORK_RETRY_DELAY_MS);
        let max_ms = retry
            .and_then(|r| r.max_delay_ms)
            .unwrap_or(defaults::MAX_NETWORK_RETRY_DELAY_MS);

        if max_ms < initial_ms {
            return Err(ConfigError::InvalidRetry(format!(
                "max_delay_ms ({max_ms}) must be >= initial_delay_ms ({initial_ms})"
            )));
        }

        client.initial_network_retry_delay = Duration::from_millis(initial_ms);
        client.max_network_retry_delay = Duration::from_millis(max_ms);
        Ok(())
    }

    fn apply_pool(client: &mut ClientConfig, toml: Option<&TomlConfig>) -> Result<(), ConfigError> {
        let pool = toml.map(|t| &t.pool);

        let total = pool
            .and_then(|p| p.max_connections)
            .unwrap_or(defaults::MAX_CONNECTIONS);
        let per_host = pool
            .and_then(|p| p.max_connections_per_host)
            .unwrap_or(defaults::MAX_CONNECTIONS_PER_HOST);

        if total == 0 {
            return Err(ConfigError::InvalidPool(
                "max_connections must be greater than 0".to_string(),
            ));
        }
        if per_host > total {
            return Err(ConfigError::InvalidPool(format!(
                "max_connections_per_host ({per_host}) must be <= max_connections ({total})"
            )));
        }

        client.max_connections = total;
        client.max_connections_per_host = per_host;
        client.connection_idle_ttl = seconds(
            "idle_ttl",
            pool.and_then(|p| p.idle_ttl),
            client.connection_idle_ttl,
        )?;
        Ok(())
    }

    fn resolve_log_level(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<Option<LogLevel>, ConfigError> {
        if cli.verbose {
            return Ok(Some(LogLevel::Debug));
        }

        cli.log_level
            .as_deref()
            .or_else(|| toml.and_then(|t| t.logging.level.as_deref()))
            .map(|s| s.parse::<LogLevel>().map_err(ConfigError::InvalidLogLevel))
            .transpose()
    }

    fn resolve_webhook(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<WebhookSettings, ConfigError> {
        let section = toml.map(|t| &t.webhook);
        let (cli_secrets, cli_tolerance) = match &cli.command {
            Command::VerifyWebhook {
                secrets, tolerance, ..
            } => (secrets.as_slice(), *tolerance),
            _ => (&[][..], None),
        };

        // CLI secrets replace TOML secrets entirely
        let secrets: Vec<String> = if cli_secrets.is_empty() {
            section.map(|s| s.secrets.clone()).unwrap_or_default()
        } else {
            cli_secrets.to_vec()
        };

        if matches!(cli.command, Command::VerifyWebhook { .. }) && secrets.is_empty() {
            return Err(ConfigError::missing(
                field::WEBHOOK_SECRET,
                "Use --secret, STRIPE_WEBHOOK_SECRET, or set webhook.secrets in config file",
            ));
        }

        let tolerance = cli_tolerance
            .or_else(|| section.and_then(|s| s.tolerance))
            .unwrap_or(defaults::WEBHOOK_TOLERANCE_SECS);

        Ok(WebhookSettings { secrets, tolerance })
    }
}

/// Writes the default configuration template to a file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let template = super::toml::default_config_template();
    std::fs::write(path, template).map_err(|e| ConfigError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

// Helper functions

fn validate_api_key(key: &str) -> Result<String, ConfigError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(ConfigError::InvalidApiKey {
            reason: "key is empty",
        });
    }
    if key.chars().any(char::is_whitespace) {
        return Err(ConfigError::InvalidApiKey {
            reason: "key contains whitespace",
        });
    }
    Ok(key.to_string())
}

fn parse_url(field: &'static str, s: &str) -> Result<Url, ConfigError> {
    Url::parse(s).map_err(|e| ConfigError::InvalidUrl {
        field,
        url: s.to_string(),
        reason: e.to_string(),
    })
}

fn seconds(
    field: &'static str,
    value: Option<u64>,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match value {
        None => Ok(default),
        Some(0) => Err(ConfigError::InvalidDuration {
            field,
            reason: "must be greater than 0".to_string(),
        }),
        Some(secs) => Ok(Duration::from_secs(secs)),
    }
}

/// Expands a leading `~` to the user's home directory.
fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    dirs::home_dir().map_or_else(|| path.to_path_buf(), |home| home.join(rest))
}
