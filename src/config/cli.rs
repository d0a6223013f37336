//! CLI argument parsing using clap.
//!
//! Defines the command-line interface with all options and subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::defaults;

/// stripe-core: request engine and webhook verifier for the Stripe API
///
/// Sends authenticated API requests with retries and verifies webhook
/// signatures.
#[derive(Debug, Parser)]
#[command(name = "stripe-core")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,

    /// Secret API key
    #[arg(long = "api-key", env = "STRIPE_API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Connected account to act on behalf of
    #[arg(long = "stripe-account", global = true)]
    pub stripe_account: Option<String>,

    /// API version header value
    #[arg(long = "api-version", global = true)]
    pub api_version: Option<String>,

    /// Base URL for API requests
    #[arg(long = "api-base", global = true)]
    pub api_base: Option<String>,

    /// Maximum number of retries after the first attempt
    #[arg(long = "max-retries", env = "STRIPE_MAX_NETWORK_RETRIES", global = true)]
    pub max_retries: Option<u32>,

    /// Connection open timeout in seconds
    #[arg(long = "open-timeout", global = true)]
    pub open_timeout: Option<u64>,

    /// Response read timeout in seconds
    #[arg(long = "read-timeout", global = true)]
    pub read_timeout: Option<u64>,

    /// Deadline for a whole call including retries, in seconds
    #[arg(long = "call-timeout", global = true)]
    pub call_timeout: Option<u64>,

    /// Proxy URL for all traffic
    #[arg(long, env = "STRIPE_PROXY", global = true)]
    pub proxy: Option<String>,

    /// Additional PEM trust bundle
    #[arg(long = "ca-bundle", global = true)]
    pub ca_bundle: Option<PathBuf>,

    /// Do not report request metrics on subsequent requests
    #[arg(long = "no-telemetry", global = true)]
    pub no_telemetry: bool,

    /// Path to configuration file
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Log level: debug, info, warn, or error (`STRIPE_LOG` directives override it)
    #[arg(long = "log-level", global = true)]
    pub log_level: Option<String>,

    /// Enable verbose logging (same as --log-level debug)
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

/// Subcommands for stripe-core
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a default configuration file
    Init {
        /// Output path for the configuration file
        #[arg(long, short, default_value = defaults::CONFIG_FILE_NAME)]
        output: PathBuf,
    },

    /// Send one API request and print the JSON response
    Request {
        /// HTTP method (GET, POST, DELETE)
        method: String,

        /// Request path, e.g. /v1/customers
        path: String,

        /// Parameter in 'key=value' form; brackets nest (can be specified multiple times)
        #[arg(long = "data", short = 'd', value_name = "K=V")]
        data: Vec<String>,

        /// Idempotency key (generated for POST when omitted)
        #[arg(long = "idempotency-key")]
        idempotency_key: Option<String>,

        /// Extra header in 'Key: Value' or 'Key=Value' form (can be specified multiple times)
        #[arg(long = "header", short = 'H', value_name = "K=V")]
        headers: Vec<String>,

        /// Send in preview mode (JSON body, preview API version)
        #[arg(long)]
        preview: bool,
    },

    /// Verify a webhook payload against its signature header
    VerifyWebhook {
        /// Value of the Stripe-Signature header
        #[arg(long = "signature")]
        signature: String,

        /// Signing secret (can be specified multiple times during rotation)
        #[arg(long = "secret", env = "STRIPE_WEBHOOK_SECRET", value_delimiter = ',', hide_env_values = true)]
        secrets: Vec<String>,

        /// File holding the raw payload; reads stdin when omitted
        #[arg(long)]
        payload: Option<PathBuf>,

        /// Timestamp tolerance in seconds; 0 disables the check
        #[arg(long)]
        tolerance: Option<i64>,
    },
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parses CLI arguments from an iterator (useful for testing).
    pub fn parse_from_iter<I, T>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(iter)
    }

    /// Parses CLI arguments from an iterator, returning clap's error.
    ///
    /// # Errors
    ///
    /// Returns the clap error for unknown flags or missing arguments.
    pub fn try_parse_from_iter<I, T>(iter: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::try_parse_from(iter)
    }

    /// Returns true if this is the init command.
    #[must_use]
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Command::Init { .. })
    }
}
