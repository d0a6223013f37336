//! Configuration layer for stripe-core.
//!
//! This module provides:
//! - The immutable client configuration consumed by the core ([`ClientConfig`])
//! - CLI argument parsing ([`Cli`], [`Command`])
//! - TOML configuration file parsing ([`TomlConfig`])
//! - Validated configuration ([`ValidatedConfig`])
//! - Configuration file generation ([`write_default_config`])
//! - Default values ([`defaults`])
//!
//! # Priority
//!
//! Configuration values are resolved with the following priority (highest to lowest):
//!
//! 1. **Explicit CLI arguments** - Values explicitly passed via command line
//! 2. **Environment variables** - `STRIPE_API_KEY`, `STRIPE_MAX_NETWORK_RETRIES`,
//!    `STRIPE_PROXY`, `STRIPE_WEBHOOK_SECRET` (read by clap)
//! 3. **TOML config file** - Values from the configuration file
//! 4. **Built-in defaults** - Hardcoded default values
//!
//! Webhook secrets given on the command line **replace** the TOML list
//! entirely (not merged).
//!
//! # Boolean Flag Semantics
//!
//! `--no-telemetry` only disables: it wins over `enable_telemetry = true` in
//! TOML, and its absence leaves the TOML value in effect.
//!
//! # TOML-Only Options
//!
//! Some options are TOML-only (not available via CLI):
//! - `api.uploads_base`, `api.connect_base`
//! - `network.write_timeout`, `network.verify_ssl_certs`
//! - `retry.initial_delay_ms`, `retry.max_delay_ms`
//! - `[pool]` bounds and `[app_info]`

mod cli;
mod client;
pub mod defaults;
mod error;
mod toml;
mod validated;

#[cfg(test)]
mod cli_tests;
#[cfg(test)]
mod toml_tests;

pub use cli::{Cli, Command};
pub use client::{AppInfo, ClientConfig, ClientConfigBuilder, LogLevel};
pub use error::{ConfigError, field};
pub use toml::{TomlConfig, default_config_template};
pub use validated::{ValidatedConfig, WebhookSettings, write_default_config};
