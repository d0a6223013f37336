//! Application startup and utilities.
//!
//! This module contains exit codes, tracing setup, and error hints
//! that support the main entry point.

use stripe_core::config::{ConfigError, LogLevel, field};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Environment variable holding log directives; `RUST_LOG` is used when unset.
pub const LOG_ENV: &str = "STRIPE_LOG";

/// Application exit codes.
pub mod exit_code {
    use std::process::ExitCode;

    /// Success (exit code 0).
    pub const SUCCESS: ExitCode = ExitCode::SUCCESS;

    /// Configuration error (exit code 1) - invalid args, missing required fields, etc.
    pub const CONFIG_ERROR: ExitCode = ExitCode::FAILURE;

    /// Runtime error (exit code 2) - network failure, API error, rejected signature, etc.
    ///
    /// Note: This is a function rather than a constant because `ExitCode::from()` is not `const fn`.
    pub fn runtime_error() -> ExitCode {
        ExitCode::from(2)
    }
}

/// Prints helpful hints for common configuration errors.
pub fn print_config_hint(error: &ConfigError) {
    match error {
        ConfigError::MissingRequired { field: f, .. } if *f == field::WEBHOOK_SECRET => {
            eprintln!("\nThe signing secret is shown next to the endpoint in the dashboard.");
        }
        ConfigError::FileRead { .. } => {
            eprintln!("\nRun 'stripe-core init' to generate a configuration template.");
        }
        _ => {}
    }
}

/// Returns the default log level when no environment directive is set.
pub fn default_level(level: Option<LogLevel>) -> Level {
    level.map_or(Level::INFO, LogLevel::as_tracing_level)
}

/// Sets up the tracing subscriber for logging.
///
/// `STRIPE_LOG` (or `RUST_LOG`) directives take precedence over `level`.
pub fn setup_tracing(level: Level) {
    let env_var = if std::env::var_os(LOG_ENV).is_some() {
        LOG_ENV
    } else {
        EnvFilter::DEFAULT_ENV
    };

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .with_env_var(env_var)
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
