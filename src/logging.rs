// ABOUTME: Logging configuration and structured logging setup for the sync engine
// ABOUTME: Configures log level and output format from environment variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structured logging built on `tracing-subscriber`, with the level taken
//! from `RUST_LOG` and the output format from `LOG_FORMAT`.

use anyhow::Result;
use std::env;
use tracing_subscriber::EnvFilter;

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty, compact)
    pub format: LogFormat,
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// `JSON` format for production logging
    Json,
    /// Pretty format for development
    Pretty,
    /// Compact format for space-constrained environments
    Compact,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Pretty,
        }
    }
}

impl LoggingConfig {
    /// Create logging configuration from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        let level = env::var("RUST_LOG").unwrap_or_else(|_| "info".into());

        let format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("compact") => LogFormat::Compact,
            _ => LogFormat::Pretty,
        };

        Self { level, format }
    }

    /// Install the global subscriber for this configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber is already installed.
    pub fn init(&self) -> Result<()> {
        let filter = EnvFilter::try_new(&self.level)
            .unwrap_or_else(|_| EnvFilter::new("info"));

        match self.format {
            LogFormat::Json => tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .try_init()
                .map_err(|e| anyhow::anyhow!("failed to install logger: {e}"))?,
            LogFormat::Compact => tracing_subscriber::fmt()
                .with_env_filter(filter)
                .compact()
                .try_init()
                .map_err(|e| anyhow::anyhow!("failed to install logger: {e}"))?,
            LogFormat::Pretty => tracing_subscriber::fmt()
                .with_env_filter(filter)
                .try_init()
                .map_err(|e| anyhow::anyhow!("failed to install logger: {e}"))?,
        }

        Ok(())
    }
}

/// Initialize logging from environment variables
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_from_env() -> Result<()> {
    LoggingConfig::from_env().init()
}
