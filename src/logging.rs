//! Logging setup.
//!
//! Structured logging via `tracing`, configured from environment variables:
//!
//! - `STAKING_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//! - `STAKING_LOG_FORMAT`: compact, pretty, json (default compact)
//! - `RUST_LOG`: full filter directive, overrides the level when set

use std::env;
use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: {}", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: Level,
    pub format: LogFormat,
    /// Overrides `level` when set
    pub filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Compact,
            filter: None,
        }
    }
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(level) = env::var("STAKING_LOG_LEVEL") {
            config.level = level.parse().unwrap_or(Level::INFO);
        }

        if let Ok(format) = env::var("STAKING_LOG_FORMAT") {
            config.format = format.parse().unwrap_or(LogFormat::Compact);
        }

        if let Ok(filter) = env::var("RUST_LOG") {
            config.filter = Some(filter);
        }

        config
    }

    /// Raise the level to debug, e.g. for a `--verbose` flag
    pub fn verbose(mut self, verbose: bool) -> Self {
        if verbose {
            self.level = Level::DEBUG;
        }
        self
    }

    fn env_filter(&self) -> Result<EnvFilter, Error> {
        let directive = self
            .filter
            .clone()
            .unwrap_or_else(|| self.level.to_string().to_lowercase());
        EnvFilter::try_new(directive)
            .map_err(|e| Error::Config(format!("Invalid log filter: {}", e)))
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), Error> {
    let filter = config.env_filter()?;
    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.format {
        LogFormat::Compact => registry
            .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };

    result.map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))
}
