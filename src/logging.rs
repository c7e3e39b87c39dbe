//! Structured logging setup.
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to the application. [`init`] is the one the `kinesis` binary uses: a
//! `tracing-subscriber` fmt layer filtered by `RUST_LOG` when set, otherwise
//! by the configured level.
//!
//! Events emitted by the layer:
//! - `debug!` for every vendor call, with `function` and `serial` fields
//! - `warn!` when a call returns a non-zero status or `false`
//! - `info!` when a device is opened, closed, homed or moved
//!
//! # Example
//! ```no_run
//! use kinesis_motion::logging::{self, LogFormat, LoggingConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! logging::init(&LoggingConfig {
//!     level: "debug".into(),
//!     format: LogFormat::Json,
//!     ..Default::default()
//! })?;
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

use crate::error::{KinesisError, Result};

/// Accepted values for [`LoggingConfig::level`].
pub const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, colored (for development)
    #[default]
    Pretty,
    /// Single-line, no colors
    Compact,
    /// JSON lines (for log aggregation)
    Json,
}

/// `[logging]` section of the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_level")]
    pub level: String,
    /// Output format
    #[serde(default)]
    pub format: LogFormat,
    /// Whether to include file and line numbers
    #[serde(default)]
    pub with_file_and_line: bool,
    /// Whether to enable ANSI colors (pretty format only)
    #[serde(default = "default_ansi")]
    pub with_ansi: bool,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_ansi() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
            with_file_and_line: false,
            with_ansi: default_ansi(),
        }
    }
}

/// Parse a level name, case-insensitively.
pub fn parse_level(level: &str) -> Result<Level> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => Err(KinesisError::Config {
            message: format!(
                "Invalid log level '{}'. Must be one of: {}",
                other,
                LEVELS.join(", ")
            ),
        }),
    }
}

/// Install the global subscriber.
///
/// Idempotent: if a subscriber is already installed (another component, or a
/// test harness) this returns `Ok(())` and leaves it in place.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let level = parse_level(&config.level)?;
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_ascii_lowercase()));

    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_file(config.with_file_and_line)
            .with_line_number(config.with_file_and_line)
            .with_ansi(config.with_ansi)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_file(config.with_file_and_line)
            .with_line_number(config.with_file_and_line)
            .with_ansi(false)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_file(config.with_file_and_line)
            .with_line_number(config.with_file_and_line)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(env_filter))
        .try_init()
        .or_else(|e| {
            if e.to_string().contains("a global default trace dispatcher has already been set") {
                Ok(())
            } else {
                Err(KinesisError::Config {
                    message: format!("Failed to initialize tracing: {}", e),
                })
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG").unwrap(), Level::DEBUG);
        assert_eq!(parse_level(" warn ").unwrap(), Level::WARN);
        assert!(parse_level("verbose").is_err());
    }

    #[test]
    fn test_format_from_toml() {
        let config: LoggingConfig = toml::from_str("format = \"json\"").unwrap();
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.level, "info");
        assert!(toml::from_str::<LoggingConfig>("format = \"xml\"").is_err());
    }
}
