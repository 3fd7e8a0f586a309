//! Logging setup using tracing and tracing-subscriber
//!
//! Logs go to stderr, as plain text or one JSON object per line. The level
//! follows the verbose/quiet flags unless RUST_LOG overrides it. Stdout is
//! left alone so commands can print their results there.

use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Stderr log line format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(crate::Error::Config(format!(
                "Unknown log format '{}', expected text or json",
                other
            ))),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    /// Verbosity level adjustment: -1 for quiet, 0 for normal, +1 for verbose
    pub verbosity: i8,
    pub format: LogFormat,
}

impl LogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set verbose mode (+1 verbosity)
    pub fn verbose(mut self) -> Self {
        self.verbosity = 1;
        self
    }

    /// Set quiet mode (-1 verbosity)
    pub fn quiet(mut self) -> Self {
        self.verbosity = -1;
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Get the minimum log level based on verbosity
    fn min_level(&self) -> Level {
        match self.verbosity {
            v if v < 0 => Level::WARN,
            0 => Level::INFO,
            _ => Level::DEBUG,
        }
    }
}

/// Initialize logging from the global verbose/quiet flags
pub fn init(verbose: bool, quiet: bool, format: LogFormat) -> crate::Result<()> {
    let config = LogConfig {
        verbosity: if quiet {
            -1
        } else if verbose {
            1
        } else {
            0
        },
        format,
    };
    init_with_config(config)
}

/// Install the global subscriber
///
/// Fails if a global subscriber is already set.
pub fn init_with_config(config: LogConfig) -> crate::Result<()> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(config.min_level().into())
        .from_env_lossy();

    let (text_layer, json_layer) = match config.format {
        LogFormat::Text => (
            Some(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            ),
            None,
        ),
        LogFormat::Json => (
            None,
            Some(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(false),
            ),
        ),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(text_layer)
        .with(json_layer)
        .try_init()
        .map_err(|e| crate::Error::Other(format!("Failed to initialize logging: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_default() {
        let config = LogConfig::default();
        assert_eq!(config.verbosity, 0);
        assert_eq!(config.format, LogFormat::Text);
        assert_eq!(config.min_level(), Level::INFO);
    }

    #[test]
    fn test_log_config_verbose() {
        let config = LogConfig::new().verbose();
        assert_eq!(config.min_level(), Level::DEBUG);
    }

    #[test]
    fn test_log_config_quiet() {
        let config = LogConfig::new().quiet();
        assert_eq!(config.min_level(), Level::WARN);
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_init_twice_fails() {
        let config = LogConfig::new().with_format(LogFormat::Json);
        // The first call may lose to another test's subscriber; the second
        // must always fail.
        let _ = init_with_config(config.clone());
        assert!(init_with_config(config).is_err());
    }
}
