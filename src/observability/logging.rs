//! Logging configuration.

use serde::Deserialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Default filter directive when neither `RUST_LOG` nor a level is set.
pub const DEFAULT_LEVEL: &str = "info";

/// Output format of log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable, multi-line output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Parses a format name, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `spanner_bridge=debug`.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
    /// Append log lines to this file instead of stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL.to_string(),
            format: LogFormat::default(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Builds the subscriber filter.
    ///
    /// `RUST_LOG` wins when set; an unparseable level falls back to
    /// [`DEFAULT_LEVEL`].
    #[must_use]
    pub fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
    }
}
