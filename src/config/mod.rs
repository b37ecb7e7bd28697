//! Configuration management.
//!
//! Settings come from an optional TOML file, then `SPANNER_BRIDGE_*`
//! environment variables override individual keys.
//!
//! ```toml
//! database_path = "var/bridge.db"
//! delete_mode = "atomic"
//! identity = "native"
//!
//! [logging]
//! level = "spanner_bridge=debug"
//! format = "json"
//! ```

use crate::identity::IdentityStrategy;
use crate::observability::{LogFormat, LoggingConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Prefix of every environment override.
pub const ENV_PREFIX: &str = "SPANNER_BRIDGE_";

/// How `SpannerAdapter::delete` removes rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteMode {
    /// One atomic transaction; all matching rows or none.
    #[default]
    Atomic,
    /// Partitioned, outside any transaction. At-least-once and not atomic,
    /// so only for unconditional, idempotent deletes.
    Partitioned,
}

impl DeleteMode {
    /// Parses a mode name. Unknown names select [`DeleteMode::Atomic`].
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "partitioned" | "partitioned_dml" | "pdml" => Self::Partitioned,
            _ => Self::Atomic,
        }
    }
}

/// Main configuration for the adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdapterConfig {
    /// Database file of the bundled `SQLite` backend; `None` means in-memory.
    pub database_path: Option<PathBuf>,
    /// Strategy used by `SpannerAdapter::delete`.
    pub delete_mode: DeleteMode,
    /// Identifier generation strategy.
    pub identity: IdentityStrategy,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Database file path.
    pub database_path: Option<String>,
    /// Delete mode name.
    pub delete_mode: Option<String>,
    /// Identity strategy name.
    pub identity: Option<String>,
    /// Logging section.
    pub logging: Option<ConfigFileLogging>,
}

/// Logging section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileLogging {
    /// Filter directive.
    pub level: Option<String>,
    /// `pretty` or `json`.
    pub format: Option<String>,
    /// Log file path.
    pub file: Option<String>,
}

impl AdapterConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> crate::Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| crate::Error::OperationFailed {
                operation: "read_config_file".to_string(),
                cause: format!("{}: {e}", path.display()),
            })?;

        Self::from_toml(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for [`ConfigFile`].
    pub fn from_toml(contents: &str) -> crate::Result<Self> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|e| crate::Error::OperationFailed {
                operation: "parse_config_file".to_string(),
                cause: e.to_string(),
            })?;

        Ok(Self::from_config_file(file))
    }

    /// Converts a `ConfigFile` to `AdapterConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(path) = file.database_path.filter(|p| !p.trim().is_empty()) {
            config.database_path = Some(PathBuf::from(path));
        }
        if let Some(mode) = file.delete_mode {
            config.delete_mode = DeleteMode::parse(&mode);
        }
        if let Some(identity) = file.identity {
            config.identity = IdentityStrategy::parse(&identity);
        }
        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                config.logging.level = level;
            }
            if let Some(format) = logging.format.as_deref().and_then(LogFormat::parse) {
                config.logging.format = format;
            }
            config.logging.file = logging.file.map(PathBuf::from);
        }

        config
    }

    /// Applies `SPANNER_BRIDGE_*` environment overrides.
    ///
    /// | Variable | Key |
    /// |----------|-----|
    /// | `SPANNER_BRIDGE_DATABASE_PATH` | `database_path` |
    /// | `SPANNER_BRIDGE_DELETE_MODE` | `delete_mode` |
    /// | `SPANNER_BRIDGE_IDENTITY` | `identity` |
    /// | `SPANNER_BRIDGE_LOG_LEVEL` | `logging.level` |
    /// | `SPANNER_BRIDGE_LOG_FORMAT` | `logging.format` |
    /// | `SPANNER_BRIDGE_LOG_FILE` | `logging.file` |
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides looked up by full variable name.
    #[must_use]
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| {
            lookup(&format!("{ENV_PREFIX}{name}")).filter(|v| !v.trim().is_empty())
        };

        if let Some(path) = var("DATABASE_PATH") {
            self.database_path = Some(PathBuf::from(path));
        }
        if let Some(mode) = var("DELETE_MODE") {
            self.delete_mode = DeleteMode::parse(&mode);
        }
        if let Some(identity) = var("IDENTITY") {
            self.identity = IdentityStrategy::parse(&identity);
        }
        if let Some(level) = var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("LOG_FORMAT") {
            match LogFormat::parse(&format) {
                Some(format) => self.logging.format = format,
                None => tracing::warn!(value = %format, "ignoring unknown log format"),
            }
        }
        if let Some(file) = var("LOG_FILE") {
            self.logging.file = Some(PathBuf::from(file));
        }

        self
    }

    /// Sets the database path.
    #[must_use]
    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Sets the delete mode.
    #[must_use]
    pub const fn with_delete_mode(mut self, mode: DeleteMode) -> Self {
        self.delete_mode = mode;
        self
    }

    /// Sets the identity strategy.
    #[must_use]
    pub const fn with_identity(mut self, identity: IdentityStrategy) -> Self {
        self.identity = identity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use test_case::test_case;

    #[test_case("atomic", DeleteMode::Atomic)]
    #[test_case("Partitioned", DeleteMode::Partitioned)]
    #[test_case("pdml", DeleteMode::Partitioned)]
    #[test_case("bogus", DeleteMode::Atomic)]
    fn test_delete_mode_parse(input: &str, expected: DeleteMode) {
        assert_eq!(DeleteMode::parse(input), expected);
    }

    #[test]
    fn test_defaults() {
        let config = AdapterConfig::new();
        assert!(config.database_path.is_none());
        assert_eq!(config.delete_mode, DeleteMode::Atomic);
        assert_eq!(config.identity, IdentityStrategy::Native);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_from_toml() {
        let config = AdapterConfig::from_toml(
            r#"
            database_path = "var/bridge.db"
            delete_mode = "partitioned"
            identity = "pseudo_random"

            [logging]
            level = "debug"
            format = "json"
            file = "var/log/bridge.log"
            "#,
        )
        .unwrap();

        assert_eq!(config.database_path, Some(PathBuf::from("var/bridge.db")));
        assert_eq!(config.delete_mode, DeleteMode::Partitioned);
        assert_eq!(config.identity, IdentityStrategy::PseudoRandom);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.file, Some(PathBuf::from("var/log/bridge.log")));
    }

    #[test]
    fn test_from_toml_mode_names_are_lenient() {
        let config = AdapterConfig::from_toml(
            r#"
            delete_mode = "PDML"
            identity = "Pseudo-Random"
            "#,
        )
        .unwrap();
        assert_eq!(config.delete_mode, DeleteMode::Partitioned);
        assert_eq!(config.identity, IdentityStrategy::PseudoRandom);

        let config = AdapterConfig::from_toml("delete_mode = \"eventually\"\n").unwrap();
        assert_eq!(config.delete_mode, DeleteMode::Atomic);
    }

    #[test]
    fn test_from_toml_rejects_bad_syntax() {
        let err = AdapterConfig::from_toml("delete_mode = ").unwrap_err();
        assert!(err.to_string().contains("parse_config_file"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.toml");
        std::fs::write(&path, "delete_mode = \"partitioned\"\n").unwrap();

        let config = AdapterConfig::load_from_file(&path).unwrap();
        assert_eq!(config.delete_mode, DeleteMode::Partitioned);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = AdapterConfig::load_from_file(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(crate::Error::OperationFailed { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("SPANNER_BRIDGE_DATABASE_PATH", "/tmp/override.db"),
            ("SPANNER_BRIDGE_DELETE_MODE", "partitioned"),
            ("SPANNER_BRIDGE_LOG_FORMAT", "json"),
            ("SPANNER_BRIDGE_LOG_LEVEL", ""),
        ]
        .into_iter()
        .collect();

        let config = AdapterConfig::new()
            .with_database_path("file.db")
            .with_overrides_from(|key| env.get(key).map(ToString::to_string));

        assert_eq!(config.database_path, Some(PathBuf::from("/tmp/override.db")));
        assert_eq!(config.delete_mode, DeleteMode::Partitioned);
        assert_eq!(config.logging.format, LogFormat::Json);
        // Blank values are ignored.
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_unknown_env_log_format_is_ignored() {
        let config = AdapterConfig::new().with_overrides_from(|key| {
            (key == "SPANNER_BRIDGE_LOG_FORMAT").then(|| "xml".to_string())
        });
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }
}
