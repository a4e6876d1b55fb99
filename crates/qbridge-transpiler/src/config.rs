//! Transpiler configuration.
//!
//! Supports loading configuration from:
//! 1. Configuration files (YAML)
//! 2. Environment variables (with `QBRIDGE_` prefix)
//!
//! Environment variables take precedence over the file, which takes
//! precedence over defaults.
//!
//! ```yaml
//! bridges: [qbridge]
//! disabled_conversions:
//!   - source: qasm2
//!     target: qasm3
//! logging:
//!   level: debug
//!   format: json
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::program::ProgramType;

/// Complete transpiler configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranspilerConfig {
    /// Bridge types, tried in order when no direct edge exists.
    #[serde(default = "default_bridges")]
    pub bridges: Vec<ProgramType>,

    /// Edges removed from the default registry.
    #[serde(default)]
    pub disabled_conversions: Vec<ConversionRef>,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// A `(source, target)` pair naming one edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRef {
    /// Source type of the edge.
    pub source: ProgramType,
    /// Target type of the edge.
    pub target: ProgramType,
}

impl fmt::Display for ConversionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.source, self.target)
    }
}

impl FromStr for ConversionRef {
    type Err = ConfigError;

    /// Parse `source->target`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (source, target) = s.split_once("->").ok_or_else(|| {
            ConfigError::ParseError(format!("Expected 'source->target', got '{s}'"))
        })?;
        let parse = |name: &str| {
            name.parse::<ProgramType>()
                .map_err(|e| ConfigError::ParseError(e.to_string()))
        };
        Ok(Self {
            source: parse(source)?,
            target: parse(target)?,
        })
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: console, json
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_bridges() -> Vec<ProgramType> {
    vec![ProgramType::Qbridge]
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "console".to_string()
}

impl Default for TranspilerConfig {
    fn default() -> Self {
        Self {
            bridges: default_bridges(),
            disabled_conversions: vec![],
            logging: LoggingConfig::default(),
        }
    }
}

impl TranspilerConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::IoError(format!(
                "Failed to read config file {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from a YAML document.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        serde_yaml_ng::from_str(contents)
            .map_err(|e| ConfigError::ParseError(format!("Failed to parse config: {e}")))
    }

    /// Load configuration from environment variables only.
    ///
    /// Environment variables:
    /// - `QBRIDGE_BRIDGES`: comma-separated bridge types
    /// - `QBRIDGE_DISABLED_CONVERSIONS`: comma-separated `source->target` pairs
    /// - `QBRIDGE_LOG_LEVEL`: log level
    /// - `QBRIDGE_LOG_FORMAT`: `console` or `json`
    pub fn from_env() -> Self {
        Self::default().merge_env()
    }

    /// Load configuration with the following precedence:
    /// 1. Load from file if provided
    /// 2. Apply environment variable overrides
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        let config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = config.merge_env();
        config.validate()?;
        Ok(config)
    }

    fn merge_env(self) -> Self {
        self.merge_vars(|key| std::env::var(key).ok())
    }

    /// Merge variables from `lookup` into this configuration. Variables that
    /// are absent leave the corresponding fields unchanged; values that do
    /// not parse are logged and skipped.
    pub fn merge_vars(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = lookup("QBRIDGE_BRIDGES") {
            match parse_list::<ProgramType>(&v) {
                Ok(bridges) => self.bridges = bridges,
                Err(e) => warn!(value = %v, error = %e, "ignoring QBRIDGE_BRIDGES"),
            }
        }
        if let Some(v) = lookup("QBRIDGE_DISABLED_CONVERSIONS") {
            match parse_list::<ConversionRef>(&v) {
                Ok(disabled) => self.disabled_conversions = disabled,
                Err(e) => warn!(value = %v, error = %e, "ignoring QBRIDGE_DISABLED_CONVERSIONS"),
            }
        }
        if let Some(v) = lookup("QBRIDGE_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Some(v) = lookup("QBRIDGE_LOG_FORMAT") {
            self.logging.format = v;
        }
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (i, bridge) in self.bridges.iter().enumerate() {
            if self.bridges[..i].contains(bridge) {
                return Err(ConfigError::ValidationError(format!(
                    "Bridge '{bridge}' listed more than once"
                )));
            }
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log level: {other}"
                )));
            }
        }

        match self.logging.format.as_str() {
            "console" | "json" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log format: {other}"
                )));
            }
        }

        Ok(())
    }
}

fn parse_list<T>(value: &str) -> Result<Vec<T>, String>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| item.parse::<T>().map_err(|e| e.to_string()))
        .collect()
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = TranspilerConfig::default();
        assert_eq!(config.bridges, vec![ProgramType::Qbridge]);
        assert!(config.disabled_conversions.is_empty());
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_yaml() {
        let config = TranspilerConfig::from_yaml(
            r"
bridges: [qbridge, qasm3]
disabled_conversions:
  - source: qasm2
    target: qasm3
logging:
  level: debug
",
        )
        .unwrap();
        assert_eq!(config.bridges, vec![ProgramType::Qbridge, ProgramType::Qasm3]);
        assert_eq!(
            config.disabled_conversions,
            vec![ConversionRef {
                source: ProgramType::Qasm2,
                target: ProgramType::Qasm3
            }]
        );
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "console");
    }

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config = TranspilerConfig::from_yaml("{}").unwrap();
        assert_eq!(config, TranspilerConfig::default());
    }

    #[test]
    fn test_unknown_bridge_rejected() {
        assert!(matches!(
            TranspilerConfig::from_yaml("bridges: [cirq]"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_merge_vars() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("QBRIDGE_BRIDGES", "qasm3, qbridge"),
            ("QBRIDGE_DISABLED_CONVERSIONS", "qbridge->ionq,qasm2->qasm3"),
            ("QBRIDGE_LOG_FORMAT", "json"),
        ]);
        let config = TranspilerConfig::default()
            .merge_vars(|key| vars.get(key).map(|v| (*v).to_string()));
        assert_eq!(config.bridges, vec![ProgramType::Qasm3, ProgramType::Qbridge]);
        assert_eq!(config.disabled_conversions.len(), 2);
        assert_eq!(config.disabled_conversions[0].to_string(), "qbridge->ionq");
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_bad_env_value_is_skipped() {
        let config = TranspilerConfig::default().merge_vars(|key| {
            (key == "QBRIDGE_BRIDGES").then(|| "nowhere".to_string())
        });
        assert_eq!(config.bridges, vec![ProgramType::Qbridge]);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = TranspilerConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = TranspilerConfig::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());

        let mut config = TranspilerConfig::default();
        config.bridges = vec![ProgramType::Qbridge, ProgramType::Qbridge];
        assert!(config.validate().is_err());
    }
}
