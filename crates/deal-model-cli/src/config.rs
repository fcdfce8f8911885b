//! `dealcalc.toml` loading.
//!
//! Every section is optional. A missing `--config` path means built-in
//! defaults; a file that exists but does not parse is an error.

use deal_model_core::acquisition::scenarios::ModelSettings;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::OutputFormat;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid output format: {0}. Must be one of: json, table, csv, minimal")]
    InvalidOutputFormat(String),

    #[error("Configuration file error: {0}")]
    FileError(String),

    #[error("Invalid model settings: {0}")]
    Model(#[from] deal_model_core::DealModelError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::InvalidLogLevel(s.to_string())),
        }
    }
}

impl LogLevel {
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    LogLevel::from_str(&s).map_err(serde::de::Error::custom)
}

fn deserialize_output_format<'de, D>(deserializer: D) -> Result<Option<OutputFormat>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let format = match s.to_lowercase().as_str() {
        "json" => OutputFormat::Json,
        "table" => OutputFormat::Table,
        "csv" => OutputFormat::Csv,
        "minimal" => OutputFormat::Minimal,
        _ => {
            return Err(serde::de::Error::custom(ConfigError::InvalidOutputFormat(s)));
        }
    };
    Ok(Some(format))
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    #[serde(deserialize_with = "deserialize_log_level")]
    pub level: LogLevel,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Used when `--output` is not given on the command line
    #[serde(deserialize_with = "deserialize_output_format")]
    pub format: Option<OutputFormat>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DealCalcConfig {
    pub logging: LoggingConfig,
    pub output: OutputConfig,
    pub model: ModelSettings,
}

impl DealCalcConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: DealCalcConfig = toml::from_str(content)
            .map_err(|e| ConfigError::FileError(format!("Failed to parse TOML: {}", e)))?;
        config.model.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::FileError(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Load from `path` when given, otherwise defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = DealCalcConfig::from_toml("").unwrap();
        assert_eq!(config.logging.level, LogLevel::Warn);
        assert!(config.output.format.is_none());
        assert_eq!(config.model, ModelSettings::default());
    }

    #[test]
    fn test_full_file() {
        let toml_str = r#"
            [logging]
            level = "debug"

            [output]
            format = "table"

            [[model.scenarios]]
            name = "Downside"
            growth_multiplier = "0"
            expense_growth_multiplier = "1.5"
            exit_multiple_multiplier = "0.7"
            probability = "0.4"

            [[model.scenarios]]
            name = "Plan"
            growth_multiplier = "1"
            expense_growth_multiplier = "1"
            exit_multiple_multiplier = "1"
            probability = "0.6"
        "#;
        let config = DealCalcConfig::from_toml(toml_str).unwrap();
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert!(matches!(config.output.format, Some(OutputFormat::Table)));
        assert_eq!(config.model.scenarios.len(), 2);
        assert_eq!(config.model.scenarios[0].probability, dec!(0.4));
    }

    #[test]
    fn test_bad_probabilities_rejected() {
        let toml_str = r#"
            [[model.scenarios]]
            name = "Only"
            growth_multiplier = "1"
            expense_growth_multiplier = "1"
            exit_multiple_multiplier = "1"
            probability = "0.5"
        "#;
        assert!(matches!(
            DealCalcConfig::from_toml(toml_str),
            Err(ConfigError::Model(_))
        ));
    }

    #[test]
    fn test_unknown_log_level_rejected() {
        let toml_str = r#"
            [logging]
            level = "chatty"
        "#;
        assert!(DealCalcConfig::from_toml(toml_str).is_err());
        assert!("chatty".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_missing_path_is_defaults() {
        let config = DealCalcConfig::load(None).unwrap();
        assert_eq!(config.logging.level.as_filter_str(), "warn");
    }
}
