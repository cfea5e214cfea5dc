//! Configuration for logsift

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::bayes::{ModelKind, Retention};
use crate::cursor::TruncationPolicy;
use crate::error::{LogsiftError, Result};

/// Main configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Model configuration
    #[serde(default)]
    pub model: ModelConfig,
    /// Tail mode configuration
    #[serde(default)]
    pub tail: TailConfig,
    /// Highlight and explain configuration
    #[serde(default)]
    pub explain: ExplainConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Model configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ModelConfig {
    /// Classifier variant used when bootstrapping a new model
    #[serde(default)]
    pub kind: ModelKind,
    /// Keep or discard accumulated counts after training
    #[serde(default)]
    pub retention: Retention,
}

/// Tail mode configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TailConfig {
    /// Restart position after log truncation or rotation
    #[serde(default)]
    pub truncation: TruncationPolicy,
}

/// Highlight configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExplainConfig {
    /// Maximum number of highlighted words per line
    #[serde(default = "default_top_words")]
    pub top_words: usize,
    /// Minimum single-word score for a highlight
    #[serde(default = "default_min_contribution")]
    pub min_contribution: f64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_top_words() -> usize {
    3
}

fn default_min_contribution() -> f64 {
    0.1
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for ExplainConfig {
    fn default() -> Self {
        Self {
            top_words: default_top_words(),
            min_contribution: default_min_contribution(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| LogsiftError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| LogsiftError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.explain.top_words == 0 {
            return Err(LogsiftError::Config(
                "explain.top_words must be at least 1".to_string(),
            ));
        }

        if !(0.0..1.0).contains(&self.explain.min_contribution) {
            return Err(LogsiftError::Config(format!(
                "explain.min_contribution must be in [0, 1), got {}",
                self.explain.min_contribution
            )));
        }

        if self.logging.level.trim().is_empty() {
            return Err(LogsiftError::Config("logging.level must not be empty".to_string()));
        }

        Ok(())
    }
}
