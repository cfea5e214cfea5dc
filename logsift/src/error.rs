//! Error types for logsift

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for logsift operations
pub type Result<T> = std::result::Result<T, LogsiftError>;

/// logsift error types
#[derive(Error, Debug)]
pub enum LogsiftError {
    /// Configuration error (missing path, bad mode combination, bad config file)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Model file exists but cannot be read or decoded
    #[error("Model store unavailable at {path}: {reason}")]
    StoreUnavailable { path: PathBuf, reason: String },

    /// Train was called before any instance was added
    #[error("No training data: cannot train a model with zero instances")]
    NoTrainingData,

    /// Predict was called before the model was trained
    #[error("Model has not been trained")]
    ModelNotTrained,

    /// Target log file cannot be opened
    #[error("Log file unavailable at {path}: {source}")]
    LogUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Bookmark content is not a non-negative integer
    #[error("Malformed bookmark: {0}")]
    MalformedBookmark(String),

    /// Instance rejected by the model
    #[error("Invalid instance: {0}")]
    InvalidInstance(String),

    /// Tokenizer pattern failed to compile
    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
