//! logsift: Naive Bayes severity classifier for log lines
//!
//! Rates free-text log lines as `critical`, `warning`, `notice` or `ignore`
//! (or any label taught to it) with an incrementally trained Naive Bayes
//! model, and tails log files across invocations with a byte-offset
//! bookmark.
//!
//! # Features
//!
//! - Word frequency Naive Bayes with add-one smoothing, trained in log space
//! - Manual learning and optional autolearn from its own output
//! - Incremental log tailing with truncation and rotation detection
//! - Model and bookmark written via temp file and rename
//!
//! # Example Configuration
//!
//! ```toml
//! [model]
//! kind = "frequency"
//! retention = "retain"
//!
//! [tail]
//! truncation = "reset"
//!
//! [explain]
//! top_words = 3
//! min_contribution = 0.1
//!
//! [logging]
//! level = "warn"
//! ```
//!
//! # Example
//!
//! ```no_run
//! use logsift::bayes::bootstrap::bootstrap_model;
//! use logsift::bayes::{ModelKind, Retention};
//! use logsift::config::ExplainConfig;
//! use logsift::{Rater, Tokenizer};
//!
//! fn main() -> logsift::Result<()> {
//!     let model = bootstrap_model(ModelKind::Frequency, Retention::Retain)?;
//!     let rater = Rater::new(model, Tokenizer::new()?, &ExplainConfig::default());
//!
//!     let rated = rater.rate("Error: disk Failed.")?;
//!     println!("{}", rated);
//!     Ok(())
//! }
//! ```
//!
//! Concurrent invocations against the same model or bookmark file are not
//! coordinated; the last writer wins.

pub mod bayes;
pub mod config;
pub mod cursor;
pub mod error;
pub mod rater;
pub mod store;
pub mod tail;
pub mod tokenizer;

pub use bayes::{Classifier, Model};
pub use config::Config;
pub use cursor::LogCursor;
pub use error::{LogsiftError, Result};
pub use rater::{Classification, Rater};
pub use store::ModelStore;
pub use tail::{run_tail, TailOptions, TailReport};
pub use tokenizer::Tokenizer;
