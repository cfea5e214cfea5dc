//! Model persistence
//!
//! The model is stored as a JSON envelope carrying a format number, the save
//! time and the full model state (accumulated counts and trained tables).
//! Writes go to a temporary sibling first and are renamed into place, so a
//! reader never observes a half-written model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::bayes::{Classifier, Model};
use crate::error::{LogsiftError, Result};

/// Current on-disk format
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoredModel {
    format: u32,
    saved_at: DateTime<Utc>,
    model: Model,
}

/// Model file at a fixed path
#[derive(Debug, Clone)]
pub struct ModelStore {
    path: PathBuf,
}

impl ModelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored model.
    ///
    /// Returns `Ok(None)` when no model file exists yet. A file that exists
    /// but cannot be read or decoded is a `StoreUnavailable` error.
    pub fn load(&self) -> Result<Option<Model>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No model at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(self.unavailable(e.to_string())),
        };

        let stored: StoredModel =
            serde_json::from_slice(&bytes).map_err(|e| self.unavailable(e.to_string()))?;

        if stored.format != FORMAT_VERSION {
            return Err(self.unavailable(format!(
                "unsupported format {} (expected {})",
                stored.format, FORMAT_VERSION
            )));
        }

        info!(
            "Loaded {} model from {} (saved {}, {} labels, {} words)",
            stored.model.kind(),
            self.path.display(),
            stored.saved_at.to_rfc3339(),
            stored.model.labels().len(),
            stored.model.vocabulary_size()
        );

        Ok(Some(stored.model))
    }

    /// Save the model, replacing any previous file
    pub fn save(&self, model: &Model) -> Result<()> {
        let stored = StoredModel {
            format: FORMAT_VERSION,
            saved_at: Utc::now(),
            model: model.clone(),
        };

        let data = serde_json::to_vec(&stored)?;
        write_atomic(&self.path, &data)?;

        info!("Saved model to {} ({} bytes)", self.path.display(), data.len());
        Ok(())
    }

    fn unavailable(&self, reason: String) -> LogsiftError {
        LogsiftError::StoreUnavailable {
            path: self.path.clone(),
            reason,
        }
    }
}

/// Write `data` to a temporary sibling of `path`, then rename it over `path`
pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut tmp_name = OsString::from(path.as_os_str());
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let mut file = fs::File::create(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp_path, path)?;
    Ok(())
}
