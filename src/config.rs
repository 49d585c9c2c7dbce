//! Import configuration.

use crate::error::ImportError;
use crate::model::default_epoch_date;
use crate::store::MAX_BATCH_WRITES;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_INPUT_PATH: &str = "lib/doublet.csv";
pub const DEFAULT_CREDENTIALS_PATH: &str = "tools/service-account-key.json";
pub const DEFAULT_COMMIT_TIMEOUT_SECS: u64 = 60;

pub const PUZZLES_COLLECTION: &str = "puzzles";
pub const CONFIG_COLLECTION: &str = "config";
pub const SUMMARY_DOCUMENT_ID: &str = "puzzles";

/// Everything one import run needs to know.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub input_path: PathBuf,
    pub credentials_path: PathBuf,
    /// Lines per atomic commit; at most [`MAX_BATCH_WRITES`].
    pub window_size: usize,
    pub epoch_date: DateTime<Utc>,
    pub puzzles_collection: String,
    pub config_collection: String,
    pub summary_id: String,
    /// Bound on each store round trip. `None` waits indefinitely.
    pub commit_timeout: Option<Duration>,
    pub project_id: Option<String>,
    pub emulator_host: Option<String>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            credentials_path: PathBuf::from(DEFAULT_CREDENTIALS_PATH),
            window_size: MAX_BATCH_WRITES,
            epoch_date: default_epoch_date(),
            puzzles_collection: PUZZLES_COLLECTION.to_string(),
            config_collection: CONFIG_COLLECTION.to_string(),
            summary_id: SUMMARY_DOCUMENT_ID.to_string(),
            commit_timeout: Some(Duration::from_secs(DEFAULT_COMMIT_TIMEOUT_SECS)),
            project_id: None,
            emulator_host: None,
        }
    }
}

/// Windows must hold at least one line and fit in one store batch.
///
/// # Errors
///
/// Returns [`ImportError::InvalidConfig`] if `window_size` is outside `1..=MAX_BATCH_WRITES`.
pub fn check_window_size(window_size: usize) -> Result<(), ImportError> {
    if window_size == 0 || window_size > MAX_BATCH_WRITES {
        return Err(ImportError::InvalidConfig(format!(
            "window size must be between 1 and {MAX_BATCH_WRITES}, got {window_size}"
        )));
    }
    Ok(())
}

impl ImportConfig {
    /// Check the settings the store cannot check for us.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::InvalidConfig`] if the window size is outside
    /// `1..=MAX_BATCH_WRITES` or a collection/document name is empty.
    pub fn validate(&self) -> Result<(), ImportError> {
        check_window_size(self.window_size)?;
        for (name, value) in [
            ("puzzles collection", &self.puzzles_collection),
            ("config collection", &self.config_collection),
            ("summary document id", &self.summary_id),
        ] {
            if value.is_empty() {
                return Err(ImportError::InvalidConfig(format!("{name} is empty")));
            }
        }
        Ok(())
    }
}
