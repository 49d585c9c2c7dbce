//! Command-line arguments for the `upload-puzzles` binary.
//!
//! Every flag is optional; with none given the importer uses the defaults in
//! [`crate::config`].

use crate::config::{
    DEFAULT_COMMIT_TIMEOUT_SECS, DEFAULT_CREDENTIALS_PATH, DEFAULT_INPUT_PATH, ImportConfig,
};
use crate::store::MAX_BATCH_WRITES;
use chrono::{DateTime, Utc};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "upload-puzzles", version, about = "Upload Daily Doublet puzzles")]
pub struct CliArgs {
    /// Puzzle file: one ladder per line, comma-separated words
    #[arg(long, env = "DOUBLET_INPUT", default_value = DEFAULT_INPUT_PATH)]
    pub input: PathBuf,

    /// Service account key file
    #[arg(long, env = "GOOGLE_APPLICATION_CREDENTIALS", default_value = DEFAULT_CREDENTIALS_PATH)]
    pub credentials: PathBuf,

    /// Lines per atomic commit
    #[arg(long, default_value_t = MAX_BATCH_WRITES)]
    pub window_size: usize,

    /// Day zero of the puzzle rotation (RFC 3339)
    #[arg(long, value_parser = parse_epoch_date)]
    pub epoch_date: Option<DateTime<Utc>>,

    /// Seconds to wait for each store acknowledgement; 0 waits forever
    #[arg(long, default_value_t = DEFAULT_COMMIT_TIMEOUT_SECS)]
    pub commit_timeout_secs: u64,

    /// Project to write to, instead of the key's project_id
    #[arg(long, env = "GOOGLE_CLOUD_PROJECT")]
    pub project_id: Option<String>,

    /// host:port of a local Firestore emulator
    #[arg(long, env = "FIRESTORE_EMULATOR_HOST")]
    pub emulator_host: Option<String>,
}

impl CliArgs {
    #[must_use]
    pub fn into_config(self) -> ImportConfig {
        let defaults = ImportConfig::default();
        ImportConfig {
            input_path: self.input,
            credentials_path: self.credentials,
            window_size: self.window_size,
            epoch_date: self.epoch_date.unwrap_or(defaults.epoch_date),
            commit_timeout: (self.commit_timeout_secs > 0)
                .then(|| Duration::from_secs(self.commit_timeout_secs)),
            project_id: self.project_id,
            emulator_host: self.emulator_host.filter(|h| !h.is_empty()),
            ..defaults
        }
    }
}

fn parse_epoch_date(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {e}"))
}
