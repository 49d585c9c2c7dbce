//! Windowed batch commits and the import run as a whole.
//!
//! Input lines are grouped into contiguous windows of `window_size` lines. Each
//! window becomes one atomic batch holding only its valid puzzles; skipped lines
//! still occupy a slot so window boundaries stay aligned to line positions.
//! Windows are committed one after another, and the first rejected window ends
//! the run. Windows before it stay committed; nothing is retried or rolled back.

use crate::config::{ImportConfig, check_window_size};
use crate::error::ImportError;
use crate::model::ImportSummary;
use crate::parser::{LineOutcome, ParsedLine, line_count, parse_puzzles};
use crate::store::DocumentStore;
use std::path::Path;
use tracing::{debug, info};

/// Outcome of a run, accumulated window by window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Input lines consumed.
    pub lines: usize,
    /// Puzzles in windows the store acknowledged.
    pub committed: usize,
    /// Line indices that were skipped, in order.
    pub skipped: Vec<usize>,
    /// Windows committed.
    pub windows: usize,
}

/// Commits parsed lines to one collection in fixed-size windows.
pub struct BatchCommitter<'a, S: DocumentStore + ?Sized> {
    store: &'a S,
    collection: &'a str,
    window_size: usize,
}

impl<'a, S: DocumentStore + ?Sized> BatchCommitter<'a, S> {
    /// # Errors
    ///
    /// Returns [`ImportError::InvalidConfig`] if `window_size` is 0 or above
    /// [`MAX_BATCH_WRITES`](crate::store::MAX_BATCH_WRITES).
    pub fn new(store: &'a S, collection: &'a str, window_size: usize) -> Result<Self, ImportError> {
        check_window_size(window_size)?;
        Ok(Self {
            store,
            collection,
            window_size,
        })
    }

    /// Commit every window of `lines`, in order.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::CommitFailure`] for the first window the store rejects.
    /// No later window is attempted.
    pub fn commit_windows<I>(&self, lines: I) -> Result<ImportReport, ImportError>
    where
        I: IntoIterator<Item = ParsedLine>,
    {
        let mut lines = lines.into_iter();
        let mut report = ImportReport::default();

        loop {
            let mut window = lines.by_ref().take(self.window_size).peekable();
            let Some(first_line) = window.peek().map(|line| line.index) else {
                break;
            };

            let mut batch = self.store.new_batch();
            let mut last_line = first_line;
            for line in window {
                last_line = line.index;
                report.lines += 1;
                match line.outcome {
                    LineOutcome::Record(record) => batch
                        .set(self.collection, record.document_id(), record.to_fields())
                        .map_err(|source| ImportError::CommitFailure {
                            window: report.windows,
                            first_line,
                            last_line,
                            source,
                        })?,
                    LineOutcome::Skipped { .. } => report.skipped.push(line.index),
                }
            }

            let puzzles = batch.len();
            debug!(
                window = report.windows,
                first_line, last_line, puzzles, "committing window"
            );
            self.store
                .commit(batch)
                .map_err(|source| ImportError::CommitFailure {
                    window: report.windows,
                    first_line,
                    last_line,
                    source,
                })?;

            report.committed += puzzles;
            report.windows += 1;
            info!("Uploaded puzzles {first_line} to {last_line}");
        }

        Ok(report)
    }
}

/// Overwrite the summary record with `total_count` committed puzzles.
///
/// # Errors
///
/// Returns [`ImportError::SummaryFailure`] if the store rejects the write.
pub fn write_summary<S: DocumentStore + ?Sized>(
    store: &S,
    config: &ImportConfig,
    total_count: usize,
) -> Result<ImportSummary, ImportError> {
    let summary = ImportSummary::new(total_count, config.epoch_date);
    store
        .set_document(
            &config.config_collection,
            &config.summary_id,
            summary.to_fields(),
        )
        .map_err(|source| ImportError::SummaryFailure { source })?;
    Ok(summary)
}

/// Import puzzles from already-loaded file contents.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, a window is rejected, or the
/// summary write fails. The summary is only written once every window is committed.
pub fn import_text<S: DocumentStore + ?Sized>(
    store: &S,
    config: &ImportConfig,
    text: &str,
) -> Result<ImportReport, ImportError> {
    config.validate()?;
    info!("Found {} puzzles", line_count(text));

    let committer = BatchCommitter::new(store, &config.puzzles_collection, config.window_size)?;
    let report = committer.commit_windows(parse_puzzles(text))?;
    write_summary(store, config, report.committed)?;

    info!(
        committed = report.committed,
        skipped = report.skipped.len(),
        windows = report.windows,
        "Import finished"
    );
    Ok(report)
}

/// Read the puzzle file at `path`.
///
/// # Errors
///
/// Returns [`ImportError::MissingInput`] if the file does not exist, or
/// [`ImportError::ReadInput`] if it cannot be read as UTF-8 text.
pub fn read_puzzle_file(path: &Path) -> Result<String, ImportError> {
    if !path.exists() {
        return Err(ImportError::missing_puzzles(path));
    }
    std::fs::read_to_string(path).map_err(|source| ImportError::ReadInput {
        path: path.to_path_buf(),
        source,
    })
}

/// Run a full import from `config.input_path` into `store`.
///
/// # Errors
///
/// See [`read_puzzle_file`] and [`import_text`].
pub fn run_import<S: DocumentStore + ?Sized>(
    store: &S,
    config: &ImportConfig,
) -> Result<ImportReport, ImportError> {
    let text = read_puzzle_file(&config.input_path)?;
    import_text(store, config, &text)
}
