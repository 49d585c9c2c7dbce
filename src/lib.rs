//! # doublet-loader
//!
//! Loads Daily Doublet word-ladder puzzles from a comma-separated text file into a
//! document store, in atomic batches, and then records an import summary.
//!
//! ## Pipeline
//!
//! 1. [`parser`] turns every input line into a [`PuzzleRecord`] or a skip. A puzzle's
//!    index is its line position in the file, skipped lines included.
//! 2. [`committer`] groups lines into windows of at most [`MAX_BATCH_WRITES`] and
//!    commits each window's puzzles as one atomic batch, strictly in order.
//! 3. Once every window has committed, an [`ImportSummary`] with the committed count
//!    and the rotation epoch overwrites the summary document.
//!
//! A rejected window ends the run. Earlier windows stay committed and the summary
//! is not written. Rerunning rewrites every puzzle at the same document ids.
//!
//! ## Quick Start
//!
//! ```
//! use doublet_loader::*;
//!
//! # fn main() -> Result<(), ImportError> {
//! let store = FakeDocumentStore::new();
//! let config = ImportConfig::default();
//!
//! let report = import_text(&store, &config, "CAT,COT,COG,DOG\nAAA\nONE,TWO")?;
//! assert_eq!(report.committed, 2);
//! assert_eq!(report.skipped, vec![1]);
//! assert!(store.get("puzzles", "2").unwrap().is_some());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod committer;
pub mod config;
pub mod error;
pub mod model;
pub mod parser;
pub mod store;
pub mod tracing;

pub use cli::CliArgs;
pub use committer::{
    BatchCommitter, ImportReport, import_text, read_puzzle_file, run_import, write_summary,
};
pub use config::ImportConfig;
pub use error::ImportError;
pub use model::{ImportSummary, PuzzleRecord};
pub use parser::{LineOutcome, ParsedLine, parse_puzzles};
pub use self::tracing::init_tracing;
pub use store::{
    CloudIOError, CloudResult, Document, DocumentStore, ErrorKind, FakeDocumentStore, FieldValue,
    Fields, MAX_BATCH_WRITES, WriteBatch,
};
#[cfg(feature = "firestore")]
pub use store::{FirestoreOptions, FirestoreStore, ServiceAccountKey};
