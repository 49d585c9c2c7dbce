//! Import error taxonomy.
//!
//! Lines with too few words are not errors: the parser reports them as skipped
//! and the import carries on. Everything here stops the run.

use crate::store::{CloudIOError, ErrorKind};
use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};

const CREDENTIALS_HINT: &str = "To get a service account key:\n\
    1. Go to Firebase Console > Project Settings > Service Accounts\n\
    2. Click \"Generate new private key\"\n\
    3. Save the file at the path above, or pass --credentials <path>";

const PUZZLES_HINT: &str =
    "Place the puzzle file at the path above, or pass --input <path>";

#[derive(Debug)]
pub enum ImportError {
    /// A required file is absent. Raised before any store interaction.
    MissingInput {
        what: &'static str,
        path: PathBuf,
        hint: &'static str,
    },
    ReadInput {
        path: PathBuf,
        source: std::io::Error,
    },
    InvalidCredentials {
        path: PathBuf,
        source: CloudIOError,
    },
    InvalidConfig(String),
    /// The store client could not be set up.
    Store(CloudIOError),
    /// Window `window` (0-based) was rejected. Earlier windows stay committed.
    CommitFailure {
        window: usize,
        first_line: usize,
        last_line: usize,
        source: CloudIOError,
    },
    /// Every window committed but the summary record was rejected.
    SummaryFailure { source: CloudIOError },
}

impl ImportError {
    #[must_use]
    pub fn missing_credentials(path: &Path) -> Self {
        Self::MissingInput {
            what: "service account key",
            path: path.to_path_buf(),
            hint: CREDENTIALS_HINT,
        }
    }

    #[must_use]
    pub fn missing_puzzles(path: &Path) -> Self {
        Self::MissingInput {
            what: "puzzle file",
            path: path.to_path_buf(),
            hint: PUZZLES_HINT,
        }
    }

    /// The store error behind this failure, if any.
    #[must_use]
    pub fn store_error(&self) -> Option<&CloudIOError> {
        match self {
            Self::InvalidCredentials { source, .. }
            | Self::Store(source)
            | Self::CommitFailure { source, .. }
            | Self::SummaryFailure { source } => Some(source),
            _ => None,
        }
    }

    /// Whether the store gave up waiting for an acknowledgement.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        self.store_error()
            .is_some_and(|e| e.kind == ErrorKind::Timeout)
    }
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingInput { what, path, hint } => {
                write!(f, "{what} not found at {}\n\n{hint}", path.display())
            }
            Self::ReadInput { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            Self::InvalidCredentials { path, source } => {
                write!(f, "invalid credentials in {}: {source}", path.display())
            }
            Self::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
            Self::Store(source) => write!(f, "failed to set up store: {source}"),
            Self::CommitFailure {
                window,
                first_line,
                last_line,
                source,
            } => write!(
                f,
                "commit of window {window} (puzzles {first_line} to {last_line}) failed: {source}"
            ),
            Self::SummaryFailure { source } => {
                write!(f, "failed to write import summary: {source}")
            }
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ReadInput { source, .. } => Some(source),
            Self::InvalidCredentials { source, .. }
            | Self::Store(source)
            | Self::CommitFailure { source, .. }
            | Self::SummaryFailure { source } => Some(source),
            Self::MissingInput { .. } | Self::InvalidConfig(_) => None,
        }
    }
}
