//! Core store traits and value types.
//!
//! The store interface is synchronous: each call blocks until the backend has
//! acknowledged (or rejected) the write. Backends that talk to a remote service
//! are expected to bound that wait with their own timeout.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::fmt;

/// Maximum number of writes a single atomic batch may carry.
pub const MAX_BATCH_WRITES: usize = 500;

// ============================================================================
// Core Error Type
// ============================================================================

/// Generic error type for store operations
#[derive(Debug, Clone)]
pub struct CloudIOError {
    pub message: String,
    pub kind: ErrorKind,
    pub source: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Authentication,
    Authorization,
    NotFound,
    InvalidInput,
    Network,
    Timeout,
    ServiceUnavailable,
    RateLimited,
    InternalError,
    Other,
}

impl fmt::Display for CloudIOError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)?;
        if let Some(source) = &self.source {
            write!(f, " ({source})")?;
        }
        Ok(())
    }
}

impl Error for CloudIOError {}

impl CloudIOError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
            source: None,
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

pub type CloudResult<T> = Result<T, CloudIOError>;

// ============================================================================
// Credentials
// ============================================================================

/// Trait for store credentials
pub trait CloudCredentials: Send + Sync {
    /// Returns a unique identifier for this credential (e.g., service account email)
    fn identifier(&self) -> &str;

    /// Returns the credential type (e.g., `"service_account"`)
    fn credential_type(&self) -> &str;

    /// Validates the credentials (returns Ok if valid)
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are incomplete or malformed
    fn validate(&self) -> CloudResult<()>;

    /// Returns any additional metadata about the credentials
    fn metadata(&self) -> HashMap<String, String> {
        HashMap::new()
    }
}

// ============================================================================
// Field Values
// ============================================================================

/// A single typed field of a stored document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Integer(i64),
    String(String),
    Array(Vec<FieldValue>),
    Timestamp(DateTime<Utc>),
    /// Placeholder replaced by the store's own clock when the write is applied.
    ServerTimestamp,
}

impl FieldValue {
    /// Plain JSON view of the value, used to decode documents with serde.
    ///
    /// Timestamps become RFC 3339 strings; an unresolved server timestamp is `null`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Integer(v) => serde_json::Value::from(*v),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Array(values) => {
                serde_json::Value::Array(values.iter().map(Self::to_json).collect())
            }
            Self::Timestamp(ts) => {
                serde_json::Value::String(ts.to_rfc3339_opts(SecondsFormat::Secs, true))
            }
            Self::ServerTimestamp => serde_json::Value::Null,
        }
    }

    /// Replace every server timestamp sentinel (at any depth) with `now`.
    #[must_use]
    pub fn resolve(self, now: DateTime<Utc>) -> Self {
        match self {
            Self::ServerTimestamp => Self::Timestamp(now),
            Self::Array(values) => {
                Self::Array(values.into_iter().map(|v| v.resolve(now)).collect())
            }
            other => other,
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

/// Field map of a document. Ordered so that encodings are deterministic.
pub type Fields = BTreeMap<String, FieldValue>;

// ============================================================================
// Documents and Batches
// ============================================================================

/// A stored document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    /// Decode the document's fields into `T`. Fields `T` does not name are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the fields do not match the shape of `T`
    pub fn decode<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        let object: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        serde_json::from_value(serde_json::Value::Object(object))
    }
}

/// One `set` inside a batch: replaces the whole document at `collection/id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOp {
    pub collection: String,
    pub id: String,
    pub fields: Fields,
}

/// An ordered group of writes that a store applies all-or-nothing.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    writes: Vec<WriteOp>,
}

impl WriteBatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a full-document write.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` once the batch already holds [`MAX_BATCH_WRITES`] writes
    pub fn set(
        &mut self,
        collection: impl Into<String>,
        id: impl Into<String>,
        fields: Fields,
    ) -> CloudResult<()> {
        if self.writes.len() >= MAX_BATCH_WRITES {
            return Err(CloudIOError::new(
                ErrorKind::InvalidInput,
                format!("batch already holds {MAX_BATCH_WRITES} writes"),
            ));
        }
        self.writes.push(WriteOp {
            collection: collection.into(),
            id: id.into(),
            fields,
        });
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    #[must_use]
    pub fn writes(&self) -> &[WriteOp] {
        &self.writes
    }

    #[must_use]
    pub fn into_writes(self) -> Vec<WriteOp> {
        self.writes
    }
}

// ============================================================================
// DocumentStore
// ============================================================================

/// Trait for document store write operations
pub trait DocumentStore: Send + Sync {
    /// Start an empty batch
    fn new_batch(&self) -> WriteBatch {
        WriteBatch::new()
    }

    /// Apply every write in `batch` atomically
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the batch; in that case none of its writes are applied
    fn commit(&self, batch: WriteBatch) -> CloudResult<()>;

    /// Replace a single document
    ///
    /// # Errors
    ///
    /// Returns an error if permissions are not enough or the write fails
    fn set_document(&self, collection: &str, id: &str, fields: Fields) -> CloudResult<()>;

    /// Get a document
    ///
    /// # Errors
    ///
    /// Returns an error if permissions are not enough or the read fails
    fn get(&self, collection: &str, id: &str) -> CloudResult<Option<Document>>;
}
