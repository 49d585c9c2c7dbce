//! Fake store implementation for testing.
//!
//! State lives in memory behind `Arc<Mutex<..>>`, so clones share the same
//! collections. Failures can be injected per commit to exercise partial imports.

use crate::store::traits::{
    CloudIOError, CloudResult, Document, DocumentStore, ErrorKind, Fields, WriteBatch,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

type CollectionStorage = Arc<Mutex<HashMap<String, HashMap<String, Document>>>>;
type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Ids written by one successful [`DocumentStore::commit`], in batch order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub ids: Vec<String>,
}

#[derive(Debug, Default)]
struct Faults {
    commit_at: Option<(usize, ErrorKind)>,
    set_document: Option<ErrorKind>,
}

#[derive(Clone)]
pub struct FakeDocumentStore {
    collections: CollectionStorage,
    commits: Arc<Mutex<Vec<CommitRecord>>>,
    attempts: Arc<Mutex<usize>>,
    faults: Arc<Mutex<Faults>>,
    clock: Clock,
}

impl FakeDocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            collections: Arc::new(Mutex::new(HashMap::new())),
            commits: Arc::new(Mutex::new(Vec::new())),
            attempts: Arc::new(Mutex::new(0)),
            faults: Arc::new(Mutex::new(Faults::default())),
            clock: Arc::new(Utc::now),
        }
    }

    /// Resolve server timestamps to a fixed instant instead of the wall clock.
    #[must_use]
    pub fn with_fixed_time(mut self, now: DateTime<Utc>) -> Self {
        self.clock = Arc::new(move || now);
        self
    }

    /// Make the `n`th commit attempt (0-based) fail with `kind`.
    ///
    /// # Panics
    ///
    /// Panics if the faults mutex is poisoned.
    pub fn fail_commit_at(&self, n: usize, kind: ErrorKind) {
        self.faults.lock().expect("faults mutex poisoned").commit_at = Some((n, kind));
    }

    /// Make every `set_document` call fail with `kind`.
    ///
    /// # Panics
    ///
    /// Panics if the faults mutex is poisoned.
    pub fn fail_set_document(&self, kind: ErrorKind) {
        self.faults.lock().expect("faults mutex poisoned").set_document = Some(kind);
    }

    /// Remove all injected faults.
    ///
    /// # Panics
    ///
    /// Panics if the faults mutex is poisoned.
    pub fn clear_faults(&self) {
        *self.faults.lock().expect("faults mutex poisoned") = Faults::default();
    }

    /// Successful commits, in the order they were applied.
    ///
    /// # Panics
    ///
    /// Panics if the commits mutex is poisoned.
    #[must_use]
    pub fn commits(&self) -> Vec<CommitRecord> {
        self.commits.lock().expect("commits mutex poisoned").clone()
    }

    /// Number of commit calls, including failed ones.
    ///
    /// # Panics
    ///
    /// Panics if the attempts mutex is poisoned.
    #[must_use]
    pub fn commit_attempts(&self) -> usize {
        *self.attempts.lock().expect("attempts mutex poisoned")
    }

    /// Number of documents stored in `collection`.
    ///
    /// # Panics
    ///
    /// Panics if the collections mutex is poisoned.
    #[must_use]
    pub fn document_count(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .expect("collections mutex poisoned")
            .get(collection)
            .map_or(0, HashMap::len)
    }

    fn resolve(&self, fields: Fields, now: DateTime<Utc>) -> Fields {
        fields
            .into_iter()
            .map(|(k, v)| (k, v.resolve(now)))
            .collect()
    }
}

impl Default for FakeDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for FakeDocumentStore {
    fn commit(&self, batch: WriteBatch) -> CloudResult<()> {
        let attempt = {
            let mut attempts = self.attempts.lock().expect("attempts mutex poisoned");
            let current = *attempts;
            *attempts += 1;
            current
        };

        let injected = self.faults.lock().expect("faults mutex poisoned").commit_at;
        if let Some((n, kind)) = injected
            && n == attempt
        {
            return Err(CloudIOError::new(
                kind,
                format!("injected failure on commit {attempt}"),
            ));
        }

        let now = (self.clock)();
        let writes = batch.into_writes();
        let ids = writes.iter().map(|w| w.id.clone()).collect();

        // Apply under one lock so readers never observe half a batch.
        let mut collections = self.collections.lock().expect("collections mutex poisoned");
        for write in writes {
            let fields = self.resolve(write.fields, now);
            collections.entry(write.collection).or_default().insert(
                write.id.clone(),
                Document {
                    id: write.id,
                    fields,
                },
            );
        }
        drop(collections);

        self.commits
            .lock()
            .expect("commits mutex poisoned")
            .push(CommitRecord { ids });
        Ok(())
    }

    fn set_document(&self, collection: &str, id: &str, fields: Fields) -> CloudResult<()> {
        if let Some(kind) = self.faults.lock().expect("faults mutex poisoned").set_document {
            return Err(CloudIOError::new(
                kind,
                format!("injected failure writing {collection}/{id}"),
            ));
        }

        let fields = self.resolve(fields, (self.clock)());
        self.collections
            .lock()
            .expect("collections mutex poisoned")
            .entry(collection.to_string())
            .or_default()
            .insert(
                id.to_string(),
                Document {
                    id: id.to_string(),
                    fields,
                },
            );
        Ok(())
    }

    fn get(&self, collection: &str, id: &str) -> CloudResult<Option<Document>> {
        let collections = self.collections.lock().expect("collections mutex poisoned");
        Ok(collections.get(collection).and_then(|c| c.get(id)).cloned())
    }
}
