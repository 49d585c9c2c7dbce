//! Document store abstraction.
//!
//! The importer talks to its store only through [`DocumentStore`]: build a
//! [`WriteBatch`], commit it atomically, and set single documents. Values that the
//! store should stamp with its own clock are marked [`FieldValue::ServerTimestamp`]
//! and resolved by the backend at write time.
//!
//! ## Backends
//!
//! - [`FakeDocumentStore`] - in-memory, with commit history and failure injection, for tests
//! - [`FirestoreStore`] - Firestore REST API (feature `firestore`)
//!
//! ## Error Handling
//!
//! All operations return [`CloudResult<T>`] where the error is [`CloudIOError`],
//! categorized by [`ErrorKind`]. A backend that gives up waiting on the service
//! reports `ErrorKind::Timeout`.

#[cfg_attr(docsrs, doc(cfg(feature = "firestore")))]
#[cfg(feature = "firestore")]
pub mod credentials;
pub mod fake;
#[cfg_attr(docsrs, doc(cfg(feature = "firestore")))]
#[cfg(feature = "firestore")]
pub mod firestore;
pub mod traits;

#[cfg(feature = "firestore")]
pub use credentials::ServiceAccountKey;
pub use fake::*;
#[cfg(feature = "firestore")]
pub use firestore::{FirestoreOptions, FirestoreStore};
pub use traits::*;
