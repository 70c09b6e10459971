//! Document storage: the contract the handler factory consumes
//!
//! This module defines the [`DocumentStore`] trait using RPITIT (Return
//! Position Impl Trait In Traits), available since Rust 1.75, plus the typed
//! query descriptor it executes ([`query`]) and the in-memory implementation
//! ([`memory`]).
//!
//! # Contract
//!
//! - `find` executes a staged [`ListQuery`](query::ListQuery) against a
//!   collection and returns the shaped documents.
//! - `find_by_id` reports an absent document as `Ok(None)`, never as an
//!   error.
//! - `insert` assigns the identifier, creation timestamp, and revision
//!   fields and returns the stored document.
//! - `update` applies a partial patch atomically: the merged document is
//!   validated before it is committed, and the post-update document is
//!   returned (`Ok(None)` when the identifier does not exist).
//! - `delete` returns whether a document was actually removed.
//!
//! Validation failures surface as a distinguishable
//! [`StoreError`](error::StoreError) kind; everything else is infrastructure.

pub mod error;
pub mod memory;
pub mod query;

use std::future::Future;

pub use error::{StoreError, StoreErrorKind};
pub use memory::MemoryStore;
pub use query::{
    FilterCondition, FilterOperator, FilterValue, ListQuery, Pagination, Projection, SortKey,
    SortOrder,
};

/// A stored entity: a JSON object of named attributes
pub type Document = serde_json::Map<String, serde_json::Value>;

/// The unique identifier field every document carries
pub const ID_FIELD: &str = "id";

/// The server-assigned creation timestamp field (RFC 3339, UTC)
pub const CREATED_AT_FIELD: &str = "createdAt";

/// The internal revision counter, bumped on every update
///
/// Excluded from responses by the default projection.
pub const REVISION_FIELD: &str = "_rev";

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Storage collaborator contract for document collections
///
/// Generic over nothing but the collection name: documents are opaque JSON
/// objects, and all field-level validation is supplied by the caller at the
/// single point that needs it (`update`).
pub trait DocumentStore: Send + Sync {
    /// Execute a list query against a collection
    fn find(
        &self,
        collection: &str,
        query: &ListQuery,
    ) -> impl Future<Output = StoreResult<Vec<Document>>> + Send;

    /// Fetch a single document by identifier
    ///
    /// Returns `Ok(None)` when no document matches.
    fn find_by_id(
        &self,
        collection: &str,
        id: &str,
    ) -> impl Future<Output = StoreResult<Option<Document>>> + Send;

    /// Persist a new document, returning it with server-assigned fields
    fn insert(
        &self,
        collection: &str,
        doc: Document,
    ) -> impl Future<Output = StoreResult<Document>> + Send;

    /// Apply a partial patch to a document by identifier
    ///
    /// The `validate` hook runs against the merged document before commit;
    /// an `Err` from it aborts the update and surfaces as a validation
    /// [`StoreError`]. Returns `Ok(None)` when the identifier does not
    /// exist.
    fn update<F>(
        &self,
        collection: &str,
        id: &str,
        patch: Document,
        validate: F,
    ) -> impl Future<Output = StoreResult<Option<Document>>> + Send
    where
        F: FnOnce(&Document) -> StoreResult<()> + Send;

    /// Remove a document by identifier
    ///
    /// Returns whether a document was removed.
    fn delete(
        &self,
        collection: &str,
        id: &str,
    ) -> impl Future<Output = StoreResult<bool>> + Send;
}
