//! Port for the remote document database used in remote mode.
//!
//! A [`DocumentStore`] holds one document collection per
//! [`CollectionName`]. Documents carry a store-assigned identifier, a
//! monotonically increasing revision and a JSON field map. Live queries are
//! exposed as streams of whole, ordered snapshots.

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde_json::{Map, Value};

use crate::domain::{CollectionName, CollectionOrdering, EntityId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by document store adapters.
    pub enum DocumentStoreError {
        /// The store could not be reached.
        Connection { message: String } => "document store unreachable: {message}",
        /// The store did not answer in time.
        Timeout { message: String } => "document store timed out: {message}",
        /// The addressed document does not exist.
        NotFound { collection: String, id: String } => "document {collection}/{id} not found",
        /// A conditional write saw a newer revision.
        RevisionMismatch { expected: u64, current: String } =>
            "revision mismatch: expected {expected}, current {current}",
        /// The store refused the request.
        Rejected { message: String } => "document store rejected the request: {message}",
        /// A response could not be decoded.
        Decode { message: String } => "document store response was malformed: {message}",
    }
}

/// JSON fields of a document, without its identifier.
pub type DocumentFields = Map<String, Value>;

/// Stream of ordered snapshots of one collection.
pub type SnapshotStream = BoxStream<'static, Result<Vec<Document>, DocumentStoreError>>;

/// One stored document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: EntityId,
    /// Starts at 1 and increases with every successful write.
    pub revision: u64,
    pub fields: DocumentFields,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a document and return it with its assigned id and revision.
    async fn add(
        &self,
        collection: CollectionName,
        fields: DocumentFields,
    ) -> Result<Document, DocumentStoreError>;

    /// Point read of one document.
    async fn get(
        &self,
        collection: CollectionName,
        id: &EntityId,
    ) -> Result<Option<Document>, DocumentStoreError>;

    /// Merge `fields` into a document.
    ///
    /// With `expected_revision` set, the write only happens when the stored
    /// revision still matches, otherwise
    /// [`DocumentStoreError::RevisionMismatch`] is returned.
    async fn update(
        &self,
        collection: CollectionName,
        id: &EntityId,
        fields: DocumentFields,
        expected_revision: Option<u64>,
    ) -> Result<Document, DocumentStoreError>;

    /// Delete a document.
    async fn delete(
        &self,
        collection: CollectionName,
        id: &EntityId,
    ) -> Result<(), DocumentStoreError>;

    /// Live query over a collection.
    ///
    /// The stream yields the full ordered collection once immediately and
    /// again after every change. Dropping the stream releases the query.
    async fn subscribe(
        &self,
        collection: CollectionName,
        ordering: CollectionOrdering,
    ) -> Result<SnapshotStream, DocumentStoreError>;
}
