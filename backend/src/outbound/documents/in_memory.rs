//! In-process document store emulator.
//!
//! Behaves like the remote service as far as the domain can observe:
//! store-assigned ids, per-document revisions, conditional writes and live
//! ordered snapshots. Used for demos, offline runs of remote mode and
//! behaviour tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use serde_json::Value;
use tokio::sync::watch;
use tracing::debug;

use crate::domain::ports::{
    Document, DocumentFields, DocumentStore, DocumentStoreError, SnapshotStream,
};
use crate::domain::{CollectionName, CollectionOrdering, EntityId, SortDirection};

type Documents = Arc<BTreeMap<EntityId, Document>>;

/// Document store held entirely in memory.
#[derive(Debug)]
pub struct InMemoryDocumentStore {
    collections: BTreeMap<CollectionName, watch::Sender<Documents>>,
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        let collections = CollectionName::all()
            .map(|collection| (collection, watch::Sender::new(Documents::default())))
            .collect();
        Self { collections }
    }

    /// Number of documents currently held in `collection`.
    pub fn len(&self, collection: CollectionName) -> usize {
        self.channel(collection)
            .map_or(0, |sender| sender.borrow().len())
    }

    fn channel(
        &self,
        collection: CollectionName,
    ) -> Result<&watch::Sender<Documents>, DocumentStoreError> {
        self.collections.get(&collection).ok_or_else(|| {
            DocumentStoreError::rejected(format!("unknown collection {collection}"))
        })
    }
}

/// `collection` sorted by its ordering field.
///
/// Timestamp fields compare chronologically; anything else falls back to
/// comparing the raw JSON text. Ties keep id order.
fn ordered(documents: &BTreeMap<EntityId, Document>, ordering: CollectionOrdering) -> Vec<Document> {
    let mut sorted: Vec<Document> = documents.values().cloned().collect();
    sorted.sort_by(|a, b| {
        let by_field = sort_key(a, ordering.field).cmp(&sort_key(b, ordering.field));
        match ordering.direction {
            SortDirection::Ascending => by_field,
            SortDirection::Descending => by_field.reverse(),
        }
    });
    sorted
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum SortKey {
    Missing,
    Time(DateTime<Utc>),
    Raw(String),
}

fn sort_key(document: &Document, field: &str) -> SortKey {
    match document.fields.get(field) {
        None | Some(Value::Null) => SortKey::Missing,
        Some(Value::String(text)) => DateTime::parse_from_rfc3339(text).map_or_else(
            |_| SortKey::Raw(text.clone()),
            |time| SortKey::Time(time.with_timezone(&Utc)),
        ),
        Some(other) => SortKey::Raw(other.to_string()),
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn add(
        &self,
        collection: CollectionName,
        fields: DocumentFields,
    ) -> Result<Document, DocumentStoreError> {
        let document = Document {
            id: EntityId::random(),
            revision: 1,
            fields,
        };
        let stored = document.clone();
        self.channel(collection)?.send_modify(|documents| {
            Arc::make_mut(documents).insert(stored.id.clone(), stored);
        });
        debug!(%collection, id = %document.id, "document added");
        Ok(document)
    }

    async fn get(
        &self,
        collection: CollectionName,
        id: &EntityId,
    ) -> Result<Option<Document>, DocumentStoreError> {
        Ok(self.channel(collection)?.borrow().get(id).cloned())
    }

    async fn update(
        &self,
        collection: CollectionName,
        id: &EntityId,
        fields: DocumentFields,
        expected_revision: Option<u64>,
    ) -> Result<Document, DocumentStoreError> {
        let mut outcome = Err(DocumentStoreError::not_found(
            collection.as_str(),
            id.as_ref(),
        ));
        self.channel(collection)?.send_if_modified(|documents| {
            let Some(current) = documents.get(id) else {
                return false;
            };
            if let Some(expected) = expected_revision
                && expected != current.revision
            {
                outcome = Err(DocumentStoreError::revision_mismatch(
                    expected,
                    current.revision.to_string(),
                ));
                return false;
            }
            let mut next = current.clone();
            next.fields.extend(fields);
            next.revision += 1;
            outcome = Ok(next.clone());
            Arc::make_mut(documents).insert(id.clone(), next);
            true
        });
        if let Ok(document) = &outcome {
            debug!(%collection, %id, revision = document.revision, "document updated");
        }
        outcome
    }

    async fn delete(
        &self,
        collection: CollectionName,
        id: &EntityId,
    ) -> Result<(), DocumentStoreError> {
        let removed = self
            .channel(collection)?
            .send_if_modified(|documents| Arc::make_mut(documents).remove(id).is_some());
        if removed {
            debug!(%collection, %id, "document deleted");
            Ok(())
        } else {
            Err(DocumentStoreError::not_found(collection.as_str(), id.as_ref()))
        }
    }

    async fn subscribe(
        &self,
        collection: CollectionName,
        ordering: CollectionOrdering,
    ) -> Result<SnapshotStream, DocumentStoreError> {
        let receiver = self.channel(collection)?.subscribe();
        let snapshots = stream::unfold((receiver, true), move |(mut receiver, first)| async move {
            if !first && receiver.changed().await.is_err() {
                return None;
            }
            let snapshot = ordered(&receiver.borrow_and_update(), ordering);
            Some((Ok(snapshot), (receiver, false)))
        });
        Ok(snapshots.boxed())
    }
}
