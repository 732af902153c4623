//! Remote-mode backend over a [`DocumentStore`].
//!
//! Attaching opens one live query per collection. Every snapshot replaces
//! the collection in the [`EntityStore`] wholesale; writes go to the
//! document store only and reach the entity store through the next
//! snapshot.
//!
//! Updates are read-modify-write cycles. Under
//! [`WriteConsistency::LastWriteWins`] two concurrent cycles on the same
//! document can both read the old value, and the later write then drops the
//! earlier one's change. [`WriteConsistency::CompareAndSwap`] makes each
//! write conditional on the revision that was read and retries the cycle on
//! a mismatch.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::entity_store::not_found;
use super::ports::{
    AttachReport, Document, DocumentFields, DocumentStore, DocumentStoreError, EntityBackend,
    Transition,
};
use super::{CollectionName, Entity, EntityId, EntityStore, Error, StoreMode};

/// Default attempt budget for compare-and-swap updates.
pub const DEFAULT_CAS_ATTEMPTS: u32 = 5;

/// How remote read-modify-write cycles guard against concurrent writers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "mode")]
pub enum WriteConsistency {
    /// Unconditional writes; concurrent updates may be lost.
    #[default]
    LastWriteWins,
    /// Conditional writes, retried up to `max_attempts` cycles in total.
    CompareAndSwap { max_attempts: u32 },
}

impl WriteConsistency {
    /// Parse the configuration value (`last-write-wins` or `compare-and-swap`).
    pub fn from_setting(value: &str, max_attempts: u32) -> Result<Self, Error> {
        match value.trim().to_lowercase().as_str() {
            "last-write-wins" | "lww" => Ok(Self::LastWriteWins),
            "compare-and-swap" | "cas" => Ok(Self::CompareAndSwap {
                max_attempts: max_attempts.max(1),
            }),
            other => Err(Error::configuration(format!(
                "unknown write consistency: {other}"
            ))),
        }
    }

    const fn max_attempts(self) -> u32 {
        match self {
            Self::LastWriteWins => 1,
            Self::CompareAndSwap { max_attempts } => max_attempts,
        }
    }
}

/// Live subscription tasks of one session.
///
/// Cancelling aborts every task, which drops the underlying streams.
/// Dropping the set cancels it too.
#[derive(Debug, Default)]
pub struct SubscriptionSet {
    tasks: Vec<(CollectionName, JoinHandle<()>)>,
}

impl SubscriptionSet {
    pub fn push(&mut self, collection: CollectionName, task: JoinHandle<()>) {
        self.tasks.push((collection, task));
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Abort every task. Returns how many were running.
    pub fn cancel_all(&mut self) -> usize {
        let count = self.tasks.len();
        for (collection, task) in self.tasks.drain(..) {
            task.abort();
            debug!(%collection, "subscription cancelled");
        }
        count
    }
}

impl Drop for SubscriptionSet {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

/// Remote-mode [`EntityBackend`].
pub struct RemoteEntityBackend<D> {
    store: Arc<EntityStore>,
    documents: Arc<D>,
    consistency: WriteConsistency,
    subscriptions: Mutex<SubscriptionSet>,
}

impl<D> RemoteEntityBackend<D>
where
    D: DocumentStore + 'static,
{
    pub fn new(store: Arc<EntityStore>, documents: Arc<D>, consistency: WriteConsistency) -> Self {
        Self {
            store,
            documents,
            consistency,
            subscriptions: Mutex::new(SubscriptionSet::default()),
        }
    }

    pub fn consistency(&self) -> WriteConsistency {
        self.consistency
    }

    fn subscriptions(&self) -> MutexGuard<'_, SubscriptionSet> {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    async fn read(&self, collection: CollectionName, id: &EntityId) -> Result<Document, Error> {
        self.documents
            .get(collection, id)
            .await
            .map_err(|err| map_document_error(err, collection))?
            .ok_or_else(|| not_found(collection, id))
    }
}

/// Decode snapshot documents, dropping those that do not fit the collection.
fn decode_snapshot(collection: CollectionName, documents: Vec<Document>) -> Vec<Entity> {
    documents
        .into_iter()
        .filter_map(|document| match decode_document(collection, document) {
            Ok(entity) => Some(entity),
            Err(err) => {
                warn!(%collection, error = %err, "dropping undecodable document");
                None
            }
        })
        .collect()
}

fn decode_document(collection: CollectionName, document: Document) -> Result<Entity, Error> {
    Entity::from_fields(collection, &document.id, document.fields).map_err(|err| {
        Error::parse(format!(
            "document {collection}/{} does not match its collection: {err}",
            document.id
        ))
    })
}

fn apply_snapshot(store: &EntityStore, collection: CollectionName, documents: Vec<Document>) {
    let received = documents.len();
    let entities = decode_snapshot(collection, documents);
    let admitted = entities.len();
    match store.replace_all(collection, entities) {
        Ok(()) => debug!(%collection, received, admitted, "applied snapshot"),
        Err(err) => warn!(%collection, error = %err, "rejected snapshot"),
    }
}

/// Fields of `next` whose serialised value differs from `current`.
fn changed_fields(current: &Entity, next: &Entity) -> Result<DocumentFields, Error> {
    let before = current.to_fields()?;
    let after = next.to_fields()?;
    let mut changed: DocumentFields = after
        .iter()
        .filter(|(key, value)| before.get(*key) != Some(value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    for key in before.keys().filter(|key| !after.contains_key(*key)) {
        changed.insert(key.clone(), serde_json::Value::Null);
    }
    Ok(changed)
}

fn map_document_error(error: DocumentStoreError, collection: CollectionName) -> Error {
    let details = serde_json::json!({ "collection": collection });
    match error {
        DocumentStoreError::Connection { .. } | DocumentStoreError::Timeout { .. } => {
            Error::service_unavailable(error.to_string()).with_details(details)
        }
        DocumentStoreError::NotFound { .. } => Error::not_found(error.to_string()).with_details(details),
        DocumentStoreError::RevisionMismatch { .. } => {
            Error::conflict(error.to_string()).with_details(details)
        }
        DocumentStoreError::Rejected { .. } => {
            Error::invalid_request(error.to_string()).with_details(details)
        }
        DocumentStoreError::Decode { .. } => Error::parse(error.to_string()).with_details(details),
    }
}

#[async_trait]
impl<D> EntityBackend for RemoteEntityBackend<D>
where
    D: DocumentStore + 'static,
{
    fn mode(&self) -> StoreMode {
        StoreMode::Remote
    }

    async fn attach(&self) -> Result<AttachReport, Error> {
        if !self.subscriptions().is_empty() {
            return Err(Error::conflict("remote backend is already attached"));
        }
        let mut report = AttachReport::default();
        for collection in CollectionName::all() {
            let stream = match self.documents.subscribe(collection, collection.ordering()).await {
                Ok(stream) => stream,
                Err(err) => {
                    warn!(%collection, error = %err, "subscription failed");
                    report
                        .load_failures
                        .push((collection, map_document_error(err, collection)));
                    continue;
                }
            };
            let store = Arc::clone(&self.store);
            let task = tokio::spawn(async move {
                let mut stream = stream;
                while let Some(item) = stream.next().await {
                    match item {
                        Ok(documents) => apply_snapshot(&store, collection, documents),
                        Err(err) => warn!(%collection, error = %err, "snapshot stream error"),
                    }
                }
                debug!(%collection, "snapshot stream ended");
            });
            self.subscriptions().push(collection, task);
            report.subscriptions += 1;
        }
        info!(
            subscriptions = report.subscriptions,
            failures = report.load_failures.len(),
            "remote backend attached"
        );
        Ok(report)
    }

    async fn detach(&self) {
        let cancelled = self.subscriptions().cancel_all();
        info!(cancelled, "remote backend detached");
    }

    async fn fetch(&self, collection: CollectionName, id: &EntityId) -> Result<Entity, Error> {
        let document = self.read(collection, id).await?;
        decode_document(collection, document)
    }

    async fn create(&self, entity: Entity) -> Result<Entity, Error> {
        let collection = entity.collection();
        let fields = entity.to_fields()?;
        let document = self
            .documents
            .add(collection, fields)
            .await
            .map_err(|err| map_document_error(err, collection))?;
        debug!(%collection, id = %document.id, "created document");
        decode_document(collection, document)
    }

    async fn update(
        &self,
        collection: CollectionName,
        id: &EntityId,
        transition: &Transition,
    ) -> Result<Entity, Error> {
        let max_attempts = self.consistency.max_attempts();
        let mut attempt = 0;
        loop {
            attempt += 1;
            let document = self.read(collection, id).await?;
            let revision = document.revision;
            let current = decode_document(collection, document)?;
            let mut next = current.clone();
            transition(&mut next)?;

            let changed = changed_fields(&current, &next)?;
            if changed.is_empty() {
                return Ok(next);
            }
            let expected = match self.consistency {
                WriteConsistency::LastWriteWins => None,
                WriteConsistency::CompareAndSwap { .. } => Some(revision),
            };
            match self.documents.update(collection, id, changed, expected).await {
                Ok(stored) => return decode_document(collection, stored),
                Err(DocumentStoreError::RevisionMismatch { expected, current })
                    if attempt < max_attempts =>
                {
                    debug!(%collection, %id, attempt, expected, %current, "revision moved, retrying");
                }
                Err(err) => {
                    if let DocumentStoreError::RevisionMismatch { .. } = err {
                        warn!(%collection, %id, attempt, "giving up after repeated conflicts");
                    }
                    return Err(map_document_error(err, collection));
                }
            }
        }
    }

    async fn delete(&self, collection: CollectionName, id: &EntityId) -> Result<(), Error> {
        self.documents
            .delete(collection, id)
            .await
            .map_err(|err| map_document_error(err, collection))
    }
}

#[cfg(test)]
mod tests;
