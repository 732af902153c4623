//! Local-mode backend: the entity store is the record of truth and every
//! change is written through to a [`KeyValueStore`].
//!
//! Each collection is persisted as one JSON array under its storage key.
//! Writes are serialised by a mutex that covers both the in-memory change
//! and the persistence call, so the persisted array always matches a state
//! the store has shown. When persisting fails the in-memory change is rolled
//! back before the error is returned.
//!
//! A corrupt payload is copied aside before the collection starts empty. If
//! that copy cannot be written the collection stays read-only for the rest
//! of the session, so no save can replace the only copy of the data.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::entity_store::not_found;
use super::ports::{AttachReport, EntityBackend, KeyValueStore, KeyValueStoreError, Transition};
use super::{CollectionName, Entity, EntityId, EntityStore, Error, StoreMode};

/// Suffix of the key a corrupt payload is copied to.
pub const QUARANTINE_SUFFIX: &str = ".corrupt";

/// Local-mode [`EntityBackend`].
pub struct LocalEntityBackend<K> {
    store: Arc<EntityStore>,
    kv: Arc<K>,
    /// Serialises writes; holds the collections that refuse them.
    read_only: Mutex<BTreeSet<CollectionName>>,
}

impl<K> LocalEntityBackend<K>
where
    K: KeyValueStore,
{
    pub fn new(store: Arc<EntityStore>, kv: Arc<K>) -> Self {
        Self {
            store,
            kv,
            read_only: Mutex::new(BTreeSet::new()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeSet<CollectionName>>, Error> {
        self.read_only
            .lock()
            .map_err(|_| Error::internal("local write lock poisoned"))
    }

    /// Decode the persisted array of `collection`, quarantining it on failure.
    fn load(&self, collection: CollectionName) -> Result<Vec<Entity>, LoadFailure> {
        let key = collection.storage_key();
        let Some(raw) = self
            .kv
            .get(key)
            .map_err(|err| LoadFailure::unreadable(map_kv_error(err)))?
        else {
            debug!(%collection, key, "no persisted data");
            return Ok(Vec::new());
        };
        decode_collection(collection, &raw)
            .map_err(|reason| self.quarantine(collection, &raw, &reason))
    }

    fn quarantine(&self, collection: CollectionName, raw: &str, reason: &str) -> LoadFailure {
        let key = collection.storage_key();
        let quarantine_key = format!("{key}{QUARANTINE_SUFFIX}");
        let error = Error::parse(format!("stored {collection} data is corrupt: {reason}"));
        match self.kv.set(&quarantine_key, raw) {
            Ok(()) => {
                warn!(
                    %collection,
                    key,
                    quarantine_key = %quarantine_key,
                    reason,
                    "quarantined corrupt data"
                );
                LoadFailure {
                    error: error.with_details(serde_json::json!({
                        "collection": collection,
                        "key": key,
                        "quarantineKey": quarantine_key,
                    })),
                    read_only: false,
                }
            }
            Err(err) => {
                warn!(%collection, key, error = %err, "failed to quarantine corrupt data");
                LoadFailure {
                    error: error.with_details(serde_json::json!({
                        "collection": collection,
                        "key": key,
                        "readOnly": true,
                        "quarantineError": err.to_string(),
                    })),
                    read_only: true,
                }
            }
        }
    }

    fn persist(&self, collection: CollectionName) -> Result<(), Error> {
        let view = self.store.list(collection);
        let payload = serde_json::to_string(view.as_slice())
            .map_err(|err| Error::internal(format!("failed to serialise {collection}: {err}")))?;
        self.kv
            .set(collection.storage_key(), &payload)
            .map_err(map_kv_error)?;
        debug!(%collection, count = view.len(), "persisted collection");
        Ok(())
    }

    /// Run `change` and persist; restore the previous view if persisting fails.
    fn write_through<T>(
        &self,
        collection: CollectionName,
        change: impl FnOnce(&EntityStore) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let read_only = self.lock()?;
        if read_only.contains(&collection) {
            return Err(Error::parse(format!(
                "{collection} is read-only: its corrupt data could not be quarantined"
            ))
            .with_details(serde_json::json!({
                "collection": collection,
                "key": collection.storage_key(),
            })));
        }
        let previous = self.store.list(collection);
        let outcome = change(&self.store)?;
        if let Err(err) = self.persist(collection) {
            warn!(%collection, error = %err, "persisting failed, rolling back");
            self.store.replace_all(collection, previous.as_ref().clone())?;
            return Err(err);
        }
        Ok(outcome)
    }

    fn attach_sync(&self) -> Result<AttachReport, Error> {
        let mut read_only = self.lock()?;
        read_only.clear();
        let mut report = AttachReport::default();
        for collection in CollectionName::all() {
            match self.load(collection) {
                Ok(entities) => {
                    let count = entities.len();
                    self.store.replace_all(collection, entities)?;
                    debug!(%collection, count, "loaded collection");
                }
                Err(failure) => {
                    self.store.replace_all(collection, Vec::new())?;
                    if failure.read_only {
                        read_only.insert(collection);
                    }
                    report.load_failures.push((collection, failure.error));
                }
            }
        }
        info!(failures = report.load_failures.len(), "local backend attached");
        Ok(report)
    }
}

/// Why a collection could not be loaded, and whether it must refuse writes.
struct LoadFailure {
    error: Error,
    read_only: bool,
}

impl LoadFailure {
    /// The key could not be read at all, so nothing was overwritten yet.
    fn unreadable(error: Error) -> Self {
        Self {
            error,
            read_only: true,
        }
    }
}

fn decode_collection(collection: CollectionName, raw: &str) -> Result<Vec<Entity>, String> {
    let values: Vec<Value> = serde_json::from_str(raw).map_err(|err| err.to_string())?;
    let mut seen = std::collections::BTreeSet::new();
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            let entity = Entity::decode(collection, value)
                .map_err(|err| format!("entry {index}: {err}"))?;
            if !seen.insert(entity.id().clone()) {
                return Err(format!("entry {index}: duplicate id {}", entity.id()));
            }
            Ok(entity)
        })
        .collect()
}

fn map_kv_error(error: KeyValueStoreError) -> Error {
    match &error {
        KeyValueStoreError::Io { key, .. } | KeyValueStoreError::InvalidKey { key } => {
            Error::internal(error.to_string()).with_details(serde_json::json!({ "key": key }))
        }
    }
}

#[async_trait]
impl<K> EntityBackend for LocalEntityBackend<K>
where
    K: KeyValueStore + 'static,
{
    fn mode(&self) -> StoreMode {
        StoreMode::Local
    }

    async fn attach(&self) -> Result<AttachReport, Error> {
        self.attach_sync()
    }

    async fn detach(&self) {}

    async fn fetch(&self, collection: CollectionName, id: &EntityId) -> Result<Entity, Error> {
        self.store
            .get(collection, id)
            .ok_or_else(|| not_found(collection, id))
    }

    async fn create(&self, entity: Entity) -> Result<Entity, Error> {
        let collection = entity.collection();
        let stored = entity.clone();
        self.write_through(collection, move |store| store.insert_local(entity))?;
        Ok(stored)
    }

    async fn update(
        &self,
        collection: CollectionName,
        id: &EntityId,
        transition: &Transition,
    ) -> Result<Entity, Error> {
        self.write_through(collection, |store| store.mutate_local(collection, id, transition))
    }

    async fn delete(&self, collection: CollectionName, id: &EntityId) -> Result<(), Error> {
        self.write_through(collection, |store| store.remove_local(collection, id))
            .map(drop)
    }
}
