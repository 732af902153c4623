//! In-memory, observable view of every collection.
//!
//! The store holds one ordered sequence per collection behind a
//! `tokio::sync::watch` channel. Readers receive cheap `Arc` snapshots and
//! may subscribe to changes; only the backends write.
//!
//! In local mode the store is the record of truth and accepts in-place
//! edits. In remote mode it only mirrors snapshots delivered by the remote
//! subscriptions, so the local-only operations are refused.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use super::entities::Entity;
use super::{CollectionName, EntityId, Error, SortDirection};

/// Shared, read-only view of one collection.
pub type CollectionView = Arc<Vec<Entity>>;

/// Which backend is the record of truth for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreMode {
    Local,
    Remote,
}

impl StoreMode {
    /// Mode selected by the `use_remote` flag.
    pub const fn from_flag(use_remote: bool) -> Self {
        if use_remote {
            Self::Remote
        } else {
            Self::Local
        }
    }
}

/// Observable entity store. See the module docs for the write rules.
#[derive(Debug)]
pub struct EntityStore {
    mode: StoreMode,
    channels: BTreeMap<CollectionName, watch::Sender<CollectionView>>,
}

impl EntityStore {
    /// Create an empty store. The mode is fixed for the store's lifetime.
    pub fn new(mode: StoreMode) -> Self {
        let channels = CollectionName::all()
            .map(|collection| {
                let (sender, _) = watch::channel(Arc::new(Vec::new()));
                (collection, sender)
            })
            .collect();
        Self { mode, channels }
    }

    pub fn mode(&self) -> StoreMode {
        self.mode
    }

    /// Current view of `collection`, in display order.
    pub fn list(&self, collection: CollectionName) -> CollectionView {
        self.sender(collection).borrow().clone()
    }

    /// Clone of one entity, if present.
    pub fn get(&self, collection: CollectionName, id: &EntityId) -> Option<Entity> {
        self.sender(collection)
            .borrow()
            .iter()
            .find(|entity| entity.id() == id)
            .cloned()
    }

    /// Receiver notified whenever `collection` changes.
    pub fn watch(&self, collection: CollectionName) -> watch::Receiver<CollectionView> {
        self.sender(collection).subscribe()
    }

    /// Replace the whole sequence of `collection`.
    ///
    /// Entities are stable-sorted by the collection ordering. The call fails
    /// without changing anything when an entity belongs to another
    /// collection or an identifier repeats.
    pub fn replace_all(
        &self,
        collection: CollectionName,
        mut entities: Vec<Entity>,
    ) -> Result<(), Error> {
        if let Some(stray) = entities.iter().find(|e| e.collection() != collection) {
            return Err(Error::invalid_request(format!(
                "entity {} belongs to {}, not {collection}",
                stray.id(),
                stray.collection()
            )));
        }
        let mut seen = std::collections::BTreeSet::new();
        if let Some(duplicate) = entities.iter().find(|e| !seen.insert(e.id().clone())) {
            return Err(Error::invalid_request(format!(
                "duplicate id {} in {collection}",
                duplicate.id()
            )));
        }
        sort_for_display(collection, &mut entities);
        debug!(%collection, count = entities.len(), "replacing collection view");
        self.sender(collection).send_replace(Arc::new(entities));
        Ok(())
    }

    /// Insert one entity at its ordered position. Local mode only.
    ///
    /// Among entities with an equal ordering key, a newly inserted entity
    /// comes first in newest-first collections and last otherwise.
    pub fn insert_local(&self, entity: Entity) -> Result<(), Error> {
        self.require_local("insert")?;
        let collection = entity.collection();
        let mut outcome = Ok(());
        self.sender(collection).send_if_modified(|current| {
            if current.iter().any(|e| e.id() == entity.id()) {
                outcome = Err(Error::conflict(format!(
                    "{collection} already contains {}",
                    entity.id()
                )));
                return false;
            }
            let key = entity.order_key();
            let index = match collection.ordering().direction {
                SortDirection::Descending => current.partition_point(|e| e.order_key() > key),
                SortDirection::Ascending => current.partition_point(|e| e.order_key() <= key),
            };
            Arc::make_mut(current).insert(index, entity);
            true
        });
        outcome
    }

    /// Edit exactly one entity in place. Local mode only.
    ///
    /// `edit` runs on a copy; the view changes only when it succeeds. The
    /// updated entity is returned.
    pub fn mutate_local<F>(
        &self,
        collection: CollectionName,
        id: &EntityId,
        edit: F,
    ) -> Result<Entity, Error>
    where
        F: FnOnce(&mut Entity) -> Result<(), Error>,
    {
        self.require_local("mutate")?;
        let mut outcome = Err(not_found(collection, id));
        self.sender(collection).send_if_modified(|current| {
            let Some(index) = current.iter().position(|e| e.id() == id) else {
                return false;
            };
            let mut updated = current[index].clone();
            if let Err(err) = edit(&mut updated) {
                outcome = Err(err);
                return false;
            }
            if updated.id() != id || updated.collection() != collection {
                outcome = Err(Error::internal("an edit must not change identity"));
                return false;
            }
            let entities = Arc::make_mut(current);
            entities[index] = updated.clone();
            sort_for_display(collection, entities);
            outcome = Ok(updated);
            true
        });
        outcome
    }

    /// Remove one entity. Local mode only.
    pub fn remove_local(&self, collection: CollectionName, id: &EntityId) -> Result<Entity, Error> {
        self.require_local("remove")?;
        let mut outcome = Err(not_found(collection, id));
        self.sender(collection).send_if_modified(|current| {
            let Some(index) = current.iter().position(|e| e.id() == id) else {
                return false;
            };
            outcome = Ok(Arc::make_mut(current).remove(index));
            true
        });
        outcome
    }

    fn require_local(&self, operation: &str) -> Result<(), Error> {
        match self.mode {
            StoreMode::Local => Ok(()),
            StoreMode::Remote => Err(Error::internal(format!(
                "{operation} is only available when the store is in local mode"
            ))),
        }
    }

    fn sender(&self, collection: CollectionName) -> &watch::Sender<CollectionView> {
        // Every collection gets a channel in `new`.
        &self.channels[&collection]
    }
}

pub(crate) fn not_found(collection: CollectionName, id: &EntityId) -> Error {
    Error::not_found(format!("{collection} has no entity {id}"))
        .with_details(serde_json::json!({ "collection": collection, "id": id }))
}

/// Stable sort by the collection's ordering field and direction.
fn sort_for_display(collection: CollectionName, entities: &mut [Entity]) {
    match collection.ordering().direction {
        SortDirection::Ascending => entities.sort_by_key(Entity::order_key),
        SortDirection::Descending => {
            entities.sort_by(|a, b| b.order_key().cmp(&a.order_key()));
        }
    }
}
