//! Capability interface over the store of record.
//!
//! The gateway talks to exactly one [`EntityBackend`] per session. The local
//! backend persists the entity store itself; the remote backend writes to a
//! document store and lets live subscriptions refresh the entity store.

use async_trait::async_trait;

use crate::domain::{CollectionName, Entity, EntityId, Error, StoreMode};

/// Change applied to one freshly read entity.
///
/// A transition may run more than once when a conditional write has to be
/// retried, so it must only depend on the entity it is given.
pub type Transition = dyn Fn(&mut Entity) -> Result<(), Error> + Send + Sync;

/// Outcome of attaching a backend to the entity store.
#[derive(Debug, Default)]
pub struct AttachReport {
    /// Collections that could not be loaded and started empty.
    pub load_failures: Vec<(CollectionName, Error)>,
    /// Live subscriptions started.
    pub subscriptions: usize,
}

impl AttachReport {
    pub fn is_clean(&self) -> bool {
        self.load_failures.is_empty()
    }
}

#[async_trait]
pub trait EntityBackend: Send + Sync {
    /// Mode this backend serves.
    fn mode(&self) -> StoreMode;

    /// Populate the entity store. Failures of single collections are
    /// reported, not fatal.
    async fn attach(&self) -> Result<AttachReport, Error>;

    /// Stop live updates. Safe to call more than once.
    async fn detach(&self);

    /// Point read from the store of record.
    async fn fetch(&self, collection: CollectionName, id: &EntityId) -> Result<Entity, Error>;

    /// Store a new entity, returning it as stored.
    async fn create(&self, entity: Entity) -> Result<Entity, Error>;

    /// Read, transform and write back one entity.
    async fn update(
        &self,
        collection: CollectionName,
        id: &EntityId,
        transition: &Transition,
    ) -> Result<Entity, Error>;

    /// Delete one entity.
    async fn delete(&self, collection: CollectionName, id: &EntityId) -> Result<(), Error>;
}
