//! The single write path for campus entities.
//!
//! Every create, status change and delete goes through
//! [`MutationGateway`], which resolves the acting user from the explicit
//! [`SessionContext`], stamps identifiers and timestamps, enforces the
//! ownership rules and hands the change to the session's
//! [`EntityBackend`]. Reads come straight from the [`EntityStore`].

use std::sync::Arc;

use mockable::Clock;
use tracing::{debug, info};

use super::entities::{Entity, EntityDraft};
use super::entity_filter::EntityFilter;
use super::entity_patch::{Access, EntityPatch};
use super::entity_store::CollectionView;
use super::ports::EntityBackend;
use super::{Actor, CollectionName, EntityId, EntityStore, Error, SessionContext, UserId};

/// Write path over one backend.
///
/// # Examples
/// ```rust,no_run
/// # use std::sync::Arc;
/// # use campus_hub::domain::{
/// #     CollectionName, EntityStore, LocalEntityBackend, MutationGateway, StoreMode,
/// # };
/// # use campus_hub::domain::ports::FixtureKeyValueStore;
/// # use mockable::DefaultClock;
/// let store = Arc::new(EntityStore::new(StoreMode::Local));
/// let backend = LocalEntityBackend::new(Arc::clone(&store), Arc::new(FixtureKeyValueStore::default()));
/// let gateway = MutationGateway::new(store, Arc::new(backend), Arc::new(DefaultClock));
/// assert!(gateway.list(CollectionName::Posts).is_empty());
/// ```
pub struct MutationGateway<B: ?Sized> {
    store: Arc<EntityStore>,
    backend: Arc<B>,
    clock: Arc<dyn Clock>,
}

impl<B: ?Sized> Clone for MutationGateway<B> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            backend: Arc::clone(&self.backend),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<B: ?Sized> MutationGateway<B> {
    pub fn new(store: Arc<EntityStore>, backend: Arc<B>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            backend,
            clock,
        }
    }

    /// Current view of `collection`, in display order.
    pub fn list(&self, collection: CollectionName) -> CollectionView {
        self.store.list(collection)
    }

    /// Entities of the filter's collection that match it, in display order.
    pub fn list_where(&self, filter: &EntityFilter) -> Vec<Entity> {
        filter.select(&self.store.list(filter.collection()))
    }

    pub fn get(&self, collection: CollectionName, id: &EntityId) -> Option<Entity> {
        self.store.get(collection, id)
    }

    pub fn store(&self) -> &Arc<EntityStore> {
        &self.store
    }
}

impl<B> MutationGateway<B>
where
    B: EntityBackend + ?Sized,
{
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Create an entity from `draft` on behalf of the signed-in user.
    ///
    /// Applications must reference an existing post that accepts them, and
    /// a student applies to a post at most once.
    pub async fn add(&self, session: &SessionContext, draft: EntityDraft) -> Result<Entity, Error> {
        let actor = session.require_actor()?;
        if let EntityDraft::Application(application) = &draft {
            self.check_application(actor, &application.post_id).await?;
        }
        let entity = draft.into_entity(EntityId::random(), actor, self.clock.utc())?;
        let collection = entity.collection();
        let stored = self.backend.create(entity).await?;
        info!(%collection, id = %stored.id(), actor = %actor.id, "entity created");
        Ok(stored)
    }

    /// Apply `patch` to one entity on behalf of the signed-in user.
    pub async fn update_status(
        &self,
        session: &SessionContext,
        collection: CollectionName,
        id: &EntityId,
        patch: EntityPatch,
    ) -> Result<Entity, Error> {
        let actor = session.require_actor()?.clone();
        patch.ensure_collection(collection)?;
        let post_owner = match patch.access() {
            Access::PostOwner => Some(self.referenced_post_owner(id).await?),
            _ => None,
        };
        let now = self.clock.utc();
        let op = patch.name();
        let actor_id = actor.id.clone();
        let transition = move |entity: &mut Entity| {
            patch.authorize(entity, &actor, post_owner.as_ref())?;
            patch.apply(entity, &actor, now)
        };
        let updated = self.backend.update(collection, id, &transition).await?;
        info!(%collection, %id, op, actor = %actor_id, "entity updated");
        Ok(updated)
    }

    /// Delete one entity. Only its owner may delete it.
    pub async fn remove(
        &self,
        session: &SessionContext,
        collection: CollectionName,
        id: &EntityId,
    ) -> Result<(), Error> {
        let actor = session.require_actor()?;
        let entity = self.backend.fetch(collection, id).await?;
        if entity.owner_id() != &actor.id {
            return Err(Error::forbidden("only the owner may delete this item")
                .with_details(serde_json::json!({ "collection": collection, "id": id })));
        }
        self.backend.delete(collection, id).await?;
        info!(%collection, %id, actor = %actor.id, "entity removed");
        Ok(())
    }

    /// Add the signed-in user to a hackathon's applicants.
    pub async fn apply_to_hackathon(
        &self,
        session: &SessionContext,
        id: &EntityId,
    ) -> Result<Entity, Error> {
        self.update_status(session, CollectionName::Hackathons, id, EntityPatch::Apply)
            .await
    }

    /// Remove the signed-in user from a hackathon's applicants.
    pub async fn withdraw_from_hackathon(
        &self,
        session: &SessionContext,
        id: &EntityId,
    ) -> Result<Entity, Error> {
        self.update_status(session, CollectionName::Hackathons, id, EntityPatch::Withdraw)
            .await
    }

    async fn check_application(&self, actor: &Actor, post_id: &EntityId) -> Result<(), Error> {
        let Entity::Post(post) = self.backend.fetch(CollectionName::Posts, post_id).await? else {
            return Err(Error::internal("posts collection returned a non-post entity"));
        };
        if !post.apply_enabled {
            return Err(Error::conflict("this post does not accept applications")
                .with_details(serde_json::json!({ "postId": post_id })));
        }
        let already_applied = self.store.list(CollectionName::Applications).iter().any(|e| {
            matches!(e, Entity::Application(a) if a.post_id == *post_id && a.student_id == actor.id)
        });
        if already_applied {
            return Err(Error::conflict("you have already applied to this post")
                .with_details(serde_json::json!({ "postId": post_id })));
        }
        debug!(%post_id, actor = %actor.id, "application accepted for creation");
        Ok(())
    }

    async fn referenced_post_owner(&self, application_id: &EntityId) -> Result<UserId, Error> {
        let Entity::Application(application) = self
            .backend
            .fetch(CollectionName::Applications, application_id)
            .await?
        else {
            return Err(Error::internal(
                "applications collection returned a non-application entity",
            ));
        };
        let post = self
            .backend
            .fetch(CollectionName::Posts, &application.post_id)
            .await?;
        Ok(post.owner_id().clone())
    }
}
