//! Remote mode over the in-memory document store: snapshot delivery,
//! cancellation and the two write-consistency policies under a forced
//! read-read-write-write interleaving.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use campus_hub::app::Hub;
use campus_hub::domain::ports::{
    Document, DocumentFields, DocumentStore, DocumentStoreError, FixtureKeyValueStore,
    SnapshotStream,
};
use campus_hub::domain::{
    Actor, CollectionName, CollectionOrdering, Entity, EntityDraft, EntityId, EntityStore,
    ErrorCode, SessionContext, UserId, UserRole, WriteConsistency,
};
use campus_hub::outbound::documents::InMemoryDocumentStore;
use campus_hub::test_support::documents::RendezvousDocumentStore;
use futures::stream;
use mockable::DefaultClock;
use rstest::rstest;
use serde_json::json;
use tokio::time::{sleep, timeout};

const WAIT: Duration = Duration::from_secs(2);

fn session(id: &str) -> SessionContext {
    let actor = Actor::new(UserId::new(id).expect("user id"), format!("User {id}"), UserRole::Student);
    SessionContext::signed_in(actor)
}

fn hackathon_draft() -> EntityDraft {
    EntityDraft::decode(
        CollectionName::Hackathons,
        json!({
            "title": "Campus hack",
            "description": "Two days of building",
            "startDate": "2025-10-01T09:00:00Z",
            "endDate": "2025-10-02T18:00:00Z",
            "location": "Innovation lab",
        }),
    )
    .expect("valid draft")
}

fn remote_hub<D: DocumentStore + 'static>(
    documents: Arc<D>,
    consistency: WriteConsistency,
) -> Hub {
    Hub::remote(
        Arc::new(FixtureKeyValueStore::default()),
        documents,
        consistency,
        Arc::new(DefaultClock),
    )
}

/// Wait until the store view of `collection` satisfies `done`.
async fn settle(store: &EntityStore, collection: CollectionName, done: impl Fn(&[Entity]) -> bool) {
    let mut receiver = store.watch(collection);
    timeout(WAIT, receiver.wait_for(|view| done(view.as_slice())))
        .await
        .expect("store settled in time")
        .expect("store open");
}

async fn stored_applicants(documents: &InMemoryDocumentStore, id: &EntityId) -> usize {
    let document = documents
        .get(CollectionName::Hackathons, id)
        .await
        .expect("read")
        .expect("document exists");
    document.fields["applicants"]
        .as_array()
        .map_or(0, Vec::len)
}

/// Two students apply at once; both read the document before either writes.
async fn race_two_applications(
    consistency: WriteConsistency,
) -> (Hub, Arc<InMemoryDocumentStore>, EntityId, [Result<Entity, campus_hub::domain::Error>; 2]) {
    let inner = Arc::new(InMemoryDocumentStore::new());
    let documents = Arc::new(RendezvousDocumentStore::new(Arc::clone(&inner), 2));
    let hub = remote_hub(documents, consistency);
    hub.attach(WAIT).await.expect("attach");

    let hackathon = hub
        .gateway()
        .add(&session("organiser"), hackathon_draft())
        .await
        .expect("hackathon");
    let id = hackathon.id().clone();

    let (alice, bob) = (session("alice"), session("bob"));
    let gateway = hub.gateway();
    let (first, second) = tokio::join!(
        gateway.apply_to_hackathon(&alice, &id),
        gateway.apply_to_hackathon(&bob, &id),
    );
    (hub, inner, id, [first, second])
}

#[rstest]
#[tokio::test]
async fn snapshots_carry_writes_into_the_store() {
    let hub = remote_hub(
        Arc::new(InMemoryDocumentStore::new()),
        WriteConsistency::LastWriteWins,
    );
    hub.attach(WAIT).await.expect("attach");

    let created = hub
        .gateway()
        .add(&session("organiser"), hackathon_draft())
        .await
        .expect("hackathon");
    settle(hub.store(), CollectionName::Hackathons, |view| {
        view.iter().any(|entity| entity.id() == created.id())
    })
    .await;
    hub.detach().await;
}

#[rstest]
#[tokio::test]
async fn detached_sessions_receive_no_further_snapshots() {
    let documents = Arc::new(InMemoryDocumentStore::new());
    let hub = remote_hub(Arc::clone(&documents), WriteConsistency::LastWriteWins);
    hub.attach(WAIT).await.expect("attach");
    hub.detach().await;

    hub.gateway()
        .add(&session("organiser"), hackathon_draft())
        .await
        .expect("write still reaches the document store");
    sleep(Duration::from_millis(100)).await;

    assert_eq!(documents.len(CollectionName::Hackathons), 1);
    assert!(hub.gateway().list(CollectionName::Hackathons).is_empty());
}

#[rstest]
#[tokio::test]
async fn last_write_wins_loses_a_concurrent_application() {
    let (hub, inner, id, results) = race_two_applications(WriteConsistency::LastWriteWins).await;
    for result in &results {
        assert!(result.is_ok(), "both applications report success: {result:?}");
    }
    assert_eq!(stored_applicants(&inner, &id).await, 1);
    hub.detach().await;
}

#[rstest]
#[tokio::test]
async fn compare_and_swap_keeps_both_applications() {
    let (hub, inner, id, results) =
        race_two_applications(WriteConsistency::CompareAndSwap { max_attempts: 3 }).await;
    for result in &results {
        assert!(result.is_ok(), "{result:?}");
    }
    assert_eq!(stored_applicants(&inner, &id).await, 2);

    settle(hub.store(), CollectionName::Hackathons, |view| {
        matches!(view, [Entity::Hackathon(h)] if h.applicants.len() == 2)
    })
    .await;
    hub.detach().await;
}

#[rstest]
#[tokio::test]
async fn exhausted_compare_and_swap_reports_a_conflict() {
    let (hub, inner, id, results) =
        race_two_applications(WriteConsistency::CompareAndSwap { max_attempts: 1 }).await;
    let conflicts: Vec<_> = results
        .iter()
        .filter_map(|result| result.as_ref().err())
        .collect();
    let [conflict] = conflicts.as_slice() else {
        panic!("expected exactly one conflict, got {results:?}");
    };
    assert_eq!(conflict.code(), ErrorCode::Conflict);
    assert_eq!(stored_applicants(&inner, &id).await, 1);
    hub.detach().await;
}

/// Store whose live queries never deliver a snapshot.
struct SilentDocumentStore;

#[async_trait]
impl DocumentStore for SilentDocumentStore {
    async fn add(
        &self,
        _collection: CollectionName,
        _fields: DocumentFields,
    ) -> Result<Document, DocumentStoreError> {
        Err(DocumentStoreError::connection("offline"))
    }

    async fn get(
        &self,
        _collection: CollectionName,
        _id: &EntityId,
    ) -> Result<Option<Document>, DocumentStoreError> {
        Ok(None)
    }

    async fn update(
        &self,
        collection: CollectionName,
        id: &EntityId,
        _fields: DocumentFields,
        _expected_revision: Option<u64>,
    ) -> Result<Document, DocumentStoreError> {
        Err(DocumentStoreError::not_found(collection.as_str(), id.as_ref()))
    }

    async fn delete(
        &self,
        _collection: CollectionName,
        _id: &EntityId,
    ) -> Result<(), DocumentStoreError> {
        Ok(())
    }

    async fn subscribe(
        &self,
        _collection: CollectionName,
        _ordering: CollectionOrdering,
    ) -> Result<SnapshotStream, DocumentStoreError> {
        Ok(Box::pin(stream::pending()))
    }
}

#[rstest]
#[tokio::test]
async fn attach_gives_up_when_no_snapshot_arrives() {
    let hub = remote_hub(Arc::new(SilentDocumentStore), WriteConsistency::LastWriteWins);
    let err = hub
        .attach(Duration::from_millis(50))
        .await
        .expect_err("no snapshot");
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);

    // A failed wait leaves the hub detached, so retrying is not a conflict.
    let retry = hub
        .attach(Duration::from_millis(50))
        .await
        .expect_err("still no snapshot");
    assert_eq!(retry.code(), ErrorCode::ServiceUnavailable);
}
