//! Tests for snapshot handling and conditional writes of the remote backend.

use super::*;
use crate::domain::entities::test_fixtures::{actor, at};
use crate::domain::ports::MockDocumentStore;
use crate::domain::{EntityDraft, EntityPatch, ErrorCode};
use futures::stream::{self, StreamExt as _};
use rstest::rstest;
use serde_json::json;

fn help(id: &str) -> Entity {
    EntityDraft::decode(
        CollectionName::Help,
        json!({ "request": "Need a charger", "category": "gadgets" }),
    )
    .expect("draft")
    .into_entity(EntityId::new(id).expect("id"), &actor("u1"), at(8, 10))
    .expect("entity")
}

fn document(entity: &Entity, revision: u64) -> Document {
    Document {
        id: entity.id().clone(),
        revision,
        fields: entity.to_fields().expect("fields"),
    }
}

fn backend(
    documents: MockDocumentStore,
    consistency: WriteConsistency,
) -> RemoteEntityBackend<MockDocumentStore> {
    RemoteEntityBackend::new(
        Arc::new(EntityStore::new(StoreMode::Remote)),
        Arc::new(documents),
        consistency,
    )
}

fn offer_help() -> impl Fn(&mut Entity) -> Result<(), Error> + Send + Sync {
    let helper = actor("u2");
    move |entity: &mut Entity| EntityPatch::OfferHelp.apply(entity, &helper, at(9, 0))
}

#[rstest]
#[case("last-write-wins", WriteConsistency::LastWriteWins)]
#[case("compare-and-swap", WriteConsistency::CompareAndSwap { max_attempts: 3 })]
#[case(" CAS ", WriteConsistency::CompareAndSwap { max_attempts: 3 })]
fn parses_write_consistency(#[case] raw: &str, #[case] expected: WriteConsistency) {
    assert_eq!(WriteConsistency::from_setting(raw, 3).expect("valid"), expected);
}

#[rstest]
fn unknown_write_consistency_is_a_configuration_error() {
    let err = WriteConsistency::from_setting("eventual", 3).expect_err("unknown");
    assert_eq!(err.code(), ErrorCode::Configuration);
}

#[tokio::test]
async fn updates_send_only_changed_fields() {
    let original = help("h1");
    let stored = document(&original, 4);
    let mut documents = MockDocumentStore::new();
    let read = stored.clone();
    documents
        .expect_get()
        .returning(move |_, _| Ok(Some(read.clone())));
    documents
        .expect_update()
        .withf(|_, _, fields, expected| {
            fields.keys().collect::<Vec<_>>() == ["helpersNotified"] && expected.is_none()
        })
        .times(1)
        .returning(move |_, _, fields, _| {
            let mut merged = stored.clone();
            merged.fields.extend(fields);
            merged.revision += 1;
            Ok(merged)
        });
    let backend = backend(documents, WriteConsistency::LastWriteWins);

    let updated = backend
        .update(CollectionName::Help, original.id(), &offer_help())
        .await
        .expect("update");

    let Entity::Help(request) = updated else {
        panic!("expected a help request");
    };
    assert_eq!(request.helpers_notified.len(), 1);
}

#[tokio::test]
async fn no_op_transitions_skip_the_write() {
    let original = help("h1");
    let mut documents = MockDocumentStore::new();
    let read = document(&original, 1);
    documents
        .expect_get()
        .returning(move |_, _| Ok(Some(read.clone())));
    documents.expect_update().never();
    let backend = backend(documents, WriteConsistency::LastWriteWins);

    let unchanged = backend
        .update(CollectionName::Help, original.id(), &|_: &mut Entity| Ok::<(), Error>(()))
        .await
        .expect("update");
    assert_eq!(unchanged, original);
}

#[tokio::test]
async fn compare_and_swap_retries_then_reports_conflict() {
    let original = help("h1");
    let mut documents = MockDocumentStore::new();
    let read = document(&original, 7);
    documents
        .expect_get()
        .times(2)
        .returning(move |_, _| Ok(Some(read.clone())));
    documents
        .expect_update()
        .withf(|_, _, _, expected| *expected == Some(7))
        .times(2)
        .returning(|_, _, _, _| Err(DocumentStoreError::revision_mismatch(7_u64, "8")));
    let backend = backend(documents, WriteConsistency::CompareAndSwap { max_attempts: 2 });

    let err = backend
        .update(CollectionName::Help, original.id(), &offer_help())
        .await
        .expect_err("conflict");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[tokio::test]
async fn missing_documents_are_not_found() {
    let mut documents = MockDocumentStore::new();
    documents.expect_get().returning(|_, _| Ok(None));
    let backend = backend(documents, WriteConsistency::LastWriteWins);

    let err = backend
        .fetch(CollectionName::Help, &EntityId::new("gone").expect("id"))
        .await
        .expect_err("missing");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[case(DocumentStoreError::timeout("30s"), ErrorCode::ServiceUnavailable)]
#[case(DocumentStoreError::connection("refused"), ErrorCode::ServiceUnavailable)]
#[case(DocumentStoreError::decode("bad json"), ErrorCode::Parse)]
#[case(DocumentStoreError::rejected("403"), ErrorCode::InvalidRequest)]
fn maps_document_errors(#[case] error: DocumentStoreError, #[case] expected: ErrorCode) {
    assert_eq!(map_document_error(error, CollectionName::Help).code(), expected);
}

#[tokio::test]
async fn snapshots_drop_documents_of_the_wrong_shape() {
    let good = help("h1");
    let bad = Document {
        id: EntityId::new("h2").expect("id"),
        revision: 1,
        fields: json!({ "request": "no requester" })
            .as_object()
            .cloned()
            .expect("object"),
    };
    let mut documents = MockDocumentStore::new();
    let snapshot = vec![document(&good, 1), bad];
    documents.expect_subscribe().returning(move |collection, _| {
        if collection == CollectionName::Help {
            Ok(stream::iter(vec![Ok(snapshot.clone())]).chain(stream::pending()).boxed())
        } else {
            Ok(stream::pending().boxed())
        }
    });
    let store = Arc::new(EntityStore::new(StoreMode::Remote));
    let backend = RemoteEntityBackend::new(
        Arc::clone(&store),
        Arc::new(documents),
        WriteConsistency::LastWriteWins,
    );
    let mut receiver = store.watch(CollectionName::Help);

    let report = backend.attach().await.expect("attach");
    assert_eq!(report.subscriptions, CollectionName::ALL.len());

    receiver.changed().await.expect("snapshot delivered");
    assert_eq!(store.list(CollectionName::Help).as_slice(), &[good]);
    backend.detach().await;
}

#[tokio::test]
async fn failed_subscriptions_are_reported_not_fatal() {
    let mut documents = MockDocumentStore::new();
    documents.expect_subscribe().returning(|collection, _| {
        if collection == CollectionName::Emergency {
            Err(DocumentStoreError::connection("refused"))
        } else {
            Ok(stream::pending().boxed())
        }
    });
    let backend = backend(documents, WriteConsistency::LastWriteWins);

    let report = backend.attach().await.expect("attach");
    assert_eq!(report.subscriptions, CollectionName::ALL.len() - 1);
    assert_eq!(report.load_failures.len(), 1);
    assert_eq!(report.load_failures[0].1.code(), ErrorCode::ServiceUnavailable);
    backend.detach().await;
}

#[tokio::test]
async fn cancelling_the_set_aborts_every_task() {
    let mut set = SubscriptionSet::default();
    let (alive, released) = tokio::sync::oneshot::channel::<()>();
    let task = tokio::spawn(async move {
        let _alive = alive;
        futures::future::pending::<()>().await;
    });
    set.push(CollectionName::Posts, task);

    assert_eq!(set.cancel_all(), 1);
    assert!(set.is_empty());
    assert!(released.await.is_err(), "aborted task drops its state");
}

#[tokio::test]
async fn attaching_twice_is_refused_until_detached() {
    let mut documents = MockDocumentStore::new();
    documents
        .expect_subscribe()
        .times(2 * CollectionName::ALL.len())
        .returning(|_, _| Ok(stream::pending().boxed()));
    let backend = backend(documents, WriteConsistency::LastWriteWins);

    backend.attach().await.expect("first attach");
    let err = backend.attach().await.expect_err("already attached");
    assert_eq!(err.code(), ErrorCode::Conflict);

    backend.detach().await;
    let report = backend.attach().await.expect("attach after detach");
    assert_eq!(report.subscriptions, CollectionName::ALL.len());
    backend.detach().await;
}
