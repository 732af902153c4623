//! Tests for the collection-tagged entity wrappers.

use super::test_fixtures::{actor, at};
use super::*;
use crate::domain::ErrorCode;
use rstest::rstest;
use serde_json::json;

fn help_entity() -> Entity {
    EntityDraft::decode(
        CollectionName::Help,
        json!({ "request": "Lift to the station", "category": "transport" }),
    )
    .expect("valid draft")
    .into_entity(EntityId::new("h1").expect("id"), &actor("u1"), at(7, 8))
    .expect("valid entity")
}

#[rstest]
fn drafts_reject_unknown_fields() {
    let result = EntityDraft::decode(
        CollectionName::Emergency,
        json!({ "message": "Smoke", "location": "Lab 2", "type": "fire", "severity": 5 }),
    );
    assert!(result.is_err());
}

#[rstest]
fn drafts_become_entities_of_their_collection() {
    let entity = help_entity();
    assert_eq!(entity.collection(), CollectionName::Help);
    assert_eq!(entity.owner_id().as_ref(), "u1");
    assert_eq!(entity.order_key(), at(7, 8));
}

#[rstest]
fn decode_rejects_shapes_from_other_collections() {
    let help = serde_json::to_value(help_entity()).expect("serialise");
    assert!(Entity::decode(CollectionName::Emergency, help).is_err());
}

#[rstest]
fn fields_exclude_the_identifier_and_restore_it() {
    let entity = help_entity();
    let fields = entity.to_fields().expect("fields");
    assert!(!fields.contains_key("id"));
    assert_eq!(fields["status"], json!("pending"));

    let restored = Entity::from_fields(CollectionName::Help, entity.id(), fields)
        .expect("decode fields");
    assert_eq!(restored, entity);
}

#[rstest]
fn set_id_replaces_the_identifier() {
    let mut entity = help_entity();
    entity.set_id(EntityId::new("remote-42").expect("id"));
    assert_eq!(entity.id().as_ref(), "remote-42");
}

#[rstest]
#[case(&"x".repeat(TITLE_MAX), true)]
#[case(&"x".repeat(TITLE_MAX + 1), false)]
#[case("   ", false)]
fn title_rules(#[case] title: &str, #[case] accepted: bool) {
    let result = require_title(title);
    assert_eq!(result.is_ok(), accepted);
    if let Err(err) = result {
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }
}

#[rstest]
fn marketplace_example_decodes_from_portal_json() {
    let value = json!({
        "id": "m1",
        "title": "Cycle",
        "description": "Single speed",
        "price": 500,
        "category": null,
        "condition": "good",
        "images": [],
        "sellerId": "u1",
        "sellerName": "Ada",
        "sellerEmail": null,
        "isSold": false,
        "buyerId": null,
        "buyerName": null,
        "createdAt": "2025-09-03T12:00:00Z"
    });
    let entity = Entity::decode(CollectionName::Marketplace, value.clone()).expect("decode");
    assert_eq!(serde_json::to_value(&entity).expect("serialise"), value);
}
