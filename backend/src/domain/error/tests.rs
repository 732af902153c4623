//! Tests for domain error construction and serialisation.

use super::*;
use rstest::rstest;
use serde_json::json;

#[rstest]
#[case(Error::invalid_request("bad"), ErrorCode::InvalidRequest)]
#[case(Error::unauthorized("who"), ErrorCode::Unauthorized)]
#[case(Error::forbidden("nope"), ErrorCode::Forbidden)]
#[case(Error::not_found("gone"), ErrorCode::NotFound)]
#[case(Error::conflict("raced"), ErrorCode::Conflict)]
#[case(Error::configuration("unset"), ErrorCode::Configuration)]
#[case(Error::parse("garbled"), ErrorCode::Parse)]
#[case(Error::service_unavailable("offline"), ErrorCode::ServiceUnavailable)]
#[case(Error::internal("boom"), ErrorCode::InternalError)]
fn convenience_constructors_set_code(#[case] error: Error, #[case] expected: ErrorCode) {
    assert_eq!(error.code(), expected);
}

#[rstest]
fn try_new_rejects_empty_messages() {
    let result = Error::try_new(ErrorCode::InvalidRequest, "   ");
    assert!(matches!(result, Err(ErrorValidationError::EmptyMessage)));
}

#[rstest]
fn display_uses_the_message() {
    assert_eq!(Error::not_found("no such hackathon").to_string(), "no such hackathon");
}

#[rstest]
fn serialises_with_snake_case_code_and_details() {
    let error = Error::conflict("revision mismatch").with_details(json!({ "attempts": 3 }));
    let value = serde_json::to_value(&error).expect("serialise error");

    assert_eq!(
        value,
        json!({
            "code": "conflict",
            "message": "revision mismatch",
            "details": { "attempts": 3 },
        })
    );
}

#[rstest]
fn omits_absent_details() {
    let value = serde_json::to_value(Error::parse("bad json")).expect("serialise error");
    assert!(value.get("details").is_none());
}

#[rstest]
fn deserialising_blank_message_fails() {
    let payload = json!({ "code": "not_found", "message": " " });
    let result: Result<Error, _> = serde_json::from_value(payload);
    assert!(result.is_err());
}

#[rstest]
fn round_trips_through_json() {
    let original = Error::service_unavailable("document store offline")
        .with_details(json!({ "collection": "hackathons" }));
    let json = serde_json::to_string(&original).expect("serialise");
    let decoded: Error = serde_json::from_str(&json).expect("deserialise");
    assert_eq!(decoded, original);
}
