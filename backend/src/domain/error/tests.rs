//! Tests for domain error construction and serialisation.

use super::*;
use rstest::{fixture, rstest};
use serde_json::json;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn base_error() -> Error {
    Error::invalid_request("bad")
}

#[rstest]
#[case(Error::invalid_request("x"), ErrorCode::InvalidRequest)]
#[case(Error::unauthorized("x"), ErrorCode::Unauthorized)]
#[case(Error::forbidden("x"), ErrorCode::Forbidden)]
#[case(Error::not_found("x"), ErrorCode::NotFound)]
#[case(Error::conflict("x"), ErrorCode::Conflict)]
#[case(Error::service_unavailable("x"), ErrorCode::ServiceUnavailable)]
#[case(Error::internal("x"), ErrorCode::InternalError)]
fn constructors_set_code(#[case] error: Error, #[case] expected: ErrorCode) {
    assert_eq!(error.code(), expected);
}

#[rstest]
fn try_new_rejects_empty_messages() {
    let result = Error::try_new(ErrorCode::InvalidRequest, "   ");
    assert!(matches!(result, Err(ErrorValidationError::EmptyMessage)));
}

#[rstest]
fn try_with_trace_id_rejects_empty_values(base_error: Error) {
    let result = base_error.try_with_trace_id("   ");
    assert!(matches!(result, Err(ErrorValidationError::EmptyTraceId)));
}

#[rstest]
fn trace_id_is_absent_out_of_scope() {
    assert!(Error::internal("boom").trace_id().is_none());
}

#[rstest]
#[tokio::test]
async fn constructors_capture_trace_id_in_scope() {
    let trace_id: TraceId = TRACE_ID.parse().expect("fixture is a valid UUID");
    let error = TraceId::scope(trace_id, async { Error::conflict("taken") }).await;
    assert_eq!(error.trace_id(), Some(TRACE_ID));
}

#[rstest]
fn serialises_camel_case_and_skips_empty_fields(base_error: Error) {
    let value = serde_json::to_value(base_error).expect("serialise error");
    assert_eq!(value, json!({ "code": "invalid_request", "message": "bad" }));
}

#[rstest]
fn deserialisation_keeps_payload_trace_and_details() {
    let payload = json!({
        "code": "conflict",
        "message": "book is not available",
        "traceId": TRACE_ID,
        "details": { "bookId": "b" }
    });
    let error: Error = serde_json::from_value(payload).expect("deserialise error");
    assert_eq!(error.code(), ErrorCode::Conflict);
    assert_eq!(error.trace_id(), Some(TRACE_ID));
    assert_eq!(error.details(), Some(&json!({ "bookId": "b" })));
}

#[rstest]
fn deserialisation_rejects_blank_message() {
    let payload = json!({ "code": "conflict", "message": " " });
    assert!(serde_json::from_value::<Error>(payload).is_err());
}
