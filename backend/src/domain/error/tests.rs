//! Tests for domain error construction and serialisation.

use super::*;
use crate::domain::TraceId;
use rstest::{fixture, rstest};
use serde_json::json;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn expected_trace_id() -> String {
    TRACE_ID.to_owned()
}

#[fixture]
fn base_error() -> Error {
    Error::invalid_request("bad")
}

#[rstest]
#[case::invalid(Error::invalid_request("x"), ErrorCode::InvalidRequest)]
#[case::unauthorized(Error::unauthorized("x"), ErrorCode::Unauthorized)]
#[case::forbidden(Error::forbidden("x"), ErrorCode::Forbidden)]
#[case::not_found(Error::not_found("x"), ErrorCode::NotFound)]
#[case::conflict(Error::conflict("x"), ErrorCode::Conflict)]
#[case::unavailable(Error::service_unavailable("x"), ErrorCode::ServiceUnavailable)]
#[case::internal(Error::internal("x"), ErrorCode::InternalError)]
fn constructors_set_codes(#[case] error: Error, #[case] expected: ErrorCode) {
    assert_eq!(error.code(), expected);
    assert_eq!(error.message(), "x");
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
fn trace_id_is_none_out_of_scope() {
    let error = Error::internal("boom");
    assert!(error.trace_id().is_none());
}

#[rstest]
#[tokio::test]
async fn new_captures_trace_id_in_scope(expected_trace_id: String) {
    let trace_id: TraceId = expected_trace_id
        .parse()
        .expect("fixtures provide a valid UUID");
    let error = TraceId::scope(trace_id, async move { Error::internal("boom") }).await;

    assert_eq!(error.trace_id(), Some(expected_trace_id.as_str()));
}

#[rstest]
#[tokio::test]
async fn deserialising_ignores_ambient_trace_id(expected_trace_id: String) {
    let trace_id: TraceId = expected_trace_id
        .parse()
        .expect("fixtures provide a valid UUID");
    let payload = json!({ "code": "not_found", "message": "missing" });

    let error = TraceId::scope(trace_id, async move {
        serde_json::from_value::<Error>(payload).expect("payload deserialises")
    })
    .await;

    assert!(error.trace_id().is_none());
}

#[rstest]
fn serialises_camel_case_payload(base_error: Error) {
    let error = base_error
        .with_trace_id("abc")
        .with_details(json!({ "field": "title" }));

    let value = serde_json::to_value(&error).expect("error serialises");

    assert_eq!(
        value,
        json!({
            "code": "invalid_request",
            "message": "bad",
            "traceId": "abc",
            "details": { "field": "title" },
        })
    );
}

#[rstest]
fn deserialising_rejects_blank_messages() {
    let payload = json!({ "code": "conflict", "message": "  " });
    let result = serde_json::from_value::<Error>(payload);
    assert!(result.is_err());
}
