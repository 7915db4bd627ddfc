//! Tests for rendering domain errors over HTTP.

use super::*;
use actix_web::body::to_bytes;
use actix_web::error;
use actix_web::http::header::CACHE_CONTROL;
use rstest::rstest;
use serde_json::{Value, json};

const TRACE_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

async fn render(error: &Error) -> (StatusCode, Option<String>, Option<String>, Value) {
    let response = ResponseError::error_response(error);
    let status = response.status();
    let header = |name: &str| {
        response
            .headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
    };
    let trace_id = header(TRACE_ID_HEADER);
    let cache_control = header(CACHE_CONTROL.as_str());
    let bytes = to_bytes(response.into_body()).await.expect("body");
    let body = serde_json::from_slice(&bytes).expect("JSON error body");
    (status, trace_id, cache_control, body)
}

#[rstest]
#[case(ErrorCode::InvalidRequest, StatusCode::BAD_REQUEST)]
#[case(ErrorCode::Unauthorized, StatusCode::UNAUTHORIZED)]
#[case(ErrorCode::Forbidden, StatusCode::FORBIDDEN)]
#[case(ErrorCode::NotFound, StatusCode::NOT_FOUND)]
#[case(ErrorCode::Conflict, StatusCode::CONFLICT)]
#[case(ErrorCode::PayloadTooLarge, StatusCode::PAYLOAD_TOO_LARGE)]
#[case(ErrorCode::ServiceUnavailable, StatusCode::SERVICE_UNAVAILABLE)]
#[case(ErrorCode::InternalError, StatusCode::INTERNAL_SERVER_ERROR)]
fn codes_map_to_statuses(#[case] code: ErrorCode, #[case] status: StatusCode) {
    assert_eq!(ResponseError::status_code(&Error::new(code, "x")), status);
}

#[actix_web::test]
async fn quota_denial_keeps_usage_check_details() {
    let details = json!({
        "usageCheck": { "allowed": false, "current": 5, "limit": 5, "remaining": 0 }
    });
    let error = Error::forbidden("Usage limit exceeded")
        .with_trace_id(TRACE_ID)
        .with_details(details.clone());

    let (status, trace_id, cache_control, body) = render(&error).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(trace_id.as_deref(), Some(TRACE_ID));
    assert_eq!(cache_control.as_deref(), Some("no-store"));
    assert_eq!(body["message"], "Usage limit exceeded");
    assert_eq!(body["details"], details);
}

#[actix_web::test]
async fn internal_errors_hide_message_and_details() {
    let error = Error::internal("receipt repository error: relation missing")
        .with_trace_id(TRACE_ID)
        .with_details(json!({ "sql": "select" }));

    let (status, trace_id, _, body) = render(&error).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(trace_id.as_deref(), Some(TRACE_ID));
    assert_eq!(body["code"], "internal_error");
    assert_eq!(body["message"], INTERNAL_MESSAGE);
    assert!(body.get("details").is_none());
}

#[actix_web::test]
async fn missing_trace_id_omits_header() {
    let (_, trace_id, _, _) = render(&Error::not_found("Receipt not found")).await;
    assert!(trace_id.is_none());
}

#[rstest]
fn client_view_borrows_non_internal_errors() {
    let error = Error::conflict("receipt already settled");
    assert!(matches!(client_view(&error), Cow::Borrowed(_)));
}

#[rstest]
fn oversized_bodies_stay_payload_too_large() {
    let err: Error = error::ErrorPayloadTooLarge("overflow").into();
    assert_eq!(err.code(), ErrorCode::PayloadTooLarge);
}

#[rstest]
fn malformed_bodies_become_invalid_requests() {
    let err: Error = error::ErrorBadRequest("multipart boundary missing").into();
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(err.message(), "multipart boundary missing");
}

#[rstest]
fn server_side_framework_errors_are_redacted() {
    let err: Error = error::ErrorInternalServerError("pool exhausted").into();
    assert_eq!(err.code(), ErrorCode::InternalError);
    assert_eq!(err.message(), INTERNAL_MESSAGE);
    assert!(err.details().is_none());
}
