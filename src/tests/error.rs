// Unit tests for response classification
// Covers status precedence, message extraction and success decoding

use crate::error::{PortalError, RawResponse, classify_response};
use reqwest::StatusCode;
use serde_json::json;

fn raw(status: u16, content_type: Option<&str>, body: &str) -> RawResponse {
    RawResponse {
        status: StatusCode::from_u16(status).unwrap(),
        content_type: content_type.map(str::to_string),
        retry_after: None,
        body: body.to_string(),
    }
}

const JSON: Option<&str> = Some("application/json");

/// **VALUE**: 401/403/404 always map to their dedicated kinds, whatever the body says.
///
/// **BUG THIS CATCHES**: a server `error` field leaking into the kind decision, turning
/// a 404 into a generic API error that callers cannot discriminate.
#[test]
fn given_auth_and_not_found_statuses_when_classified_then_body_is_ignored_for_kind() {
    let body = r#"{"error":"something else entirely"}"#;

    let err = classify_response(&raw(401, JSON, body)).unwrap_err();
    assert!(matches!(err, PortalError::Authentication { .. }));
    assert_eq!(err.message(), "Authentication failed");

    let err = classify_response(&raw(403, None, "nope")).unwrap_err();
    assert!(matches!(err, PortalError::Authorization { .. }));
    assert_eq!(err.message(), "Access denied");

    let err = classify_response(&raw(404, JSON, "not json at all")).unwrap_err();
    assert!(matches!(err, PortalError::NotFound { .. }));
    assert_eq!(err.message(), "Resource not found");
    assert!(err.details().is_none());
}

#[test]
fn given_not_found_with_json_body_when_classified_then_body_kept_as_details() {
    let err = classify_response(&raw(404, JSON, r#"{"error":"repo missing","status":404}"#))
        .unwrap_err();

    let details = err.details().expect("details");
    assert_eq!(details.get("error"), Some(&json!("repo missing")));
    assert_eq!(err.status(), Some(404));
}

#[test]
fn given_json_error_field_when_classified_then_message_equals_field() {
    let err = classify_response(&raw(409, JSON, r#"{"error":"already exists"}"#)).unwrap_err();

    assert!(matches!(err, PortalError::Api { status: 409, .. }));
    assert_eq!(err.message(), "already exists");
    assert_eq!(err.to_string(), "API error: already exists");
}

#[test]
fn given_no_json_error_field_when_classified_then_message_is_http_code() {
    let err = classify_response(&raw(418, Some("text/plain"), r#"{"error":"x"}"#)).unwrap_err();
    assert_eq!(err.message(), "HTTP 418");

    let err = classify_response(&raw(409, JSON, r#"{"detail":"x"}"#)).unwrap_err();
    assert_eq!(err.message(), "HTTP 409");

    let err = classify_response(&raw(409, JSON, "<html>")).unwrap_err();
    assert_eq!(err.message(), "HTTP 409");
}

#[test]
fn given_status_families_when_classified_then_mapped_to_matching_kinds() {
    let err = classify_response(&raw(400, JSON, r#"{"error":"bad name"}"#)).unwrap_err();
    assert!(matches!(err, PortalError::Validation { status: 400, .. }));
    assert_eq!(err.message(), "bad name");

    let err = classify_response(&raw(422, None, "")).unwrap_err();
    assert!(matches!(err, PortalError::Validation { status: 422, .. }));

    let err = classify_response(&raw(429, None, "")).unwrap_err();
    assert!(matches!(err, PortalError::RateLimit { .. }));
    assert_eq!(err.message(), "HTTP 429");

    let err = classify_response(&raw(503, JSON, r#"{"error":"index down"}"#)).unwrap_err();
    assert!(matches!(err, PortalError::Server { status: 503, .. }));
    assert_eq!(err.message(), "index down");
    assert!(err.is_retryable());
    assert!(!err.is_network());
}

#[test]
fn given_rate_limit_with_retry_after_when_classified_then_details_carry_it() {
    let mut response = raw(429, JSON, r#"{"error":"slow down"}"#);
    response.retry_after = Some("12".to_string());

    let err = classify_response(&response).unwrap_err();
    let details = err.details().expect("details");
    assert_eq!(details.get("retry_after"), Some(&json!(12)));
    assert_eq!(details.get("error"), Some(&json!("slow down")));
}

#[test]
fn given_json_success_when_classified_then_body_parsed() {
    let value = classify_response(&raw(
        200,
        Some("application/json; charset=utf-8"),
        r#"{"success":true,"data":[1,2]}"#,
    ))
    .unwrap();

    assert_eq!(value, json!({"success": true, "data": [1, 2]}));
}

/// **VALUE**: non-JSON success bodies come back wrapped, never dropped.
#[test]
fn given_text_success_when_classified_then_wrapped_in_data() {
    let value = classify_response(&raw(200, Some("text/plain"), "OK")).unwrap();
    assert_eq!(value, json!({"data": "OK"}));

    let value = classify_response(&raw(204, None, "")).unwrap();
    assert_eq!(value, json!({"data": ""}));
}

#[test]
fn given_broken_json_success_when_classified_then_decode_error() {
    let err = classify_response(&raw(200, JSON, "{not json")).unwrap_err();
    assert!(matches!(err, PortalError::Decode { .. }));
    assert!(err.status().is_none());
}

#[test]
fn given_network_kinds_when_inspected_then_flags_match() {
    let timeout = PortalError::Timeout {
        message: "operation timed out".to_string(),
    };
    let network = PortalError::Network {
        message: "connection refused".to_string(),
    };

    assert!(timeout.is_network());
    assert!(network.is_network());
    assert_eq!(network.to_string(), "Request failed: connection refused");
    assert_eq!(timeout.to_string(), "Request timed out: operation timed out");
}
