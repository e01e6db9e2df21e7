use crate::request::{ApiRequest, merge_headers};
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};

#[test]
fn given_conflicting_headers_when_merged_then_call_specific_wins() {
    let mut defaults = HeaderMap::new();
    defaults.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    defaults.insert(USER_AGENT, HeaderValue::from_static("blacklake-sdk-rust/0.1.0"));
    defaults.insert(AUTHORIZATION, HeaderValue::from_static("Bearer a"));

    let mut overrides = HeaderMap::new();
    overrides.insert(AUTHORIZATION, HeaderValue::from_static("Bearer b"));
    overrides.insert("x-request-id", HeaderValue::from_static("42"));

    let merged = merge_headers(&defaults, &overrides);

    assert_eq!(merged.get(AUTHORIZATION).unwrap(), "Bearer b");
    assert_eq!(merged.get_all(AUTHORIZATION).iter().count(), 1);
    assert_eq!(merged.get(CONTENT_TYPE).unwrap(), "application/json");
    assert_eq!(merged.get("x-request-id").unwrap(), "42");
    assert_eq!(merged.len(), 4);
}

#[test]
fn given_builder_calls_when_request_built_then_parts_recorded() {
    let request = ApiRequest::post("/v1/repos/r/export")
        .query("ref", "main")
        .query_opt("path", None)
        .query_opt("empty", Some(""))
        .query("limit", 10);

    assert_eq!(request.method, Method::POST);
    assert_eq!(request.endpoint, "/v1/repos/r/export");
    assert_eq!(
        request.query,
        vec![
            ("ref".to_string(), "main".to_string()),
            ("limit".to_string(), "10".to_string()),
        ]
    );
    assert!(request.body.is_none());
}
