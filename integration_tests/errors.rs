use crate::helpers::{TIMESTAMP, client_for};

use blacklake::{Client, ClientConfig, PortalError};
use serde_json::json;
use std::net::TcpListener;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn server_answering(body: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/repos/unknown"))
        .respond_with(body)
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn given_unknown_repo_when_fetched_then_not_found() {
    let server = server_answering(
        ResponseTemplate::new(404)
            .set_body_json(json!({"error": "Repository not found", "status": 404})),
    )
    .await;

    let err = client_for(&server)
        .get_repository("unknown")
        .await
        .unwrap_err();

    assert!(matches!(err, PortalError::NotFound { .. }), "got {:?}", err);
    assert_eq!(err.message(), "Resource not found");
    assert_eq!(err.details().unwrap()["error"], json!("Repository not found"));
}

#[tokio::test]
async fn given_401_and_403_when_fetched_then_auth_kinds() {
    let server = server_answering(ResponseTemplate::new(401).set_body_string("denied")).await;
    let err = client_for(&server).get_repository("unknown").await.unwrap_err();
    assert!(matches!(err, PortalError::Authentication { .. }));

    let server = server_answering(ResponseTemplate::new(403)).await;
    let err = client_for(&server).get_repository("unknown").await.unwrap_err();
    assert!(matches!(err, PortalError::Authorization { .. }));
}

#[tokio::test]
async fn given_server_error_with_json_body_when_fetched_then_message_from_error_field() {
    let server = server_answering(
        ResponseTemplate::new(500).set_body_json(json!({"error": "database unavailable"})),
    )
    .await;

    let err = client_for(&server).get_repository("unknown").await.unwrap_err();

    assert!(matches!(err, PortalError::Server { status: 500, .. }));
    assert_eq!(err.message(), "database unavailable");
}

#[tokio::test]
async fn given_conflict_without_json_when_fetched_then_message_is_http_code() {
    let server = server_answering(ResponseTemplate::new(409).set_body_string("conflict")).await;

    let err = client_for(&server).get_repository("unknown").await.unwrap_err();

    assert!(matches!(err, PortalError::Api { status: 409, .. }));
    assert_eq!(err.message(), "HTTP 409");
}

#[tokio::test]
async fn given_rate_limited_when_fetched_then_rate_limit_with_retry_after() {
    let server = server_answering(
        ResponseTemplate::new(429)
            .insert_header("retry-after", "30")
            .set_body_json(json!({"error": "too many requests"})),
    )
    .await;

    let err = client_for(&server).get_repository("unknown").await.unwrap_err();

    assert!(matches!(err, PortalError::RateLimit { .. }));
    assert_eq!(err.details().unwrap()["retry_after"], json!(30));
}

#[tokio::test]
async fn given_success_with_wrong_shape_when_fetched_then_decode_error() {
    let server = server_answering(
        ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": {"id": 5}})),
    )
    .await;

    let err = client_for(&server).get_repository("unknown").await.unwrap_err();

    assert!(matches!(err, PortalError::Decode { .. }));
}

/// **VALUE**: a stalled server fails the call inside the configured timeout instead of
/// hanging, and the failure is classified as a timeout.
#[tokio::test]
async fn given_slow_server_when_fetched_then_timeout_within_bound() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "ok", "timestamp": TIMESTAMP}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;
    let client = Client::new(
        ClientConfig::new(server.uri()).with_timeout(Duration::from_millis(200)),
    )
    .unwrap();

    let started = Instant::now();
    let err = client.health_check().await.unwrap_err();

    assert!(matches!(err, PortalError::Timeout { .. }), "got {:?}", err);
    assert!(err.is_network());
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn given_nothing_listening_when_fetched_then_network_error() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = Client::new(
        ClientConfig::new(format!("http://127.0.0.1:{}", port))
            .with_timeout(Duration::from_secs(2)),
    )
    .unwrap();

    let err = client.list_repositories().await.unwrap_err();

    assert!(err.is_network(), "got {:?}", err);
    assert!(err.status().is_none());
    assert!(!err.message().is_empty());
}
