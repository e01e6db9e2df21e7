use crate::helpers::{TIMESTAMP, repository_json};

use blacklake::{BlockingClient, ClientConfig, PortalError, SearchQuery};
use serde_json::json;
use std::time::Duration;
use tokio::runtime::Runtime;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// The mock server lives on its own runtime so the blocking client can be driven
// from a plain test thread.
fn start_server(rt: &Runtime, mocks: Vec<Mock>) -> MockServer {
    rt.block_on(async {
        let server = MockServer::start().await;
        for mock in mocks {
            mock.mount(&server).await;
        }
        server
    })
}

fn blocking_client(server: &MockServer, key: Option<&str>) -> BlockingClient {
    let mut config = ClientConfig::new(server.uri()).with_timeout(Duration::from_secs(5));
    if let Some(key) = key {
        config = config.with_api_key(key);
    }
    BlockingClient::new(config).expect("blocking client builds")
}

#[test]
fn given_blocking_client_when_calling_operations_then_results_match_async_ones() {
    let rt = Runtime::new().unwrap();
    let server = start_server(
        &rt,
        vec![
            Mock::given(method("GET"))
                .and(path("/v1/repos/finance"))
                .and(header("authorization", "Bearer sync-key"))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_json(json!({"success": true, "data": repository_json("finance")})),
                ),
            Mock::given(method("GET"))
                .and(path("/v1/search"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "success": true,
                    "data": {"results": [], "total": 0}
                }))),
            Mock::given(method("GET"))
                .and(path("/health"))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_json(json!({"status": "ok", "timestamp": TIMESTAMP})),
                ),
        ],
    );

    let client = blocking_client(&server, Some("sync-key"));

    let repo = client.get_repository("finance").unwrap();
    assert_eq!(repo.name, "finance");

    let search = client.search(&SearchQuery::new("x")).unwrap();
    assert_eq!(search.total().unwrap(), 0);

    let health = client.health_check().unwrap();
    assert_eq!(health.status, "ok");

    client.close();
}

#[test]
fn given_blocking_client_when_server_rejects_then_same_error_kinds() {
    let rt = Runtime::new().unwrap();
    let server = start_server(
        &rt,
        vec![
            Mock::given(method("GET"))
                .and(path("/v1/repos/missing"))
                .respond_with(ResponseTemplate::new(404)),
        ],
    );

    let client = blocking_client(&server, None);

    let err = client.get_repository("missing").unwrap_err();
    assert!(matches!(err, PortalError::NotFound { .. }));
}

/// **VALUE**: every wrapper owns its own runtime, so two wrappers can be used and
/// dropped independently.
#[test]
fn given_two_blocking_clients_when_one_closed_then_other_still_works() {
    let rt = Runtime::new().unwrap();
    let server = start_server(
        &rt,
        vec![
            Mock::given(method("GET"))
                .and(path("/v1/repos"))
                .respond_with(
                    ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": []})),
                ),
        ],
    );

    let first = blocking_client(&server, None);
    let second = blocking_client(&server, None);

    assert!(first.list_repositories().unwrap().is_empty());
    first.close();
    assert!(second.list_repositories().unwrap().is_empty());
}
