use crate::helpers::{TIMESTAMP, client_for, client_with_key, export_json, repository_json};

use blacklake::header::{HeaderName, HeaderValue};
use blacklake::{
    ApiRequest, DEFAULT_EXPORT_FORMAT, DEFAULT_REF, EntryKind, ExportState, ExportWait, Metadata,
    PortalError,
};
use serde_json::{Value, json};
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn given_repos_endpoint_when_listing_then_models_match_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/repos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [repository_json("finance"), repository_json("hr")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let repos = client_for(&server).list_repositories().await.unwrap();

    assert_eq!(repos.len(), 2);
    assert_eq!(repos[0].id, "id-finance");
    assert_eq!(repos[0].description.as_deref(), Some("quarterly ledgers"));
    assert_eq!(repos[1].tenant_id.as_deref(), Some("t-1"));
    assert_eq!(repos[1].created_at.to_rfc3339(), "2024-03-01T10:00:00+00:00");
}

#[tokio::test]
async fn given_envelope_without_data_when_listing_then_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/repos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(&server)
        .await;

    let repos = client_for(&server).list_repositories().await.unwrap();

    assert!(repos.is_empty());
}

#[tokio::test]
async fn given_new_repo_when_creating_then_body_sent_and_repo_returned() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/repos"))
        .and(body_json(json!({"name": "finance", "description": "ledgers"})))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"success": true, "data": repository_json("finance")})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let repo = client_for(&server)
        .create_repository("finance", Some("ledgers"))
        .await
        .unwrap();

    assert_eq!(repo.name, "finance");
}

#[tokio::test]
async fn given_no_description_when_creating_then_field_omitted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/repos"))
        .and(body_json(json!({"name": "finance"})))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"success": true, "data": repository_json("finance")})),
        )
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .create_repository("finance", None)
        .await
        .unwrap();
}

#[tokio::test]
async fn given_tree_with_subpath_when_fetched_then_path_query_sent_and_order_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/repos/finance/tree/main"))
        .and(query_param("path", "reports"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [
                {"path": "reports/q2", "name": "q2", "type": "directory"},
                {"path": "reports/q1.csv", "name": "q1.csv", "type": "file", "size": 2048, "modified_at": TIMESTAMP}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tree = client_for(&server)
        .get_repository_tree("finance", DEFAULT_REF, Some("reports"))
        .await
        .unwrap();

    assert!(tree.success);
    assert_eq!(tree.data[0].kind, EntryKind::Directory);
    assert_eq!(tree.data[1].name, "q1.csv");
    assert_eq!(tree.data[1].size, Some(2048));
}

#[tokio::test]
async fn given_suggest_endpoint_when_queried_then_strings_returned() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/search/suggest"))
        .and(query_param("q", "inv"))
        .and(query_param("count", "10"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "data": ["invoice", "inventory"]})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let suggestions = client_for(&server)
        .search_suggestions("inv", None)
        .await
        .unwrap();

    assert_eq!(suggestions, vec!["invoice".to_string(), "inventory".to_string()]);
}

#[tokio::test]
async fn given_metadata_when_fetched_and_updated_then_round_trips() {
    let server = MockServer::start().await;
    let stored = json!({"owner": "ops", "tags": ["q1"]});
    Mock::given(method("GET"))
        .and(path("/v1/repos/finance/metadata/main/reports/q1.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": stored})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/repos/finance/metadata/main/reports/q1.csv"))
        .and(body_json(json!({"owner": "finance"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "data": {"owner": "finance", "tags": ["q1"]}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let metadata = client
        .get_file_metadata("finance", "main", "reports/q1.csv")
        .await
        .unwrap();
    assert_eq!(Value::Object(metadata), stored);

    let mut update = Metadata::new();
    update.insert("owner".to_string(), json!("finance"));
    let updated = client
        .update_file_metadata("finance", "main", "/reports/q1.csv", &update)
        .await
        .unwrap();
    assert_eq!(updated["owner"], json!("finance"));
}

/// **VALUE**: a `#` or `?` in a file name must stay part of the path instead of
/// becoming a fragment or query string.
#[tokio::test]
async fn given_reserved_characters_in_file_path_when_fetching_metadata_then_path_encoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/repos/r/metadata/main/reports/q%231.csv"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": {"n": 1}})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/repos/r/metadata/main/reports/a%3Fb.csv"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": {"n": 2}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let hash = client
        .get_file_metadata("r", "main", "reports/q#1.csv")
        .await
        .unwrap();
    let question = client
        .get_file_metadata("r", "main", "reports/a?b.csv")
        .await
        .unwrap();
    assert_eq!(hash["n"], json!(1));
    assert_eq!(question["n"], json!(2));

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 2);
    assert!(received.iter().all(|r| r.url.query().is_none() && r.url.fragment().is_none()));
}

#[tokio::test]
async fn given_slash_in_repository_name_when_fetching_then_kept_in_one_segment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/repos/team%2Ffinance"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "data": repository_json("team/finance")})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let repo = client_for(&server)
        .get_repository("team/finance")
        .await
        .unwrap();
    assert_eq!(repo.name, "team/finance");
}

/// **VALUE**: the upload protocol threads the id from initiate into commit; the client
/// only forwards what the caller hands it.
#[tokio::test]
async fn given_upload_flow_when_initiated_and_committed_then_payloads_match() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/repos/finance/upload/init"))
        .and(body_json(json!({"path": "q1.csv", "size": 2048, "content_type": "text/csv"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"upload_id": "u-1", "presigned_url": "https://s3.example.com/put?sig=x", "expires_at": TIMESTAMP}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/repos/finance/commit"))
        .and(body_json(json!({"upload_id": "u-1", "message": "add q1", "metadata": {"owner": "ops"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"commit_id": "c-1", "message": "add q1", "created_at": TIMESTAMP, "files_count": 1}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let upload = client
        .initiate_upload("finance", "q1.csv", 2048, "text/csv")
        .await
        .unwrap();
    assert_eq!(upload.presigned_url, "https://s3.example.com/put?sig=x");

    let mut metadata = Metadata::new();
    metadata.insert("owner".to_string(), json!("ops"));
    let commit = client
        .commit_upload("finance", &upload.upload_id, "add q1", Some(&metadata))
        .await
        .unwrap();

    assert_eq!(commit.commit_id, "c-1");
    assert_eq!(commit.files_count, 1);
}

#[tokio::test]
async fn given_export_when_started_and_polled_then_status_read() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/repos/finance/export"))
        .and(query_param("ref", "main"))
        .and(query_param("format", "zip"))
        .respond_with(
            ResponseTemplate::new(202)
                .set_body_json(json!({"success": true, "data": export_json("e-1", "pending")})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/exports/e-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "data": export_json("e-1", "completed")})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let export = client
        .export_repository("finance", DEFAULT_REF, DEFAULT_EXPORT_FORMAT)
        .await
        .unwrap();
    assert_eq!(export.state(), ExportState::Pending);

    let status = client.get_export_status("e-1").await.unwrap();
    assert_eq!(status.state(), ExportState::Completed);
    assert_eq!(status.download_url.as_deref(), Some("https://dl.example.com/e.zip"));
}

#[tokio::test]
async fn given_export_in_progress_when_waiting_then_returns_once_finished() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/exports/e-2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "data": export_json("e-2", "processing")})),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/exports/e-2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "data": export_json("e-2", "completed")})),
        )
        .mount(&server)
        .await;

    let wait = ExportWait {
        poll_interval: Duration::from_millis(10),
        max_interval: Duration::from_millis(20),
        deadline: Some(Duration::from_secs(5)),
        progress: false,
    };
    let export = client_for(&server).wait_for_export("e-2", &wait).await.unwrap();

    assert!(export.is_finished());
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn given_export_never_finishing_when_waiting_then_timeout_after_deadline() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/exports/e-3"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "data": export_json("e-3", "pending")})),
        )
        .mount(&server)
        .await;

    let wait = ExportWait {
        poll_interval: Duration::from_millis(10),
        max_interval: Duration::from_millis(20),
        deadline: Some(Duration::from_millis(100)),
        progress: false,
    };
    let err = client_for(&server)
        .wait_for_export("e-3", &wait)
        .await
        .unwrap_err();

    assert!(matches!(err, PortalError::Timeout { .. }));
}

#[tokio::test]
async fn given_health_endpoint_when_checked_then_whole_body_decoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "alive",
            "timestamp": TIMESTAMP,
            "version": "1.4.0",
            "uptime": 12.5
        })))
        .mount(&server)
        .await;

    let health = client_for(&server).health_check().await.unwrap();

    assert_eq!(health.status, "alive");
    assert_eq!(health.uptime, Some(12.5));
}

/// **VALUE**: the configured key reaches the wire as a bearer token, alongside the
/// JSON content type and SDK user agent.
#[tokio::test]
async fn given_api_key_when_calling_then_default_headers_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .and(header("authorization", "Bearer k-123"))
        .and(header("content-type", "application/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "ok", "timestamp": TIMESTAMP})),
        )
        .expect(1)
        .mount(&server)
        .await;

    client_with_key(&server, "k-123").health_check().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let agent = requests[0].headers.get("user-agent").unwrap().to_str().unwrap();
    assert!(agent.starts_with("blacklake-sdk-rust/"));
}

#[tokio::test]
async fn given_no_api_key_when_calling_then_no_authorization_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "ok", "timestamp": TIMESTAMP})),
        )
        .mount(&server)
        .await;

    client_for(&server).health_check().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn given_call_specific_header_when_executing_then_it_overrides_default() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/custom"))
        .and(header("authorization", "Bearer override"))
        .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
        .expect(1)
        .mount(&server)
        .await;

    let request = ApiRequest::get("/v1/custom").header(
        HeaderName::from_static("authorization"),
        HeaderValue::from_static("Bearer override"),
    );
    let value = client_with_key(&server, "k-123")
        .execute(request)
        .await
        .unwrap();

    assert_eq!(value, json!({"data": "pong"}));
}

#[tokio::test]
async fn given_one_client_when_called_concurrently_then_each_call_independent() {
    let server = MockServer::start().await;
    for name in ["a", "b", "c"] {
        Mock::given(method("GET"))
            .and(path(format!("/v1/repos/{}", name)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": true, "data": repository_json(name)})),
            )
            .mount(&server)
            .await;
    }

    let client = client_for(&server);
    let (a, b, c) = tokio::join!(
        client.get_repository("a"),
        client.get_repository("b"),
        client.get_repository("c"),
    );

    assert_eq!(a.unwrap().name, "a");
    assert_eq!(b.unwrap().name, "b");
    assert_eq!(c.unwrap().name, "c");
}

/// **VALUE**: `close` ends one handle only; clones keep the shared pool usable.
#[tokio::test]
async fn given_cloned_client_when_original_closed_then_clone_still_works() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": "ok", "timestamp": TIMESTAMP})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let original = client_for(&server);
    let clone = original.clone();
    original.close();

    let health = clone.health_check().await.unwrap();
    assert_eq!(health.status, "ok");
}
