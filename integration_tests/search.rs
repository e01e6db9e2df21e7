use crate::helpers::client_for;

use blacklake::SearchQuery;
use serde_json::json;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn given_invoice_query_when_searching_then_single_result_and_total() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .and(query_param("q", "invoice"))
        .and(query_param("limit", "10"))
        .and(query_param("offset", "0"))
        .and(query_param_is_missing("repo"))
        .and(query_param_is_missing("classification"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "results": [{"id": "1", "repo_name": "r", "path": "a/b.csv", "name": "b.csv"}],
                "total": 1,
                "limit": 10,
                "offset": 0
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client_for(&server)
        .search(&SearchQuery::new("invoice").limit(10).offset(0))
        .await
        .unwrap();

    let results = response.results().unwrap();
    assert!(response.success());
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "1");
    assert_eq!(results[0].path, "a/b.csv");
    assert_eq!(response.total().unwrap(), 1);
    assert_eq!(response.limit().unwrap(), 10);
    assert!(response.facets().unwrap().is_empty());
}

#[tokio::test]
async fn given_filters_when_searching_then_sent_as_query_params() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .and(query_param("q", "salary report"))
        .and(query_param("repo", "hr"))
        .and(query_param("classification", "confidential"))
        .and(query_param("limit", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "results": [],
                "total": 0,
                "facets": [{"name": "repo", "values": [{"value": "hr", "count": 0}]}]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client_for(&server)
        .search(
            &SearchQuery::new("salary report")
                .repo("hr")
                .classification("confidential"),
        )
        .await
        .unwrap();

    assert!(response.results().unwrap().is_empty());
    assert_eq!(response.offset().unwrap(), 0);
    assert_eq!(response.facets().unwrap()[0].values[0].value, "hr");
}
