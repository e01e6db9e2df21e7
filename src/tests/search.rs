// Unit tests for search query building and the derived views of SearchResponse

use crate::error::PortalError;
use crate::search::{SearchQuery, SearchResponse};
use serde_json::json;

#[test]
fn given_default_query_when_params_built_then_limit_and_offset_defaulted() {
    let params = SearchQuery::new("invoice").to_params();

    assert_eq!(
        params,
        vec![
            ("q".to_string(), "invoice".to_string()),
            ("limit".to_string(), "20".to_string()),
            ("offset".to_string(), "0".to_string()),
        ]
    );
}

#[test]
fn given_filters_when_params_built_then_filters_appended_and_empty_ones_skipped() {
    let params = SearchQuery::new("q1")
        .limit(5)
        .offset(10)
        .repo("finance")
        .classification("")
        .to_params();

    assert_eq!(params.len(), 4);
    assert_eq!(params[3], ("repo".to_string(), "finance".to_string()));
}

#[test]
fn given_full_envelope_when_views_read_then_fields_match() {
    let response: SearchResponse = serde_json::from_value(json!({
        "success": true,
        "data": {
            "results": [
                {
                    "id": "1",
                    "repo_name": "r",
                    "path": "a/b.csv",
                    "name": "b.csv",
                    "score": 3.5,
                    "highlights": {"content": ["<em>invoice</em> 1", "<em>invoice</em> 2"]}
                }
            ],
            "total": 1,
            "limit": 10,
            "offset": 0,
            "facets": [
                {"name": "classification", "values": [{"value": "public", "count": 4}, {"value": 2024, "count": 1}]}
            ]
        }
    }))
    .unwrap();

    let results = response.results().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "1");
    assert_eq!(results[0].score, Some(3.5));
    let snippets = &results[0].highlights.as_ref().unwrap()["content"];
    assert_eq!(snippets, &vec!["<em>invoice</em> 1".to_string(), "<em>invoice</em> 2".to_string()]);
    assert_eq!(response.total().unwrap(), 1);
    assert_eq!(response.limit().unwrap(), 10);
    assert_eq!(response.offset().unwrap(), 0);

    let facets = response.facets().unwrap();
    assert_eq!(facets[0].name, "classification");
    assert_eq!(facets[0].values[1].value, "2024");
    assert_eq!(facets[0].values[1].count, 1);
}

#[test]
fn given_empty_envelope_when_views_read_then_defaults_returned() {
    let response = SearchResponse::new(true, json!({}));

    assert!(response.results().unwrap().is_empty());
    assert!(response.facets().unwrap().is_empty());
    assert_eq!(response.total().unwrap(), 0);
    assert_eq!(response.limit().unwrap(), 20);
    assert_eq!(response.offset().unwrap(), 0);
}

/// **VALUE**: views are computed from the envelope each time, so two responses built
/// from different envelopes never share a stale view.
#[test]
fn given_changed_envelope_when_views_read_then_views_follow_envelope() {
    let mut data = json!({"total": 3, "results": []});
    let before = SearchResponse::new(true, data.clone());

    data["total"] = json!(7);
    data["results"] = json!([{"id": "9", "repo_name": "r", "path": "p", "name": "n"}]);
    let after = SearchResponse::new(true, data);

    assert_eq!(before.total().unwrap(), 3);
    assert!(before.results().unwrap().is_empty());
    assert_eq!(after.total().unwrap(), 7);
    assert_eq!(after.results().unwrap()[0].id, "9");
    assert_eq!(after.total().unwrap(), after.data()["total"].as_u64().unwrap());
}

#[test]
fn given_malformed_result_when_views_read_then_decode_error() {
    let response = SearchResponse::new(true, json!({"results": [{"id": 1}]}));

    let err = response.results().unwrap_err();

    assert!(matches!(err, PortalError::Decode { .. }));
}

/// **VALUE**: a count the server sends as `1.0` or `"1"` must not read as the
/// default and hide a real total.
#[test]
fn given_non_integer_counts_when_views_read_then_decode_error() {
    let float_total = SearchResponse::new(true, json!({"total": 1.0}));
    let string_limit = SearchResponse::new(true, json!({"limit": "1"}));
    let negative_offset = SearchResponse::new(true, json!({"offset": -1}));
    let null_total = SearchResponse::new(true, json!({"total": null}));

    assert!(matches!(float_total.total(), Err(PortalError::Decode { .. })));
    assert!(matches!(string_limit.limit(), Err(PortalError::Decode { .. })));
    assert!(matches!(negative_offset.offset(), Err(PortalError::Decode { .. })));
    assert_eq!(null_total.total().unwrap(), 0);
}
