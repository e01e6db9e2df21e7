use crate::util::{
    encode_path, encode_segment, endpoint_url, is_json_content_type, next_poll_interval, non_empty,
};
use std::time::Duration;

#[test]
fn given_base_and_endpoint_when_joined_then_single_slash() {
    assert_eq!(endpoint_url("http://h:8080/", "/v1/repos"), "http://h:8080/v1/repos");
    assert_eq!(endpoint_url("http://h:8080", "health"), "http://h:8080/health");
    assert_eq!(endpoint_url("http://h/api/", "v1/search"), "http://h/api/v1/search");
}

#[test]
fn given_content_types_when_checked_then_only_json_matches() {
    assert!(is_json_content_type("application/json"));
    assert!(is_json_content_type("Application/JSON; charset=utf-8"));
    assert!(!is_json_content_type("text/html"));
    assert!(!is_json_content_type("application/xml"));
}

#[test]
fn given_poll_interval_when_advanced_then_grows_and_caps() {
    let max = Duration::from_secs(4);
    let a = next_poll_interval(Duration::from_millis(10), max);
    assert_eq!(a, Duration::from_secs(1));
    let b = next_poll_interval(a, max);
    assert_eq!(b, Duration::from_millis(1500));
    assert_eq!(next_poll_interval(Duration::from_secs(3), max), max);
    assert_eq!(next_poll_interval(Duration::MAX, max), max);
}

/// **VALUE**: `#` and `?` inside a name would otherwise end the path and turn the
/// rest into a fragment or query string.
#[test]
fn given_reserved_characters_when_segment_encoded_then_escaped() {
    assert_eq!(encode_segment("q#1.csv"), "q%231.csv");
    assert_eq!(encode_segment("a?b.csv"), "a%3Fb.csv");
    assert_eq!(encode_segment("feature/x"), "feature%2Fx");
    assert_eq!(encode_segment("50% off"), "50%25%20off");
    assert_eq!(encode_segment("données"), "donn%C3%A9es");
    assert_eq!(encode_segment("v1.2-rc_3~"), "v1.2-rc_3~");
}

#[test]
fn given_file_path_when_encoded_then_separators_kept() {
    assert_eq!(encode_path("reports/q#1.csv"), "reports/q%231.csv");
    assert_eq!(encode_path("/data/a.csv/"), "data/a.csv");
    assert_eq!(encode_path("data//a b.csv"), "data/a%20b.csv");
}

#[test]
fn given_options_when_normalized_then_blank_dropped() {
    assert_eq!(non_empty(Some("  ")), None);
    assert_eq!(non_empty(Some("x")), Some("x"));
}
