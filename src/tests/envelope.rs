use crate::envelope::{ApiResponse, decode_data, decode_data_or_default};
use crate::error::PortalError;
use serde_json::json;

#[test]
fn given_envelope_when_decoded_then_all_members_read() {
    let envelope = ApiResponse::from_value(json!({
        "success": false,
        "data": null,
        "error": "boom",
        "message": "try later"
    }))
    .unwrap();

    assert!(!envelope.success);
    assert_eq!(envelope.error.as_deref(), Some("boom"));
    assert_eq!(envelope.message.as_deref(), Some("try later"));
    assert!(envelope.into_data().is_null());
}

#[test]
fn given_nested_data_when_extracted_then_inner_value_decoded() {
    let names: Vec<String> = decode_data(json!({"success": true, "data": ["a", "b"]}), "names").unwrap();

    assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn given_missing_data_when_extracted_then_decode_error_names_target() {
    let err = decode_data::<Vec<String>>(json!({"success": true}), "repository list").unwrap_err();

    assert!(matches!(err, PortalError::Decode { .. }));
    assert!(err.message().contains("repository list"));
}

#[test]
fn given_missing_data_when_extracted_with_default_then_empty() {
    let names: Vec<String> = decode_data_or_default(json!({"success": true}), "names").unwrap();
    assert!(names.is_empty());

    let names: Vec<String> = decode_data_or_default(json!({"data": null}), "names").unwrap();
    assert!(names.is_empty());

    assert!(decode_data_or_default::<Vec<String>>(json!([1]), "names").is_err());
}
