use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PortalError, Result};

/// The `{success, data, error?, message?}` wrapper most endpoints answer with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T = Value> {
    #[serde(default = "default_success")]
    pub success: bool,
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn default_success() -> bool {
    true
}

impl<T> ApiResponse<T> {
    pub fn into_data(self) -> T {
        self.data
    }
}

impl ApiResponse<Value> {
    pub fn from_value(value: Value) -> Result<Self> {
        decode(value, "response envelope")
    }
}

/// Decodes `value` into `T`, reporting failures as [`PortalError::Decode`].
pub(crate) fn decode<T: DeserializeOwned>(value: Value, what: &str) -> Result<T> {
    serde_json::from_value(value).map_err(|e| PortalError::decode(format!("{}: {}", what, e)))
}

/// Pulls the nested `data` member out of an envelope and decodes it into `T`.
pub(crate) fn decode_data<T: DeserializeOwned>(envelope: Value, what: &str) -> Result<T> {
    match envelope {
        Value::Object(mut map) => match map.remove("data") {
            Some(data) => decode(data, what),
            None => Err(PortalError::decode(format!("{}: missing `data` field", what))),
        },
        other => Err(PortalError::decode(format!(
            "{}: expected a JSON object, got {}",
            what,
            json_kind(&other)
        ))),
    }
}

/// Like [`decode_data`], but an absent or null `data` decodes as `T::default()`.
pub(crate) fn decode_data_or_default<T: DeserializeOwned + Default>(
    envelope: Value,
    what: &str,
) -> Result<T> {
    match envelope {
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Null) | None => Ok(T::default()),
            Some(data) => decode(data, what),
        },
        other => Err(PortalError::decode(format!(
            "{}: expected a JSON object, got {}",
            what,
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
