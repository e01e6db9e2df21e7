use reqwest::StatusCode;
use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::util::is_json_content_type;

/// Structured details attached to an HTTP failure, usually the decoded JSON error body.
pub type ErrorDetails = Map<String, Value>;

pub type Result<T, E = PortalError> = std::result::Result<T, E>;

/// Every way a call against the portal can fail.
///
/// HTTP failures keep the decoded JSON error body (when the server sent an object) in
/// `details`, so callers can inspect fields such as `status` or server-side codes
/// without parsing the display text.
#[derive(Debug, Error)]
pub enum PortalError {
    #[error("{message}")]
    Authentication {
        message: String,
        details: Option<ErrorDetails>,
    },

    #[error("{message}")]
    Authorization {
        message: String,
        details: Option<ErrorDetails>,
    },

    #[error("{message}")]
    NotFound {
        message: String,
        details: Option<ErrorDetails>,
    },

    #[error("Validation failed: {message}")]
    Validation {
        status: u16,
        message: String,
        details: Option<ErrorDetails>,
    },

    #[error("Rate limit exceeded: {message}")]
    RateLimit {
        message: String,
        details: Option<ErrorDetails>,
    },

    #[error("Server error (HTTP {status}): {message}")]
    Server {
        status: u16,
        message: String,
        details: Option<ErrorDetails>,
    },

    #[error("API error: {message}")]
    Api {
        status: u16,
        message: String,
        details: Option<ErrorDetails>,
    },

    #[error("Request failed: {message}")]
    Network { message: String },

    #[error("Request timed out: {message}")]
    Timeout { message: String },

    #[error("Failed to decode response: {message}")]
    Decode { message: String },
}

impl PortalError {
    /// Human-readable message, without the kind prefix used by `Display`.
    pub fn message(&self) -> &str {
        match self {
            Self::Authentication { message, .. }
            | Self::Authorization { message, .. }
            | Self::NotFound { message, .. }
            | Self::Validation { message, .. }
            | Self::RateLimit { message, .. }
            | Self::Server { message, .. }
            | Self::Api { message, .. }
            | Self::Network { message }
            | Self::Timeout { message }
            | Self::Decode { message } => message,
        }
    }

    pub fn details(&self) -> Option<&ErrorDetails> {
        match self {
            Self::Authentication { details, .. }
            | Self::Authorization { details, .. }
            | Self::NotFound { details, .. }
            | Self::Validation { details, .. }
            | Self::RateLimit { details, .. }
            | Self::Server { details, .. }
            | Self::Api { details, .. } => details.as_ref(),
            Self::Network { .. } | Self::Timeout { .. } | Self::Decode { .. } => None,
        }
    }

    /// HTTP status that produced this error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication { .. } => Some(StatusCode::UNAUTHORIZED.as_u16()),
            Self::Authorization { .. } => Some(StatusCode::FORBIDDEN.as_u16()),
            Self::NotFound { .. } => Some(StatusCode::NOT_FOUND.as_u16()),
            Self::RateLimit { .. } => Some(StatusCode::TOO_MANY_REQUESTS.as_u16()),
            Self::Validation { status, .. } | Self::Server { status, .. } | Self::Api { status, .. } => {
                Some(*status)
            }
            Self::Network { .. } | Self::Timeout { .. } | Self::Decode { .. } => None,
        }
    }

    /// True for transport failures, timeouts included.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Timeout { .. })
    }

    /// Hint for callers that run their own retry policy. The client never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::Timeout { .. } | Self::RateLimit { .. } | Self::Server { .. }
        )
    }

    pub(crate) fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for PortalError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            PortalError::Timeout {
                message: error.to_string(),
            }
        } else {
            PortalError::Network {
                message: error.to_string(),
            }
        }
    }
}

/// A response as read off the wire, before classification.
#[derive(Debug, Clone)]
pub(crate) struct RawResponse {
    pub(crate) status: StatusCode,
    pub(crate) content_type: Option<String>,
    pub(crate) retry_after: Option<String>,
    pub(crate) body: String,
}

/// Turns a raw response into the decoded payload, or the error it stands for.
///
/// Status precedence: 401, 403 and 404 win regardless of the body. Any other status
/// from 400 up takes its message from the JSON `error` field, falling back to
/// `HTTP {code}`.
pub(crate) fn classify_response(raw: &RawResponse) -> Result<Value> {
    let status = raw.status;
    let is_json = raw.content_type.as_deref().is_some_and(is_json_content_type);

    if status.as_u16() < 400 {
        if is_json {
            return serde_json::from_str(&raw.body).map_err(|e| {
                PortalError::decode(format!("invalid JSON body (HTTP {}): {}", status.as_u16(), e))
            });
        }
        return Ok(json!({ "data": raw.body }));
    }

    // Error bodies that fail to parse are treated as absent, not as decode failures.
    let body: Option<Value> = if is_json {
        serde_json::from_str(&raw.body).ok()
    } else {
        None
    };
    let details = body.as_ref().and_then(Value::as_object).cloned();

    match status {
        StatusCode::UNAUTHORIZED => {
            return Err(PortalError::Authentication {
                message: "Authentication failed".to_string(),
                details,
            });
        }
        StatusCode::FORBIDDEN => {
            return Err(PortalError::Authorization {
                message: "Access denied".to_string(),
                details,
            });
        }
        StatusCode::NOT_FOUND => {
            return Err(PortalError::NotFound {
                message: "Resource not found".to_string(),
                details,
            });
        }
        _ => {}
    }

    let code = status.as_u16();
    let message = body
        .as_ref()
        .and_then(|b| b.get("error"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", code));

    Err(match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => PortalError::Validation {
            status: code,
            message,
            details,
        },
        StatusCode::TOO_MANY_REQUESTS => {
            let details = match raw.retry_after.as_deref() {
                Some(retry_after) => {
                    let mut details = details.unwrap_or_default();
                    let value = match retry_after.trim().parse::<u64>() {
                        Ok(secs) => Value::from(secs),
                        Err(_) => Value::from(retry_after.trim()),
                    };
                    details.insert("retry_after".to_string(), value);
                    Some(details)
                }
                None => details,
            };
            PortalError::RateLimit { message, details }
        }
        s if s.is_server_error() => PortalError::Server {
            status: code,
            message,
            details,
        },
        _ => PortalError::Api {
            status: code,
            message,
            details,
        },
    })
}
