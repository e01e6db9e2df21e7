use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::envelope::decode;
use crate::error::{PortalError, Result};

pub const DEFAULT_SEARCH_LIMIT: u32 = 20;
pub const DEFAULT_SUGGESTION_COUNT: u32 = 10;

/// Parameters for a full-text search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub query: String,
    pub limit: u32,
    pub offset: u32,
    pub repo: Option<String>,
    pub classification: Option<String>,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: DEFAULT_SEARCH_LIMIT,
            offset: 0,
            repo: None,
            classification: None,
        }
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    pub fn repo(mut self, repo: impl Into<String>) -> Self {
        self.repo = Some(repo.into());
        self
    }

    pub fn classification(mut self, classification: impl Into<String>) -> Self {
        self.classification = Some(classification.into());
        self
    }

    /// Query-string pairs in a stable order. Empty filters are left out.
    pub(crate) fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("q".to_string(), self.query.clone()),
            ("limit".to_string(), self.limit.to_string()),
            ("offset".to_string(), self.offset.to_string()),
        ];
        if let Some(repo) = self.repo.as_deref().filter(|r| !r.is_empty()) {
            params.push(("repo".to_string(), repo.to_string()));
        }
        if let Some(class) = self.classification.as_deref().filter(|c| !c.is_empty()) {
            params.push(("classification".to_string(), class.to_string()));
        }
        params
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub repo_name: String,
    pub path: String,
    pub name: String,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub classification: Option<String>,
    /// Relevance score assigned by the search backend.
    #[serde(default)]
    pub score: Option<f64>,
    /// Field name to highlighted snippets, snippets in server order.
    #[serde(default)]
    pub highlights: Option<BTreeMap<String, Vec<String>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetValue {
    #[serde(deserialize_with = "string_or_number")]
    pub value: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchFacet {
    pub name: String,
    pub values: Vec<FacetValue>,
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "facet value must be a string or number, got {}",
            other
        ))),
    }
}

/// Search envelope. The views below are recomputed from `data` on every call,
/// so they always agree with the envelope the response was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    success: bool,
    data: Value,
}

impl SearchResponse {
    pub fn new(success: bool, data: Value) -> Self {
        Self { success, data }
    }

    pub fn success(&self) -> bool {
        self.success
    }

    /// The raw `data` member as returned by the server.
    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn results(&self) -> Result<Vec<SearchResult>> {
        match self.data.get("results") {
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(results) => decode(results.clone(), "search results"),
        }
    }

    /// Total hit count; `0` when the server omits it.
    pub fn total(&self) -> Result<u64> {
        self.u64_field("total", 0)
    }

    pub fn limit(&self) -> Result<u64> {
        self.u64_field("limit", u64::from(DEFAULT_SEARCH_LIMIT))
    }

    pub fn offset(&self) -> Result<u64> {
        self.u64_field("offset", 0)
    }

    pub fn facets(&self) -> Result<Vec<SearchFacet>> {
        match self.data.get("facets") {
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(facets) => decode(facets.clone(), "search facets"),
        }
    }

    // Absent or null falls back to `default`; `1.0`, `"1"` or a negative count
    // is a decode error rather than a silent default.
    fn u64_field(&self, key: &str, default: u64) -> Result<u64> {
        match self.data.get(key) {
            Some(Value::Null) | None => Ok(default),
            Some(value) => value.as_u64().ok_or_else(|| {
                PortalError::decode(format!(
                    "search `{}` must be a non-negative integer, got {}",
                    key, value
                ))
            }),
        }
    }
}
