use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Free-form file metadata as stored by the portal.
pub type Metadata = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    #[serde(alias = "dir")]
    Directory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub classification: Option<String>,
}

impl TreeEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Directory listing in the order the server returned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeResponse {
    pub success: bool,
    pub data: Vec<TreeEntry>,
}

/// Returned by upload initiation. The presigned URL is handed back untouched;
/// the bytes go there out of band before the commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadInitResponse {
    pub upload_id: String,
    pub presigned_url: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitResponse {
    pub commit_id: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub files_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportState {
    Pending,
    Processing,
    Completed,
    Failed,
    Unknown,
}

impl ExportState {
    pub fn parse(status: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "pending" | "queued" => ExportState::Pending,
            "processing" | "running" => ExportState::Processing,
            "completed" => ExportState::Completed,
            "failed" => ExportState::Failed,
            _ => ExportState::Unknown,
        }
    }

    pub fn is_finished(self) -> bool {
        matches!(self, ExportState::Completed | ExportState::Failed)
    }
}

impl fmt::Display for ExportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportState::Pending => write!(f, "pending"),
            ExportState::Processing => write!(f, "processing"),
            ExportState::Completed => write!(f, "completed"),
            ExportState::Failed => write!(f, "failed"),
            ExportState::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportResponse {
    pub export_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub download_url: Option<String>,
}

impl ExportResponse {
    pub fn state(&self) -> ExportState {
        ExportState::parse(&self.status)
    }

    pub fn is_finished(&self) -> bool {
        self.state().is_finished()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub version: Option<String>,
    /// Seconds since the server started.
    #[serde(default)]
    pub uptime: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyEffect {
    Allow,
    Deny,
}

/// Access policy attached to a tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub effect: PolicyEffect,
    pub actions: Vec<String>,
    /// Resource patterns the policy applies to.
    pub resources: Vec<String>,
    #[serde(default)]
    pub condition: Option<Map<String, Value>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectAttribute {
    pub subject: String,
    pub key: String,
    pub value: String,
    pub created_at: DateTime<Utc>,
}
