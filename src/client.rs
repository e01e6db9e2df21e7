use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client as HttpClient;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, RETRY_AFTER, USER_AGENT};
use serde_json::{Map, Value, json};
use std::time::{Duration, Instant};

use crate::config::ClientConfig;
use crate::envelope::{decode, decode_data, decode_data_or_default};
use crate::error::{PortalError, RawResponse, Result, classify_response};
use crate::models::{
    CommitResponse, ExportResponse, HealthResponse, Metadata, Repository, TreeResponse,
    UploadInitResponse,
};
use crate::request::{ApiRequest, merge_headers};
use crate::search::{DEFAULT_SUGGESTION_COUNT, SearchQuery, SearchResponse};
use crate::util::{encode_path, encode_segment, endpoint_url, next_poll_interval, non_empty};

pub const DEFAULT_REF: &str = "main";
pub const DEFAULT_EXPORT_FORMAT: &str = "zip";

const SDK_NAME: &str = "blacklake-sdk-rust";

/// Async client for the portal API.
///
/// Cloning is cheap and clones share one connection pool, so a single client can
/// serve concurrent calls from many tasks.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    timeout: Duration,
    default_headers: HeaderMap,
    http: HttpClient,
}

/// How [`Client::wait_for_export`] polls.
#[derive(Debug, Clone)]
pub struct ExportWait {
    /// Delay before the second poll; grows by half each round.
    pub poll_interval: Duration,
    pub max_interval: Duration,
    /// Give up after this long. `None` waits until the export finishes.
    pub deadline: Option<Duration>,
    /// Show a spinner with the current export status on stderr.
    pub progress: bool,
}

impl Default for ExportWait {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(30),
            deadline: None,
            progress: false,
        }
    }
}

impl Client {
    /// Creates a client using environment variables and/or `.blacklakerc`.
    ///
    /// This is equivalent to `Client::new(ClientConfig::load(None, None, None)?)`.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::new(ClientConfig::load(None, None, None)?)
    }

    pub fn new(config: ClientConfig) -> anyhow::Result<Self> {
        let default_headers = default_headers(&config)?;

        let mut builder = HttpClient::builder().timeout(config.timeout);
        if !config.verify_tls {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder.build().context("failed to build HTTP client")?;

        log::debug!(
            "portal client ready: base_url={} timeout={:?} verify_tls={}",
            config.base_url,
            config.timeout,
            config.verify_tls
        );

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
            default_headers,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Releases the connection pool held by this handle.
    ///
    /// Dropping the client has the same effect; this just makes the end of its
    /// lifetime explicit at the call site. Clones share one pool, so it is only
    /// released once the last clone is closed or dropped.
    pub fn close(self) {
        log::debug!("closing portal client for {}", self.base_url);
        drop(self);
    }

    /// Sends one request and returns the decoded payload.
    ///
    /// JSON responses are parsed as-is; any other success body comes back as
    /// `{"data": "<text>"}`. Failures are classified into [`PortalError`].
    pub async fn execute(&self, request: ApiRequest) -> Result<Value> {
        let url = endpoint_url(&self.base_url, &request.endpoint);
        let headers = merge_headers(&self.default_headers, &request.headers);

        log::debug!("{} {}", request.method, url);

        let mut builder = self.http.request(request.method.clone(), &url).headers(headers);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            let err = PortalError::from(e);
            log::warn!("{} {} failed: {}", request.method, url, err);
            err
        })?;

        let status = response.status();
        let content_type = header_string(response.headers(), CONTENT_TYPE);
        let retry_after = header_string(response.headers(), RETRY_AFTER);
        let body = response.text().await.map_err(PortalError::from)?;

        log::debug!("{} {} -> HTTP {}", request.method, url, status.as_u16());

        classify_response(&RawResponse {
            status,
            content_type,
            retry_after,
            body,
        })
        .inspect_err(|err| log::warn!("{} {} failed: {}", request.method, url, err))
    }

    pub async fn list_repositories(&self) -> Result<Vec<Repository>> {
        let envelope = self.execute(ApiRequest::get("/v1/repos")).await?;
        decode_data_or_default(envelope, "repository list")
    }

    pub async fn get_repository(&self, name: &str) -> Result<Repository> {
        let envelope = self
            .execute(ApiRequest::get(format!("/v1/repos/{}", encode_segment(name))))
            .await?;
        decode_data(envelope, "repository")
    }

    pub async fn create_repository(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Repository> {
        let mut payload = Map::new();
        payload.insert("name".to_string(), Value::from(name));
        if let Some(description) = non_empty(description) {
            payload.insert("description".to_string(), Value::from(description));
        }

        let envelope = self
            .execute(ApiRequest::post("/v1/repos").json(Value::Object(payload)))
            .await?;
        decode_data(envelope, "repository")
    }

    /// Lists the tree of `repo_name` at `git_ref`, optionally below `path`.
    pub async fn get_repository_tree(
        &self,
        repo_name: &str,
        git_ref: &str,
        path: Option<&str>,
    ) -> Result<TreeResponse> {
        let endpoint = format!(
            "/v1/repos/{}/tree/{}",
            encode_segment(repo_name),
            encode_segment(git_ref)
        );
        let request = ApiRequest::get(endpoint).query_opt("path", non_empty(path));
        let envelope = self.execute(request).await?;
        decode(envelope, "tree response")
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResponse> {
        let mut request = ApiRequest::get("/v1/search");
        request.query = query.to_params();
        let envelope = self.execute(request).await?;
        decode(envelope, "search response")
    }

    pub async fn search_suggestions(&self, query: &str, count: Option<u32>) -> Result<Vec<String>> {
        let request = ApiRequest::get("/v1/search/suggest")
            .query("q", query)
            .query("count", count.unwrap_or(DEFAULT_SUGGESTION_COUNT));
        let envelope = self.execute(request).await?;
        decode_data_or_default(envelope, "search suggestions")
    }

    pub async fn get_file_metadata(
        &self,
        repo_name: &str,
        git_ref: &str,
        path: &str,
    ) -> Result<Metadata> {
        let envelope = self
            .execute(ApiRequest::get(metadata_endpoint(repo_name, git_ref, path)))
            .await?;
        decode_data(envelope, "file metadata")
    }

    pub async fn update_file_metadata(
        &self,
        repo_name: &str,
        git_ref: &str,
        path: &str,
        metadata: &Metadata,
    ) -> Result<Metadata> {
        let request = ApiRequest::put(metadata_endpoint(repo_name, git_ref, path))
            .json(Value::Object(metadata.clone()));
        let envelope = self.execute(request).await?;
        decode_data(envelope, "file metadata")
    }

    /// Starts an upload. Send the bytes to the returned presigned URL, then call
    /// [`Client::commit_upload`] with the upload id.
    pub async fn initiate_upload(
        &self,
        repo_name: &str,
        path: &str,
        size: u64,
        content_type: &str,
    ) -> Result<UploadInitResponse> {
        let payload = json!({
            "path": path,
            "size": size,
            "content_type": content_type,
        });
        let endpoint = format!("/v1/repos/{}/upload/init", encode_segment(repo_name));
        let request = ApiRequest::post(endpoint).json(payload);
        let envelope = self.execute(request).await?;
        decode_data(envelope, "upload init response")
    }

    pub async fn commit_upload(
        &self,
        repo_name: &str,
        upload_id: &str,
        message: &str,
        metadata: Option<&Metadata>,
    ) -> Result<CommitResponse> {
        let mut payload = Map::new();
        payload.insert("upload_id".to_string(), Value::from(upload_id));
        payload.insert("message".to_string(), Value::from(message));
        if let Some(metadata) = metadata.filter(|m| !m.is_empty()) {
            payload.insert("metadata".to_string(), Value::Object(metadata.clone()));
        }

        let endpoint = format!("/v1/repos/{}/commit", encode_segment(repo_name));
        let request = ApiRequest::post(endpoint).json(Value::Object(payload));
        let envelope = self.execute(request).await?;
        decode_data(envelope, "commit response")
    }

    pub async fn export_repository(
        &self,
        repo_name: &str,
        git_ref: &str,
        format: &str,
    ) -> Result<ExportResponse> {
        let endpoint = format!("/v1/repos/{}/export", encode_segment(repo_name));
        let request = ApiRequest::post(endpoint)
            .query("ref", git_ref)
            .query("format", format);
        let envelope = self.execute(request).await?;
        decode_data(envelope, "export response")
    }

    pub async fn get_export_status(&self, export_id: &str) -> Result<ExportResponse> {
        let endpoint = format!("/v1/exports/{}", encode_segment(export_id));
        let envelope = self.execute(ApiRequest::get(endpoint)).await?;
        decode_data(envelope, "export response")
    }

    /// Polls an export until it completes or fails.
    ///
    /// A failed export is returned as `Ok`; check [`ExportResponse::state`]. Errors
    /// from individual polls are returned immediately. Hitting `wait.deadline`
    /// yields [`PortalError::Timeout`].
    pub async fn wait_for_export(
        &self,
        export_id: &str,
        wait: &ExportWait,
    ) -> Result<ExportResponse> {
        let started = Instant::now();
        let mut interval = wait.poll_interval;
        let mut last_status: Option<String> = None;
        let spinner = wait.progress.then(export_spinner);

        let outcome = loop {
            let export = match self.get_export_status(export_id).await {
                Ok(export) => export,
                Err(err) => break Err(err),
            };

            if last_status.as_deref() != Some(export.status.as_str()) {
                log::info!("export {} status: {}", export_id, export.status);
                if let Some(pb) = &spinner {
                    pb.set_message(format!("{} {}", export_id, export.status));
                }
                last_status = Some(export.status.clone());
            }

            if export.is_finished() {
                break Ok(export);
            }

            if let Some(deadline) = wait.deadline {
                let elapsed = started.elapsed();
                if elapsed >= deadline {
                    break Err(PortalError::Timeout {
                        message: format!(
                            "export {} still {} after {:?}",
                            export_id, export.status, elapsed
                        ),
                    });
                }
                interval = interval.min(deadline - elapsed);
            }

            tokio::time::sleep(interval).await;
            interval = next_poll_interval(interval, wait.max_interval);
        };

        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }
        outcome
    }

    /// Returns the health payload as sent, without envelope unwrapping.
    pub async fn health_check(&self) -> Result<HealthResponse> {
        let body = self.execute(ApiRequest::get("/health")).await?;
        decode(body, "health response")
    }
}

fn default_headers(config: &ClientConfig) -> anyhow::Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&format!("{}/{}", SDK_NAME, env!("CARGO_PKG_VERSION")))
            .unwrap_or(HeaderValue::from_static(SDK_NAME)),
    );
    if let Some(key) = config.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", key))
            .context("API key contains characters that are not valid in an HTTP header")?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }
    Ok(headers)
}

fn header_string(headers: &HeaderMap, name: reqwest::header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn metadata_endpoint(repo_name: &str, git_ref: &str, path: &str) -> String {
    format!(
        "/v1/repos/{}/metadata/{}/{}",
        encode_segment(repo_name),
        encode_segment(git_ref),
        encode_path(path)
    )
}

fn export_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} export {msg} [{elapsed}]") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}
