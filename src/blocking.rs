use anyhow::Context;
use serde_json::Value;
use tokio::runtime::{Builder, Runtime};

use crate::client::{Client, ExportWait};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::models::{
    CommitResponse, ExportResponse, HealthResponse, Metadata, Repository, TreeResponse,
    UploadInitResponse,
};
use crate::request::ApiRequest;
use crate::search::{SearchQuery, SearchResponse};

/// Blocking twin of [`Client`].
///
/// Each instance owns a private current-thread runtime and drives every call to
/// completion on it. Do not use it from inside an async context; use [`Client`]
/// there instead.
#[derive(Debug)]
pub struct BlockingClient {
    inner: Client,
    runtime: Runtime,
}

impl BlockingClient {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::new(ClientConfig::load(None, None, None)?)
    }

    pub fn new(config: ClientConfig) -> anyhow::Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to start runtime for blocking client")?;
        let inner = {
            let _guard = runtime.enter();
            Client::new(config)?
        };
        Ok(Self { inner, runtime })
    }

    /// The async client this wrapper drives.
    pub fn async_client(&self) -> &Client {
        &self.inner
    }

    /// Releases this handle's share of the connection pool and shuts the
    /// private runtime down. Clones of [`Self::async_client`] keep the pool alive.
    pub fn close(self) {
        let Self { inner, runtime } = self;
        inner.close();
        runtime.shutdown_background();
    }

    pub fn execute(&self, request: ApiRequest) -> Result<Value> {
        self.runtime.block_on(self.inner.execute(request))
    }

    pub fn list_repositories(&self) -> Result<Vec<Repository>> {
        self.runtime.block_on(self.inner.list_repositories())
    }

    pub fn get_repository(&self, name: &str) -> Result<Repository> {
        self.runtime.block_on(self.inner.get_repository(name))
    }

    pub fn create_repository(&self, name: &str, description: Option<&str>) -> Result<Repository> {
        self.runtime
            .block_on(self.inner.create_repository(name, description))
    }

    pub fn get_repository_tree(
        &self,
        repo_name: &str,
        git_ref: &str,
        path: Option<&str>,
    ) -> Result<TreeResponse> {
        self.runtime
            .block_on(self.inner.get_repository_tree(repo_name, git_ref, path))
    }

    pub fn search(&self, query: &SearchQuery) -> Result<SearchResponse> {
        self.runtime.block_on(self.inner.search(query))
    }

    pub fn search_suggestions(&self, query: &str, count: Option<u32>) -> Result<Vec<String>> {
        self.runtime
            .block_on(self.inner.search_suggestions(query, count))
    }

    pub fn get_file_metadata(&self, repo_name: &str, git_ref: &str, path: &str) -> Result<Metadata> {
        self.runtime
            .block_on(self.inner.get_file_metadata(repo_name, git_ref, path))
    }

    pub fn update_file_metadata(
        &self,
        repo_name: &str,
        git_ref: &str,
        path: &str,
        metadata: &Metadata,
    ) -> Result<Metadata> {
        self.runtime.block_on(
            self.inner
                .update_file_metadata(repo_name, git_ref, path, metadata),
        )
    }

    pub fn initiate_upload(
        &self,
        repo_name: &str,
        path: &str,
        size: u64,
        content_type: &str,
    ) -> Result<UploadInitResponse> {
        self.runtime
            .block_on(self.inner.initiate_upload(repo_name, path, size, content_type))
    }

    pub fn commit_upload(
        &self,
        repo_name: &str,
        upload_id: &str,
        message: &str,
        metadata: Option<&Metadata>,
    ) -> Result<CommitResponse> {
        self.runtime
            .block_on(self.inner.commit_upload(repo_name, upload_id, message, metadata))
    }

    pub fn export_repository(
        &self,
        repo_name: &str,
        git_ref: &str,
        format: &str,
    ) -> Result<ExportResponse> {
        self.runtime
            .block_on(self.inner.export_repository(repo_name, git_ref, format))
    }

    pub fn get_export_status(&self, export_id: &str) -> Result<ExportResponse> {
        self.runtime.block_on(self.inner.get_export_status(export_id))
    }

    pub fn wait_for_export(&self, export_id: &str, wait: &ExportWait) -> Result<ExportResponse> {
        self.runtime
            .block_on(self.inner.wait_for_export(export_id, wait))
    }

    pub fn health_check(&self) -> Result<HealthResponse> {
        self.runtime.block_on(self.inner.health_check())
    }
}
