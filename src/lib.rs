//! A Rust client for the BlackLake data portal API.
//!
//! The crate wraps the portal's HTTP endpoints for repositories, trees, search,
//! file metadata, uploads and exports in typed calls, and maps every failure to a
//! [`PortalError`] variant callers can match on.
//!
//! ## Quick start
//! - Configure the portal via environment variables (`BLACKLAKE_URL`, `BLACKLAKE_API_KEY`)
//!   or a `.blacklakerc` file (supported in the current directory and in your home directory).
//! - Use [`Client`] from async code, or [`BlockingClient`] from synchronous code.
//!
//! ```no_run
//! use blacklake::{Client, ClientConfig, PortalError, SearchQuery};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let client = Client::new(ClientConfig::new("https://portal.example.com").with_api_key("secret"))?;
//!
//! let response = client.search(&SearchQuery::new("invoice").limit(10)).await?;
//! for hit in response.results()? {
//!     println!("{}:{} ({:?})", hit.repo_name, hit.path, hit.score);
//! }
//!
//! match client.get_repository("finance").await {
//!     Ok(repo) => println!("{} created {}", repo.name, repo.created_at),
//!     Err(PortalError::NotFound { .. }) => println!("no such repository"),
//!     Err(e) => return Err(e.into()),
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

mod blocking;
mod client;
mod config;
mod envelope;
mod error;
mod models;
mod request;
mod search;
mod util;

#[cfg(test)]
mod tests;

pub use blocking::BlockingClient;
pub use client::{Client, DEFAULT_EXPORT_FORMAT, DEFAULT_REF, ExportWait};
pub use config::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use envelope::ApiResponse;
pub use error::{ErrorDetails, PortalError, Result};
pub use models::{
    CommitResponse, EntryKind, ExportResponse, ExportState, HealthResponse, Metadata, Policy,
    PolicyEffect, Repository, SubjectAttribute, Tenant, TreeEntry, TreeResponse,
    UploadInitResponse,
};
pub use request::ApiRequest;
pub use search::{
    DEFAULT_SEARCH_LIMIT, DEFAULT_SUGGESTION_COUNT, FacetValue, SearchFacet, SearchQuery,
    SearchResponse, SearchResult,
};

/// Re-exported so callers can build [`ApiRequest`]s without depending on `reqwest` directly.
pub use reqwest::Method;
pub use reqwest::header;
