//! Source-code hosting API access
//!
//! The graph build only needs two calls from the hosting service: list a
//! repository's root directory and download one file from it. Both sit behind
//! [`ContentSource`] so the build can run against any implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::repository::RepositoryDescriptor;

pub mod auth;
pub mod client;
pub mod http_client;

pub use client::GithubClient;

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEntry {
    pub name: String,
    #[serde(default)]
    pub path: Option<String>,
    /// Raw download location; `null` for directories and submodules
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// Failures talking to the hosting service
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("invalid hosting API base url: {0}")]
    BaseUrl(#[from] url::ParseError),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

/// Trait for hosting API clients
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// List the repository root (pinned to `branch` when set).
    ///
    /// Failures are logged and yield an empty listing, so one unreachable
    /// repository never aborts a batch.
    async fn fetch_repo_contents(&self, repository: &RepositoryDescriptor) -> Vec<ContentEntry>;

    /// Download a file body by its `download_url`
    async fn fetch_file(&self, download_url: &str) -> Result<String, FetchError>;
}

/// Find a file by name in a directory listing
pub fn find_entry<'a>(contents: &'a [ContentEntry], file_name: &str) -> Option<&'a ContentEntry> {
    contents.iter().find(|entry| entry.name == file_name)
}
