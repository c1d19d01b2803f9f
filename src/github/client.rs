//! Client for the GitHub REST contents API
//!
//! - **Listing**: `GET {api_base}/repos/{org}/{repo}/contents[?ref={branch}]`
//!   returns an array of entries with `name` and `download_url`.
//! - **Download**: `GET {download_url}` returns the raw file body.
//!
//! Requests carry `Authorization: Bearer <token>` when a token is configured.
//! Downloads only carry it when `download_url` points at the API origin or
//! at GitHub's raw content host, so a listing cannot redirect the token to a
//! third party.
//! The organization in the path is the configured owner with underscores
//! removed.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder};
use url::Url;

use super::auth::resolve_token;
use super::http_client::create_shared_client;
use super::{ContentEntry, ContentSource, FetchError};
use crate::config::GithubConfig;
use crate::repository::RepositoryDescriptor;

const GITHUB_JSON: &str = "application/vnd.github.v3+json";

/// Hosts serving `download_url`s for github.com repositories
const RAW_CONTENT_HOSTS: &[&str] = &["raw.githubusercontent.com"];

/// Client for the GitHub contents API
pub struct GithubClient {
    client: Arc<Client>,
    api_base: Url,
    token: Option<String>,
}

impl GithubClient {
    /// Build a client from configuration, reading the token from the environment
    pub fn from_config(config: &GithubConfig) -> anyhow::Result<Self> {
        let client = create_shared_client(Duration::from_secs(config.timeout_secs))?;
        let token = resolve_token(&config.token_env);
        Ok(Self::with_client(client, &config.api_base, token)?)
    }

    pub fn with_client(
        client: Arc<Client>,
        api_base: &str,
        token: Option<String>,
    ) -> Result<Self, FetchError> {
        Ok(Self {
            client,
            api_base: Url::parse(api_base)?,
            token,
        })
    }

    pub fn http_client(&self) -> Arc<Client> {
        Arc::clone(&self.client)
    }

    /// Contents listing URL for a repository root
    pub fn contents_url(&self, repository: &RepositoryDescriptor) -> Result<Url, FetchError> {
        let organization = repository.organization();
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(self.api_base.to_string()))?
            .pop_if_empty()
            .extend([
                "repos",
                organization.as_str(),
                repository.name.as_str(),
                "contents",
            ]);
        if let Some(branch) = &repository.branch {
            url.query_pairs_mut().append_pair("ref", branch);
        }
        Ok(url)
    }

    /// Whether requests to `url` may carry the token
    fn authorizes(&self, url: &Url) -> bool {
        let api_origin = url.scheme() == self.api_base.scheme()
            && url.host_str() == self.api_base.host_str()
            && url.port_or_known_default() == self.api_base.port_or_known_default();
        let raw_content = url.scheme() == "https"
            && url
                .host_str()
                .is_some_and(|host| RAW_CONTENT_HOSTS.contains(&host));
        api_origin || raw_content
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn try_fetch_repo_contents(
        &self,
        repository: &RepositoryDescriptor,
    ) -> Result<Vec<ContentEntry>, FetchError> {
        let url = self.contents_url(repository)?;
        if let Some(branch) = &repository.branch {
            tracing::info!("Using branch {} for {}", branch, repository.name);
        }
        tracing::debug!("GET {}", url);

        let response = self
            .authorized(self.client.get(url.clone()))
            .header(ACCEPT, GITHUB_JSON)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status(),
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl ContentSource for GithubClient {
    async fn fetch_repo_contents(&self, repository: &RepositoryDescriptor) -> Vec<ContentEntry> {
        let organization = repository.organization();
        tracing::info!(
            "Fetching repository contents for {}/{}",
            organization,
            repository.name
        );

        match self.try_fetch_repo_contents(repository).await {
            Ok(contents) => {
                tracing::info!(
                    "Fetched {} items from {}/{}",
                    contents.len(),
                    organization,
                    repository.name
                );
                contents
            }
            Err(e) => {
                tracing::error!(
                    "Failed to fetch contents for {}/{}: {}",
                    organization,
                    repository.name,
                    e
                );
                Vec::new()
            }
        }
    }

    async fn fetch_file(&self, download_url: &str) -> Result<String, FetchError> {
        tracing::debug!("GET {}", download_url);
        let url = Url::parse(download_url)
            .map_err(|_| FetchError::InvalidUrl(download_url.to_string()))?;
        let request = if self.authorizes(&url) {
            self.authorized(self.client.get(url))
        } else {
            tracing::debug!("Not sending credentials to {}", download_url);
            self.client.get(url)
        };
        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: download_url.to_string(),
                status: response.status(),
            });
        }

        Ok(response.text().await?)
    }
}
