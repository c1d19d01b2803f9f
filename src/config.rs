//! Configuration management for repograph

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::repository::RepositoryDescriptor;

/// Default hosting API root
const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Default environment variable holding the hosting API token
const DEFAULT_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Default HTTP timeout for hosting API calls (10 seconds)
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Hosting API configuration
    pub github: GithubConfig,
    /// Object storage configuration
    pub storage: StorageConfig,
    /// HTTP surface configuration
    pub server: ServerConfig,
    /// Package owner classification
    pub owners: OwnersConfig,
    /// Repositories to build the graph from, in processing order
    pub repositories: Vec<RepositoryDescriptor>,
}

/// Hosting API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    /// API root, e.g. `https://api.github.com`
    pub api_base: String,
    /// Environment variable the bearer token is read from
    pub token_env: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            token_env: DEFAULT_TOKEN_ENV.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Object storage configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Filesystem directory objects are written under
    pub root: String,
    /// Key prefix for published documents
    pub site_folder: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: "data".to_string(),
            site_folder: "site".to_string(),
        }
    }
}

/// HTTP surface configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Package owner classification rules
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OwnersConfig {
    /// Owner for packages matching a configured repository's `build_name`
    pub organization: String,
    /// Further (pattern, owner) tests, tried in order after the organization
    pub rules: Vec<OwnerRule>,
}

impl Default for OwnersConfig {
    fn default() -> Self {
        Self {
            organization: "algorandfoundation".to_string(),
            rules: vec![
                OwnerRule {
                    pattern: "@makerx".to_string(),
                    owner: "makerx".to_string(),
                },
                OwnerRule {
                    pattern: "py-algorand-sdk".to_string(),
                    owner: "algorandtechnologies".to_string(),
                },
            ],
        }
    }
}

/// A regex tested against package names
#[derive(Debug, Clone, Deserialize)]
pub struct OwnerRule {
    pub pattern: String,
    pub owner: String,
}

impl Config {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        toml::from_str(content).context("Invalid configuration")
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }
}
