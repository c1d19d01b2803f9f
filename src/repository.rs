//! Repository descriptors loaded from application configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Language a repository publishes packages for.
///
/// Unknown values are kept as [`Language::Other`] so a misconfigured entry
/// is reported per repository at build time instead of failing config load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Language {
    Python,
    JavaScript,
    Other(String),
}

impl Language {
    pub fn as_str(&self) -> &str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::Other(s) => s,
        }
    }
}

impl From<String> for Language {
    fn from(value: String) -> Self {
        match value.as_str() {
            "python" => Language::Python,
            "javascript" => Language::JavaScript,
            _ => Language::Other(value),
        }
    }
}

impl From<Language> for String {
    fn from(value: Language) -> Self {
        match value {
            Language::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A repository whose manifest contributes to the dependency graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryDescriptor {
    /// Repository name on the hosting service
    pub name: String,
    /// Owning organization (underscores are dropped when calling the API)
    pub owner: String,
    /// Published package name, used as node identity when present
    #[serde(default)]
    pub build_name: Option<String>,
    pub language: Language,
    /// Branch to read the manifest from (default branch when absent)
    #[serde(default)]
    pub branch: Option<String>,
}

impl RepositoryDescriptor {
    /// Logical id of the repository node: `build_name`, falling back to `name`
    pub fn node_name(&self) -> &str {
        self.build_name.as_deref().unwrap_or(&self.name)
    }

    /// Organization login used in hosting API paths
    pub fn organization(&self) -> String {
        self.owner.replace('_', "")
    }
}
