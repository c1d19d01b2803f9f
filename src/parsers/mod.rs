//! Parsers for repository manifests (pyproject.toml, package.json)

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::repository::Language;

/// Placeholder recorded when a manifest entry carries no usable version
pub const NO_VALID_VERSION: &str = "No Valid Version";

/// Dependency group a constraint was declared in.
///
/// Serialized as the plain string used for node and link `type` fields
/// (`dependency`, `dev-dependency`, `peer-dependency`, `<group>_dependency`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DependencyKind {
    Dependency,
    DevDependency,
    PeerDependency,
    /// Named group such as a Hatch environment or an optional-dependencies extra
    Custom(String),
}

impl DependencyKind {
    /// Kind for a dialect-specific named group: `<group>_dependency`
    pub fn named_group(group: &str) -> Self {
        DependencyKind::Custom(format!("{group}_dependency"))
    }

    pub fn as_str(&self) -> &str {
        match self {
            DependencyKind::Dependency => "dependency",
            DependencyKind::DevDependency => "dev-dependency",
            DependencyKind::PeerDependency => "peer-dependency",
            DependencyKind::Custom(s) => s,
        }
    }
}

impl From<String> for DependencyKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "dependency" => DependencyKind::Dependency,
            "dev-dependency" => DependencyKind::DevDependency,
            "peer-dependency" => DependencyKind::PeerDependency,
            _ => DependencyKind::Custom(value),
        }
    }
}

impl From<DependencyKind> for String {
    fn from(value: DependencyKind) -> Self {
        match value {
            DependencyKind::Custom(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A package constraint extracted from a manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Package name
    pub name: String,
    /// Version constraint as written (e.g. "^2.0", ">=1.0,<2"), or [`NO_VALID_VERSION`]
    pub version: String,
}

/// Named bucket of constraints; package names are unique within a group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyGroup {
    pub kind: DependencyKind,
    dependencies: Vec<Dependency>,
}

impl DependencyGroup {
    pub fn new(kind: DependencyKind) -> Self {
        Self {
            kind,
            dependencies: Vec::new(),
        }
    }

    /// Add a constraint. A repeated name keeps its position and takes the new version.
    pub fn insert(&mut self, name: impl Into<String>, version: impl Into<String>) {
        let name = name.into();
        let version = version.into();
        match self.dependencies.iter_mut().find(|d| d.name == name) {
            Some(existing) => existing.version = version,
            None => self.dependencies.push(Dependency { name, version }),
        }
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }
}

/// Normalized content of one repository manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedManifest {
    /// Version the repository itself publishes
    pub version: String,
    /// Groups in manifest order
    pub groups: Vec<DependencyGroup>,
}

impl ParsedManifest {
    pub fn dependency_count(&self) -> usize {
        self.groups.iter().map(DependencyGroup::len).sum()
    }
}

/// Errors raised while interpreting a manifest
#[derive(Debug, Error)]
pub enum ManifestError {
    /// pyproject.toml matches none of the supported build tools
    #[error(
        "Unsupported build system in {repository} repository. Only Poetry, Hatch, and UV are supported."
    )]
    UnsupportedBuildSystem { repository: String },
    #[error("invalid TOML manifest: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid JSON manifest: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{file} must contain a top-level object")]
    NotATable { file: &'static str },
}

/// Trait for manifest parsers
pub trait Parser: Send + Sync {
    /// Parse manifest text; `repository` names the source in logs and errors
    fn parse(&self, content: &str, repository: &str) -> Result<ParsedManifest, ManifestError>;

    /// Manifest file name this parser understands
    fn file_name(&self) -> &'static str;
}

/// Select the parser for a repository language
pub fn parser_for(language: &Language) -> Option<Box<dyn Parser>> {
    match language {
        Language::Python => Some(Box::new(python::PythonParser::new())),
        Language::JavaScript => Some(Box::new(npm::NpmParser::new())),
        Language::Other(_) => None,
    }
}

/// Constraint text for a raw manifest value, substituting the placeholder for non-strings
pub(crate) fn constraint_or_placeholder(
    raw: Option<&str>,
    package: &str,
    repository: &str,
) -> String {
    match raw {
        Some(version) => version.to_string(),
        None => {
            tracing::warn!(
                "Invalid version for {} in {}, recording \"{}\"",
                package,
                repository,
                NO_VALID_VERSION
            );
            NO_VALID_VERSION.to_string()
        }
    }
}

pub mod npm;
pub mod python;
