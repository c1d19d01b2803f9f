//! Dependency Data Service
//!
//! Runs fetch → parse → build for every configured repository, then merges the
//! per-repository graphs once. Repositories are processed concurrently, but
//! their results are accumulated in configuration order before the merge, so
//! the merged output (including version list order) is reproducible.

use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use thiserror::Error;

use crate::config::OwnersConfig;
use crate::github::{ContentSource, FetchError, find_entry};
use crate::graph::{
    DependencyGraph, OwnerClassifier, ValidationReport, build_repository_graph, merge_and_validate,
};
use crate::parsers::{ManifestError, parser_for};
use crate::repository::RepositoryDescriptor;

/// Errors that abort a whole graph build
#[derive(Debug, Error)]
pub enum BuildError {
    /// A repository uses a build layout no parser understands
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error("invalid owner pattern: {0}")]
    OwnerPattern(#[from] regex::Error),
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),
}

/// Why a repository contributed nothing to the graph
#[derive(Debug)]
pub enum RepositoryFailure {
    UnsupportedLanguage(String),
    ContentsUnavailable,
    ManifestMissing(&'static str),
    Download(FetchError),
    Malformed(ManifestError),
}

impl fmt::Display for RepositoryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepositoryFailure::UnsupportedLanguage(language) => {
                write!(f, "unsupported language: {language}")
            }
            RepositoryFailure::ContentsUnavailable => {
                f.write_str("no repository contents available")
            }
            RepositoryFailure::ManifestMissing(file) => write!(f, "no {file} found"),
            RepositoryFailure::Download(e) => write!(f, "manifest download failed: {e}"),
            RepositoryFailure::Malformed(e) => write!(f, "manifest could not be parsed: {e}"),
        }
    }
}

/// Result of one graph build
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub graph: DependencyGraph,
    pub validation: ValidationReport,
    /// Names of repositories that contributed to the graph, in configuration order
    pub succeeded: Vec<String>,
    /// Names of repositories that contributed nothing, in configuration order
    pub failed: Vec<String>,
}

/// Builds the global dependency graph from a hosting API
pub struct DependencyDataService {
    source: Arc<dyn ContentSource>,
    owners: OwnersConfig,
}

impl DependencyDataService {
    pub fn new(source: Arc<dyn ContentSource>, owners: OwnersConfig) -> Self {
        Self { source, owners }
    }

    /// Rebuild the full graph for `repositories`.
    ///
    /// Per-repository problems (unreachable API, missing or malformed manifest,
    /// unknown language) are logged and listed in [`BuildReport::failed`].
    /// Only an unsupported Python build layout or a bad owner pattern aborts.
    pub async fn build_dependency_graph(
        &self,
        repositories: &[RepositoryDescriptor],
    ) -> Result<BuildReport, BuildError> {
        tracing::info!(
            "Starting dependency analysis for {} repositories",
            repositories.len()
        );
        let owners = OwnerClassifier::new(repositories, &self.owners)?;
        let total = repositories.len();

        let outcomes = join_all(
            repositories
                .iter()
                .enumerate()
                .map(|(i, repository)| {
                    tracing::info!("[{}/{}] Processing {}", i + 1, total, repository.name);
                    self.process_repository(repository, &owners)
                }),
        )
        .await;

        let mut nodes = Vec::new();
        let mut links = Vec::new();
        let mut report = BuildReport::default();

        for (repository, outcome) in repositories.iter().zip(outcomes) {
            match outcome? {
                Ok(graph) => {
                    tracing::info!(
                        "Processed {}: {} nodes, {} links",
                        repository.name,
                        graph.nodes.len(),
                        graph.links.len()
                    );
                    if graph.links.is_empty() {
                        tracing::warn!("No dependencies found for {}", repository.name);
                    }
                    nodes.extend(graph.nodes);
                    links.extend(graph.links);
                    report.succeeded.push(repository.name.clone());
                }
                Err(failure) => {
                    tracing::error!(
                        "Failed to process dependencies for {}: {}",
                        repository.name,
                        failure
                    );
                    report.failed.push(repository.name.clone());
                }
            }
        }

        tracing::info!(
            "Pre-validation: {} total nodes, {} total links",
            nodes.len(),
            links.len()
        );
        let (graph, validation) = merge_and_validate(nodes, links);

        tracing::info!(
            "Summary: {} successful, {} failed repositories",
            report.succeeded.len(),
            report.failed.len()
        );
        tracing::info!(
            "Final result: {} nodes, {} links",
            graph.nodes.len(),
            graph.links.len()
        );

        report.graph = graph;
        report.validation = validation;
        Ok(report)
    }

    /// Fetch, parse and build one repository.
    ///
    /// The outer `Result` carries build-aborting errors, the inner one
    /// per-repository failures.
    async fn process_repository(
        &self,
        repository: &RepositoryDescriptor,
        owners: &OwnerClassifier,
    ) -> Result<Result<DependencyGraph, RepositoryFailure>, ManifestError> {
        let Some(parser) = parser_for(&repository.language) else {
            return Ok(Err(RepositoryFailure::UnsupportedLanguage(
                repository.language.to_string(),
            )));
        };

        let contents = self.source.fetch_repo_contents(repository).await;
        if contents.is_empty() {
            return Ok(Err(RepositoryFailure::ContentsUnavailable));
        }

        let file_name = parser.file_name();
        let Some(download_url) =
            find_entry(&contents, file_name).and_then(|entry| entry.download_url.as_deref())
        else {
            return Ok(Err(RepositoryFailure::ManifestMissing(file_name)));
        };

        let content = match self.source.fetch_file(download_url).await {
            Ok(content) => content,
            Err(e) => return Ok(Err(RepositoryFailure::Download(e))),
        };

        let manifest = match parser.parse(&content, &repository.name) {
            Ok(manifest) => manifest,
            Err(e @ ManifestError::UnsupportedBuildSystem { .. }) => return Err(e),
            Err(e) => return Ok(Err(RepositoryFailure::Malformed(e))),
        };

        Ok(Ok(build_repository_graph(repository, &manifest, owners)))
    }
}

/// Build the graph contribution of one manifest read outside the hosting API.
///
/// Owners are classified against `repositories` plus `repository` itself, so
/// packages published by configured repositories keep their organization.
pub fn build_manifest_graph(
    repository: &RepositoryDescriptor,
    content: &str,
    repositories: &[RepositoryDescriptor],
    owners: &OwnersConfig,
) -> Result<DependencyGraph, BuildError> {
    let parser = parser_for(&repository.language)
        .ok_or_else(|| BuildError::UnsupportedLanguage(repository.language.to_string()))?;
    let manifest = parser.parse(content, &repository.name)?;

    let known: Vec<RepositoryDescriptor> = repositories
        .iter()
        .chain(std::iter::once(repository))
        .cloned()
        .collect();
    let classifier = OwnerClassifier::new(&known, owners)?;
    Ok(build_repository_graph(repository, &manifest, &classifier))
}
