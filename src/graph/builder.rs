//! Turns one repository's parsed manifest into graph nodes and links

use super::{DependencyGraph, GraphLink, GraphNode, OwnerClassifier, dependency_node_id};
use crate::parsers::{DependencyGroup, DependencyKind, ParsedManifest};
use crate::repository::RepositoryDescriptor;

/// Build the repository node plus one node and one link per declared constraint.
///
/// Nodes come out repository first, then groups in manifest order. Packages
/// repeated across groups produce repeated nodes; they are collapsed later by
/// [`merge_and_validate`](super::merge_and_validate).
pub fn build_repository_graph(
    repository: &RepositoryDescriptor,
    manifest: &ParsedManifest,
    owners: &OwnerClassifier,
) -> DependencyGraph {
    let repo_node = repository_node(repository, &manifest.version);
    let mut graph = DependencyGraph {
        nodes: Vec::with_capacity(manifest.dependency_count() + 1),
        links: Vec::with_capacity(manifest.dependency_count()),
    };
    let target = repo_node.id.clone();
    graph.nodes.push(repo_node);

    for group in &manifest.groups {
        graph.extend(group_graph(repository, group, &target, owners));
    }

    graph
}

fn repository_node(repository: &RepositoryDescriptor, version: &str) -> GraphNode {
    let id = repository.node_name().to_string();
    GraphNode {
        name: id.clone(),
        id,
        owner: repository.owner.clone(),
        language: repository.language.clone(),
        kind: DependencyKind::Dependency,
        version: vec![version.to_string()],
    }
}

fn group_graph(
    repository: &RepositoryDescriptor,
    group: &DependencyGroup,
    target: &str,
    owners: &OwnerClassifier,
) -> DependencyGraph {
    if group.is_empty() {
        return DependencyGraph::default();
    }

    let language = &repository.language;
    let mut graph = DependencyGraph {
        nodes: Vec::with_capacity(group.len()),
        links: Vec::with_capacity(group.len()),
    };

    for dependency in group.dependencies() {
        let id = dependency_node_id(&dependency.name, language);
        graph.nodes.push(GraphNode {
            id: id.clone(),
            name: dependency.name.clone(),
            owner: owners.classify(&dependency.name).to_string(),
            language: language.clone(),
            kind: group.kind.clone(),
            version: vec![dependency.version.clone()],
        });
        graph.links.push(GraphLink {
            source: id,
            target: target.to_string(),
            kind: group.kind.clone(),
            language: language.clone(),
        });
    }

    graph
}
