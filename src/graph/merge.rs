//! Merging per-repository graphs and checking link endpoints
//!
//! Nodes sharing an `id` are collapsed into the first occurrence. Their
//! version lists are unioned in first-seen order, so the output only depends
//! on the order nodes were accumulated in. Links are never rewritten or
//! dropped: a link whose endpoint is unknown is reported and kept.

use std::collections::HashMap;
use std::fmt;

use super::{DependencyGraph, GraphLink, GraphNode};

/// Which end of a link failed to resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEnd {
    Source,
    Target,
}

impl fmt::Display for LinkEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkEnd::Source => f.write_str("source"),
            LinkEnd::Target => f.write_str("target"),
        }
    }
}

/// A link endpoint that names no known node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingEndpoint {
    /// Index of the link in the output links list
    pub link_index: usize,
    pub end: LinkEnd,
    pub id: String,
}

/// Data-quality findings from [`merge_and_validate`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Number of node occurrences folded into an earlier node with the same id
    pub duplicates_collapsed: usize,
    pub dangling: Vec<DanglingEndpoint>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.duplicates_collapsed == 0 && self.dangling.is_empty()
    }
}

/// Collapse duplicate nodes, then report links with unknown endpoints.
///
/// Never fails on data-quality problems; links are returned unchanged.
pub fn merge_and_validate(
    nodes: Vec<GraphNode>,
    links: Vec<GraphLink>,
) -> (DependencyGraph, ValidationReport) {
    let (nodes, duplicates_collapsed) = collapse_duplicate_nodes(nodes);
    let graph = DependencyGraph { nodes, links };
    let dangling = find_dangling_endpoints(&graph);

    (
        graph,
        ValidationReport {
            duplicates_collapsed,
            dangling,
        },
    )
}

/// Keep the first node per id, folding later versions into it
pub fn collapse_duplicate_nodes(nodes: Vec<GraphNode>) -> (Vec<GraphNode>, usize) {
    let mut unique: Vec<GraphNode> = Vec::with_capacity(nodes.len());
    let mut index_by_id: HashMap<String, usize> = HashMap::with_capacity(nodes.len());
    let mut collapsed = 0;

    for node in nodes {
        match index_by_id.get(&node.id) {
            Some(&index) => {
                tracing::info!("Duplicate node found: {}", node.id);
                collapsed += 1;
                let retained = &mut unique[index];
                for version in node.version {
                    if !retained.version.contains(&version) {
                        retained.version.push(version);
                    }
                }
            }
            None => {
                index_by_id.insert(node.id.clone(), unique.len());
                unique.push(node);
            }
        }
    }

    (unique, collapsed)
}

/// Every link endpoint that does not resolve to a node, one entry per missing end
pub fn find_dangling_endpoints(graph: &DependencyGraph) -> Vec<DanglingEndpoint> {
    let ids = graph.node_ids();
    let mut dangling = Vec::new();

    for (link_index, link) in graph.links.iter().enumerate() {
        for (end, id) in [(LinkEnd::Source, &link.source), (LinkEnd::Target, &link.target)] {
            if !ids.contains(id.as_str()) {
                tracing::warn!("Link {} not found in nodes: {}", end, id);
                dangling.push(DanglingEndpoint {
                    link_index,
                    end,
                    id: id.clone(),
                });
            }
        }
    }

    dangling
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::DependencyKind;
    use crate::repository::Language;

    fn node(id: &str, versions: &[&str]) -> GraphNode {
        GraphNode {
            id: id.to_string(),
            name: id.trim_end_matches("-javascript").to_string(),
            owner: "other".to_string(),
            language: Language::JavaScript,
            kind: DependencyKind::Dependency,
            version: versions.iter().map(|v| v.to_string()).collect(),
        }
    }

    fn link(source: &str, target: &str) -> GraphLink {
        GraphLink {
            source: source.to_string(),
            target: target.to_string(),
            kind: DependencyKind::Dependency,
            language: Language::JavaScript,
        }
    }

    #[test]
    fn test_duplicate_versions_are_unioned_in_first_seen_order() {
        let (graph, report) = merge_and_validate(
            vec![
                node("lodash-javascript", &["4.17.21"]),
                node("app", &["1.0.0"]),
                node("lodash-javascript", &["4.17.20"]),
                node("lodash-javascript", &["4.17.21"]),
            ],
            vec![],
        );

        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.nodes[0].id, "lodash-javascript");
        assert_eq!(graph.nodes[0].version, vec!["4.17.21", "4.17.20"]);
        assert_eq!(graph.nodes[1].id, "app");
        assert_eq!(report.duplicates_collapsed, 2);
    }

    #[test]
    fn test_first_occurrence_attributes_are_retained() {
        let mut dev = node("jest-javascript", &["^29"]);
        dev.kind = DependencyKind::DevDependency;
        let (graph, _) = merge_and_validate(vec![dev, node("jest-javascript", &["^30"])], vec![]);

        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.nodes[0].kind, DependencyKind::DevDependency);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let nodes = vec![
            node("a-javascript", &["1"]),
            node("b-javascript", &["2"]),
            node("a-javascript", &["3"]),
        ];
        let links = vec![link("a-javascript", "root"), link("b-javascript", "root")];

        let (once, _) = merge_and_validate(nodes, links.clone());
        let (twice, report) = merge_and_validate(once.nodes.clone(), links);

        assert_eq!(once, twice);
        assert_eq!(report.duplicates_collapsed, 0);
    }

    #[test]
    fn test_dangling_links_are_reported_and_kept() {
        let nodes = vec![node("react-javascript", &["^18"]), node("app", &["1.0.0"])];
        let links = vec![
            link("react-javascript", "app"),
            link("ghost-javascript", "app"),
            link("ghost-javascript", "missing-app"),
        ];

        let (graph, report) = merge_and_validate(nodes, links.clone());

        assert_eq!(graph.links, links);
        assert_eq!(
            report.dangling,
            vec![
                DanglingEndpoint {
                    link_index: 1,
                    end: LinkEnd::Source,
                    id: "ghost-javascript".to_string(),
                },
                DanglingEndpoint {
                    link_index: 2,
                    end: LinkEnd::Source,
                    id: "ghost-javascript".to_string(),
                },
                DanglingEndpoint {
                    link_index: 2,
                    end: LinkEnd::Target,
                    id: "missing-app".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_empty_input() {
        let (graph, report) = merge_and_validate(vec![], vec![]);
        assert!(graph.is_empty());
        assert!(report.is_clean());
    }

    #[test]
    fn test_links_resolve_against_collapsed_nodes() {
        let nodes = vec![
            node("x-javascript", &["1"]),
            node("x-javascript", &["2"]),
            node("r", &["0"]),
        ];
        let (_, report) = merge_and_validate(nodes, vec![link("x-javascript", "r")]);
        assert!(report.dangling.is_empty());
        assert_eq!(report.duplicates_collapsed, 1);
    }
}
