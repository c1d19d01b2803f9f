//! Dependency graph model
//!
//! The graph is a flat `{nodes, links}` document. Nodes are either
//! repositories (id = published package name, falling back to the repository
//! name) or packages (id = `"<package>-<language>"`). Links point from a
//! package node to the repository node that depends on it.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::parsers::DependencyKind;
use crate::repository::Language;

pub mod builder;
pub mod merge;
pub mod owner;

pub use builder::build_repository_graph;
pub use merge::{ValidationReport, merge_and_validate};
pub use owner::OwnerClassifier;

/// Node id for a package seen in a repository of the given language
pub fn dependency_node_id(package: &str, language: &Language) -> String {
    format!("{package}-{language}")
}

/// A repository or package vertex
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub name: String,
    pub owner: String,
    pub language: Language,
    #[serde(rename = "type")]
    pub kind: DependencyKind,
    /// Every distinct version string the node was observed under, first-seen order
    pub version: Vec<String>,
}

/// Edge from a package node to a dependent repository node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphLink {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: DependencyKind,
    pub language: Language,
}

/// The `{nodes, links}` document served to dashboards
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyGraph {
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub links: Vec<GraphLink>,
}

impl DependencyGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.links.is_empty()
    }

    /// Append another graph's nodes and links, keeping their order
    pub fn extend(&mut self, other: DependencyGraph) {
        self.nodes.extend(other.nodes);
        self.links.extend(other.links);
    }

    pub fn node_ids(&self) -> HashSet<&str> {
        self.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}
