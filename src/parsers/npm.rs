//! Parser for package.json files

use serde_json::{Map, Value};

use super::{
    DependencyGroup, DependencyKind, ManifestError, NO_VALID_VERSION, ParsedManifest, Parser,
    constraint_or_placeholder,
};

/// Dependency sections read from package.json, in output order
const SECTIONS: [(&str, DependencyKind); 3] = [
    ("dependencies", DependencyKind::Dependency),
    ("devDependencies", DependencyKind::DevDependency),
    ("peerDependencies", DependencyKind::PeerDependency),
];

/// Parser for npm package.json dependency files
#[derive(Debug, Default)]
pub struct NpmParser;

impl NpmParser {
    pub fn new() -> Self {
        Self
    }
}

impl Parser for NpmParser {
    fn parse(&self, content: &str, repository: &str) -> Result<ParsedManifest, ManifestError> {
        let document: Value = serde_json::from_str(content)?;
        let Some(document) = document.as_object() else {
            return Err(ManifestError::NotATable {
                file: self.file_name(),
            });
        };

        let version = match document.get("version").and_then(Value::as_str) {
            Some(v) => v.to_string(),
            None => {
                tracing::warn!("package.json of {} declares no version", repository);
                NO_VALID_VERSION.to_string()
            }
        };

        let groups = SECTIONS
            .iter()
            .map(|(section, kind)| {
                let mut group = DependencyGroup::new(kind.clone());
                if let Some(entries) = document.get(*section).and_then(Value::as_object) {
                    insert_entries(&mut group, entries, repository);
                }
                group
            })
            .collect();

        Ok(ParsedManifest { version, groups })
    }

    fn file_name(&self) -> &'static str {
        "package.json"
    }
}

fn insert_entries(group: &mut DependencyGroup, entries: &Map<String, Value>, repository: &str) {
    for (name, value) in entries {
        let version = constraint_or_placeholder(value.as_str(), name, repository);
        group.insert(name.as_str(), version);
    }
}
