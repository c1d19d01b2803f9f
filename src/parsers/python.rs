//! Parser for Python pyproject.toml manifests
//!
//! Three build-tool layouts are understood. They are not mutually exclusive
//! in real files, so detection follows a fixed precedence:
//!
//! 1. **Poetry** (`[tool.poetry]`): version from `tool.poetry.version`,
//!    constraints from the `tool.poetry.dependencies` table and the dev group
//!    (`tool.poetry.group.dev.dependencies`, or the pre-1.2
//!    `tool.poetry.dev-dependencies` table).
//! 2. **Hatch** (`[tool.hatch]`): version from `project.version`, PEP 621
//!    `project.dependencies` plus every `tool.hatch.envs.<env>.dependencies`
//!    list, tagged `<env>_dependency`.
//! 3. **UV** (`[tool.uv]`): version from `project.version`,
//!    `project.dependencies` plus every `project.optional-dependencies.<group>`,
//!    tagged `<group>_dependency`.
//!
//! Anything else is [`ManifestError::UnsupportedBuildSystem`].

use toml::{Table, Value};

use super::{
    DependencyGroup, DependencyKind, ManifestError, NO_VALID_VERSION, ParsedManifest, Parser,
    constraint_or_placeholder,
};

/// Comparison operators that end the package name in a requirement string
const OPERATORS: [&str; 7] = [">=", "<=", "==", "!=", "~=", "<", ">"];

/// Parser for pyproject.toml files
#[derive(Debug, Default)]
pub struct PythonParser;

impl PythonParser {
    pub fn new() -> Self {
        Self
    }
}

impl Parser for PythonParser {
    fn parse(&self, content: &str, repository: &str) -> Result<ParsedManifest, ManifestError> {
        let document: Table = toml::from_str(content)?;

        let Some(kind) = PyprojectKind::detect(&document) else {
            return Err(ManifestError::UnsupportedBuildSystem {
                repository: repository.to_string(),
            });
        };
        tracing::debug!("{} uses {:?} layout", repository, kind);

        Ok(match kind {
            PyprojectKind::Poetry => parse_poetry(&document, repository),
            PyprojectKind::Hatch => parse_hatch(&document, repository),
            PyprojectKind::Uv => parse_uv(&document, repository),
        })
    }

    fn file_name(&self) -> &'static str {
        "pyproject.toml"
    }
}

/// Build-tool layout of a pyproject.toml
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PyprojectKind {
    Poetry,
    Hatch,
    Uv,
}

impl PyprojectKind {
    /// Resolve the layout from the `[tool]` table, Poetry first, then Hatch, then UV
    pub fn detect(document: &Table) -> Option<Self> {
        let tool = table_at(document, &["tool"])?;
        if tool.contains_key("poetry") {
            Some(PyprojectKind::Poetry)
        } else if tool.contains_key("hatch") {
            Some(PyprojectKind::Hatch)
        } else if tool.contains_key("uv") {
            Some(PyprojectKind::Uv)
        } else {
            None
        }
    }
}

fn parse_poetry(document: &Table, repository: &str) -> ParsedManifest {
    let version = version_at(document, &["tool", "poetry", "version"], repository);

    let mut main = DependencyGroup::new(DependencyKind::Dependency);
    if let Some(table) = table_at(document, &["tool", "poetry", "dependencies"]) {
        insert_table_constraints(&mut main, table, repository);
    }

    // A missing dev group is an empty group, not an error
    let mut dev = DependencyGroup::new(DependencyKind::DevDependency);
    if let Some(table) = table_at(document, &["tool", "poetry", "group", "dev", "dependencies"]) {
        insert_table_constraints(&mut dev, table, repository);
    }
    if let Some(table) = table_at(document, &["tool", "poetry", "dev-dependencies"]) {
        insert_table_constraints(&mut dev, table, repository);
    }

    ParsedManifest {
        version,
        groups: vec![main, dev],
    }
}

fn parse_hatch(document: &Table, repository: &str) -> ParsedManifest {
    let version = version_at(document, &["project", "version"], repository);
    let mut groups = vec![project_dependencies(document, repository)];

    if let Some(envs) = table_at(document, &["tool", "hatch", "envs"]) {
        for (env_name, env) in envs {
            let mut group = DependencyGroup::new(DependencyKind::named_group(env_name));
            if let Some(requirements) = env.get("dependencies").and_then(Value::as_array) {
                insert_requirements(&mut group, requirements, repository);
            }
            groups.push(group);
        }
    }

    ParsedManifest { version, groups }
}

fn parse_uv(document: &Table, repository: &str) -> ParsedManifest {
    let version = version_at(document, &["project", "version"], repository);
    let mut groups = vec![project_dependencies(document, repository)];

    if let Some(optional) = table_at(document, &["project", "optional-dependencies"]) {
        for (group_name, requirements) in optional {
            let mut group = DependencyGroup::new(DependencyKind::named_group(group_name));
            if let Some(requirements) = requirements.as_array() {
                insert_requirements(&mut group, requirements, repository);
            }
            groups.push(group);
        }
    }

    ParsedManifest { version, groups }
}

/// PEP 621 `[project] dependencies` list
fn project_dependencies(document: &Table, repository: &str) -> DependencyGroup {
    let mut group = DependencyGroup::new(DependencyKind::Dependency);
    if let Some(requirements) = document
        .get("project")
        .and_then(|p| p.get("dependencies"))
        .and_then(Value::as_array)
    {
        insert_requirements(&mut group, requirements, repository);
    }
    group
}

/// Poetry-style `name = "constraint"` table
fn insert_table_constraints(group: &mut DependencyGroup, table: &Table, repository: &str) {
    for (name, value) in table {
        let version = constraint_or_placeholder(value.as_str(), name, repository);
        group.insert(name.as_str(), version);
    }
}

/// PEP 508-style `"name>=1.0"` strings
fn insert_requirements(group: &mut DependencyGroup, requirements: &[Value], repository: &str) {
    for requirement in requirements {
        let Some(requirement) = requirement.as_str() else {
            tracing::warn!(
                "Skipping non-string requirement {} in {}",
                requirement,
                repository
            );
            continue;
        };
        let (name, version) = split_requirement(requirement);
        if name.is_empty() {
            tracing::warn!(
                "Skipping requirement without a package name '{}' in {}",
                requirement,
                repository
            );
            continue;
        }
        group.insert(name, version);
    }
}

/// Split a requirement at its first comparison operator.
///
/// The name is everything before the operator, the constraint everything from
/// it on (both trimmed). A requirement without an operator or with nothing
/// after it gets [`NO_VALID_VERSION`].
pub fn split_requirement(requirement: &str) -> (String, String) {
    let operator_pos = OPERATORS
        .iter()
        .filter_map(|op| requirement.find(op))
        .min();

    let (name, constraint) = match operator_pos {
        Some(pos) => (&requirement[..pos], &requirement[pos..]),
        None => (requirement, ""),
    };

    let constraint = constraint.trim();
    let constraint = if constraint.is_empty() {
        NO_VALID_VERSION
    } else {
        constraint
    };

    (name.trim().to_string(), constraint.to_string())
}

fn table_at<'a>(document: &'a Table, path: &[&str]) -> Option<&'a Table> {
    let (first, rest) = path.split_first()?;
    let mut current = document.get(*first)?.as_table()?;
    for key in rest {
        current = current.get(*key)?.as_table()?;
    }
    Some(current)
}

fn version_at(document: &Table, path: &[&str], repository: &str) -> String {
    let Some((key, parents)) = path.split_last() else {
        return NO_VALID_VERSION.to_string();
    };
    let raw = table_at(document, parents)
        .and_then(|t| t.get(*key))
        .and_then(Value::as_str);
    if raw.is_none() {
        tracing::warn!("No version declared at {} in {}", path.join("."), repository);
    }
    raw.unwrap_or(NO_VALID_VERSION).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> ParsedManifest {
        PythonParser::new().parse(content, "test-repo").unwrap()
    }

    fn group<'a>(manifest: &'a ParsedManifest, kind: &str) -> &'a DependencyGroup {
        manifest
            .groups
            .iter()
            .find(|g| g.kind.as_str() == kind)
            .unwrap()
    }

    fn version_of<'a>(group: &'a DependencyGroup, name: &str) -> &'a str {
        &group
            .dependencies()
            .iter()
            .find(|d| d.name == name)
            .unwrap()
            .version
    }

    #[test]
    fn test_poetry() {
        let manifest = parse(
            r#"
[tool.poetry]
name = "pkg-a"
version = "1.2.3"

[tool.poetry.dependencies]
python = "^3.12"
requests = "^2.0"

[tool.poetry.group.dev.dependencies]
pytest = "^7.0"
"#,
        );
        assert_eq!(manifest.version, "1.2.3");

        let main = group(&manifest, "dependency");
        assert_eq!(main.len(), 2);
        assert_eq!(version_of(main, "requests"), "^2.0");
        assert_eq!(version_of(main, "python"), "^3.12");

        let dev = group(&manifest, "dev-dependency");
        assert_eq!(dev.len(), 1);
        assert_eq!(version_of(dev, "pytest"), "^7.0");
    }

    #[test]
    fn test_poetry_without_dev_group() {
        let manifest = parse(
            r#"
[tool.poetry]
version = "0.1.0"

[tool.poetry.dependencies]
click = "^8.1"
"#,
        );
        assert_eq!(group(&manifest, "dependency").len(), 1);
        assert!(group(&manifest, "dev-dependency").is_empty());
    }

    #[test]
    fn test_poetry_legacy_dev_dependencies() {
        let manifest = parse(
            r#"
[tool.poetry]
version = "0.1.0"

[tool.poetry.dev-dependencies]
black = "^24.0"
"#,
        );
        assert_eq!(version_of(group(&manifest, "dev-dependency"), "black"), "^24.0");
    }

    #[test]
    fn test_poetry_non_string_constraints_get_placeholder() {
        let manifest = parse(
            r#"
[tool.poetry]
version = "1.0.0"

[tool.poetry.dependencies]
numeric = 2
algokit-utils = { version = "^3.0", extras = ["cli"] }
"#,
        );
        let main = group(&manifest, "dependency");
        assert_eq!(version_of(main, "numeric"), NO_VALID_VERSION);
        assert_eq!(version_of(main, "algokit-utils"), NO_VALID_VERSION);
    }

    #[test]
    fn test_hatch() {
        let manifest = parse(
            r#"
[project]
name = "puya"
version = "4.0.0"
dependencies = [
    "attrs>=24.2",
    "networkx ~= 3.4",
    "structlog",
]

[tool.hatch.envs.default]
dependencies = ["pytest>=8", "mypy==1.13.0"]

[tool.hatch.envs.docs]
dependencies = ["sphinx>=7"]

[tool.hatch.envs.empty]
python = "3.12"
"#,
        );
        assert_eq!(manifest.version, "4.0.0");

        let main = group(&manifest, "dependency");
        assert_eq!(version_of(main, "attrs"), ">=24.2");
        assert_eq!(version_of(main, "networkx"), "~= 3.4");
        assert_eq!(version_of(main, "structlog"), NO_VALID_VERSION);

        let default_env = group(&manifest, "default_dependency");
        assert_eq!(version_of(default_env, "pytest"), ">=8");
        assert_eq!(version_of(default_env, "mypy"), "==1.13.0");

        assert_eq!(version_of(group(&manifest, "docs_dependency"), "sphinx"), ">=7");
        assert!(group(&manifest, "empty_dependency").is_empty());
    }

    #[test]
    fn test_uv() {
        let manifest = parse(
            r#"
[project]
name = "algokit-utils"
version = "3.0.0"
dependencies = ["httpx>=0.23.1,<=0.24.1"]

[project.optional-dependencies]
cli = ["rich<14"]
test = ["pytest>=8", "pytest-cov"]

[tool.uv]
dev-dependencies = []
"#,
        );
        assert_eq!(manifest.version, "3.0.0");
        assert_eq!(
            version_of(group(&manifest, "dependency"), "httpx"),
            ">=0.23.1,<=0.24.1"
        );
        assert_eq!(version_of(group(&manifest, "cli_dependency"), "rich"), "<14");

        let test = group(&manifest, "test_dependency");
        assert_eq!(test.len(), 2);
        assert_eq!(version_of(test, "pytest-cov"), NO_VALID_VERSION);
    }

    #[test]
    fn test_poetry_takes_precedence_over_hatch() {
        let manifest = parse(
            r#"
[project]
version = "9.9.9"
dependencies = ["from-hatch>=1"]

[tool.poetry]
version = "1.0.0"

[tool.poetry.dependencies]
from-poetry = "^1"

[tool.hatch.envs.default]
dependencies = ["hatch-only>=1"]
"#,
        );
        assert_eq!(manifest.version, "1.0.0");
        assert_eq!(manifest.groups.len(), 2);
        let main = group(&manifest, "dependency");
        assert!(main.dependencies().iter().any(|d| d.name == "from-poetry"));
        assert!(!main.dependencies().iter().any(|d| d.name == "from-hatch"));
    }

    #[test]
    fn test_hatch_takes_precedence_over_uv() {
        let doc: Table = toml::from_str("[tool.hatch]\n[tool.uv]\n").unwrap();
        assert_eq!(PyprojectKind::detect(&doc), Some(PyprojectKind::Hatch));
    }

    #[test]
    fn test_unsupported_build_system() {
        let err = PythonParser::new()
            .parse(
                "[project]\nname = \"x\"\n\n[tool.setuptools]\n",
                "legacy-repo",
            )
            .unwrap_err();
        match err {
            ManifestError::UnsupportedBuildSystem { repository } => {
                assert_eq!(repository, "legacy-repo")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_no_tool_table_is_unsupported() {
        let err = PythonParser::new()
            .parse("[project]\nname = \"x\"\n", "bare")
            .unwrap_err();
        assert!(matches!(err, ManifestError::UnsupportedBuildSystem { .. }));
    }

    #[test]
    fn test_invalid_toml() {
        let err = PythonParser::new()
            .parse("[tool.poetry\nname = ", "broken")
            .unwrap_err();
        assert!(matches!(err, ManifestError::Toml(_)));
    }

    #[test]
    fn test_missing_version_gets_placeholder() {
        let manifest = parse("[tool.uv]\n[project]\ndependencies = []\n");
        assert_eq!(manifest.version, NO_VALID_VERSION);
    }

    #[test]
    fn test_split_requirement() {
        assert_eq!(
            split_requirement("requests>=2.0"),
            ("requests".to_string(), ">=2.0".to_string())
        );
        assert_eq!(
            split_requirement(" rich < 14 "),
            ("rich".to_string(), "< 14".to_string())
        );
        assert_eq!(
            split_requirement("httpx>=0.23,<0.25"),
            ("httpx".to_string(), ">=0.23,<0.25".to_string())
        );
        assert_eq!(
            split_requirement("pkg!=1.5"),
            ("pkg".to_string(), "!=1.5".to_string())
        );
        assert_eq!(
            split_requirement("structlog"),
            ("structlog".to_string(), NO_VALID_VERSION.to_string())
        );
        assert_eq!(
            split_requirement("dangling>="),
            ("dangling".to_string(), ">=".to_string())
        );
    }

    #[test]
    fn test_split_requirement_earliest_operator_wins() {
        // "<" appears before "==" so the name ends there
        let (name, version) = split_requirement("a<2==1");
        assert_eq!(name, "a");
        assert_eq!(version, "<2==1");
    }
}
