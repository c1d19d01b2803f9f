//! Regression tests for fuzz crashes
//!
//! Parsers must turn any input into either a manifest or a `ManifestError`,
//! never a panic.

use repograph::parsers::npm::NpmParser;
use repograph::parsers::python::{PythonParser, split_requirement};
use repograph::parsers::{ManifestError, NO_VALID_VERSION, Parser};
use std::panic::AssertUnwindSafe;

fn parse_without_panic(
    parser: &dyn Parser,
    content: &str,
) -> Result<repograph::parsers::ParsedManifest, ManifestError> {
    match std::panic::catch_unwind(AssertUnwindSafe(|| parser.parse(content, "fuzz"))) {
        Ok(result) => result,
        Err(_) => panic!("parser panicked on input {content:?}"),
    }
}

#[test]
fn test_pyproject_malformed_inputs() {
    let parser = PythonParser::new();
    let inputs = [
        "",
        "[",
        "tool = 1",
        "[tool]\npoetry = \"not a table\"",
        "[tool.poetry]\nversion = 1",
        "[tool.poetry]\ndependencies = [\"a\"]",
        "[tool.poetry.group]\ndev = 3",
        "[tool.hatch]\nenvs = \"x\"",
        "[tool.hatch.envs.default]\ndependencies = [1, 2, {a = 1}]",
        "[tool.uv]\n[project]\ndependencies = \"requests\"",
        "[tool.uv]\n[project]\noptional-dependencies = [\"a\"]",
        "[tool.uv]\n[project.optional-dependencies]\nextra = \"x\"",
        "\u{0}\u{feff}[tool.poetry]",
    ];

    for input in inputs {
        let _ = parse_without_panic(&parser, input);
    }
}

#[test]
fn test_pyproject_wrong_shapes_are_tolerated() {
    let parser = PythonParser::new();

    let manifest =
        parse_without_panic(&parser, "[tool.poetry]\nversion = 1\ndependencies = 5").unwrap();
    assert_eq!(manifest.version, NO_VALID_VERSION);
    assert_eq!(manifest.dependency_count(), 0);

    let manifest = parse_without_panic(
        &parser,
        "[tool.uv]\n[project]\ndependencies = [1, \"\", \"requests\"]",
    )
    .unwrap();
    let names: Vec<&str> = manifest
        .groups
        .iter()
        .flat_map(|g| g.dependencies())
        .map(|d| d.name.as_str())
        .collect();
    assert!(names.contains(&"requests"));
}

#[test]
fn test_package_json_malformed_inputs() {
    let parser = NpmParser::new();
    let inputs = [
        "",
        "{",
        "null",
        "[]",
        "\"string\"",
        "{\"dependencies\": []}",
        "{\"dependencies\": null}",
        "{\"dependencies\": {\"a\": null, \"b\": [], \"c\": {}}}",
        "{\"version\": {\"major\": 1}}",
    ];

    for input in inputs {
        let _ = parse_without_panic(&parser, input);
    }
}

#[test]
fn test_package_json_top_level_must_be_object() {
    let parser = NpmParser::new();
    assert!(matches!(
        parse_without_panic(&parser, "[]"),
        Err(ManifestError::NotATable { .. })
    ));
    assert!(matches!(
        parse_without_panic(&parser, "{"),
        Err(ManifestError::Json(_))
    ));
}

#[test]
fn test_split_requirement_edge_cases() {
    let inputs = [
        "",
        ">=",
        "==1.0",
        "   ",
        "<<>>",
        "a~=b<c",
        "ñame>=1",
        "name >= 1.0 ; python_version < '3.9'",
    ];
    for input in inputs {
        let (name, constraint) = split_requirement(input);
        assert!(!constraint.is_empty(), "empty constraint for {input:?}");
        assert!(input.contains(name.trim()), "name {name:?} not from {input:?}");
    }
}
