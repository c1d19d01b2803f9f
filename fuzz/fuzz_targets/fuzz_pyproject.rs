#![no_main]

use libfuzzer_sys::fuzz_target;
use repograph::parsers::python::PythonParser;
use repograph::parsers::Parser;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        let parser = PythonParser::new();

        if let Ok(manifest) = parser.parse(content, "fuzz") {
            for group in &manifest.groups {
                let mut seen = std::collections::HashSet::new();
                for dep in group.dependencies() {
                    assert!(seen.insert(dep.name.as_str()), "duplicate name in group");
                }
            }
        }
    }
});
