//! Parsing of captured tool output against recorded samples.

use std::path::Path;

use cxxlens_core::{Adapter, ParseError, ToolAdapter, ToolKind, ToolSettings};
use pretty_assertions::assert_eq;

fn fixture_lines(name: &str) -> Vec<String> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

fn adapter(kind: ToolKind) -> Adapter {
    Adapter::new(kind, ToolSettings::new(kind.key()), None)
}

#[test]
fn cppcheck_drops_unused_function() {
    let outcome = adapter(ToolKind::CppCheck).parse(&fixture_lines("cppcheck.xml"));

    assert_eq!(outcome.issues.len(), 9);
    assert!(outcome.skipped.is_empty());
    assert!(
        outcome
            .issues
            .iter()
            .all(|i| i.rule_id != "cppcheck.unusedFunction")
    );

    let null = &outcome.issues[0];
    assert_eq!(null.rule_id, "cppcheck.nullPointer");
    assert_eq!(null.line, 42);
    assert_eq!(null.component, "/src/a.cpp");

    let last = outcome.issues.last().unwrap();
    assert_eq!(last.component, "/src/a.h");
    assert_eq!(
        last.message,
        "Class 'Widget' has a constructor with 1 argument that is not explicit."
    );
}

#[test]
fn rats_converts_untyped_records_per_file_and_line() {
    let outcome = adapter(ToolKind::Rats).parse(&fixture_lines("rats.xml"));

    let located: Vec<(&str, u32)> = outcome
        .issues
        .iter()
        .map(|i| (i.component.as_str(), i.line))
        .collect();
    assert_eq!(
        located,
        vec![
            ("/src/a.cpp", 21),
            ("/src/a.cpp", 44),
            ("/src/a.cpp", 30),
            ("/src/b.cpp", 7),
        ]
    );
    assert!(outcome.issues.iter().all(|i| i.rule_id == "rats."));
    assert_eq!(
        outcome.issues[3].message,
        "Double check that your buffer is as big as you specify."
    );
}

#[test]
fn vera_skips_malformed_lines() {
    let outcome = adapter(ToolKind::Vera).parse(&fixture_lines("vera.txt"));

    assert_eq!(outcome.issues.len(), 6);
    assert_eq!(outcome.skipped.len(), 2);
    assert_eq!(
        outcome.skipped[1].reason,
        ParseError::InvalidLineNumber("forty".to_string())
    );

    let last = outcome.issues.last().unwrap();
    assert_eq!(last.rule_id, "vera++:T001");
    assert_eq!(last.line, 44);
    assert_eq!(last.message, "bad indent");
}

#[test]
fn cpplint_through_custom_adapter() {
    let custom = Adapter::new(
        ToolKind::Custom,
        ToolSettings::new("python").with_arguments("cpplint_mod.py --output=vs7"),
        Some("cpplint".to_string()),
    );
    let outcome = custom.parse(&fixture_lines("cpplint.txt"));

    let rules: Vec<&str> = outcome.issues.iter().map(|i| i.rule_id.as_str()).collect();
    assert_eq!(
        rules,
        vec![
            "other.cpplint.build/include_subdir",
            "other.cpplint.whitespace/end_of_line",
            "other.cpplint.whitespace/parens",
            "other.cpplint.whitespace/comments",
        ]
    );
    assert_eq!(outcome.skipped.len(), 2);
    assert_eq!(outcome.issues[2].message, "Missing space before ( in if(");
}

#[test]
fn parsing_is_a_pure_function_of_the_lines() {
    for (kind, fixture) in [
        (ToolKind::CppCheck, "cppcheck.xml"),
        (ToolKind::Rats, "rats.xml"),
        (ToolKind::Vera, "vera.txt"),
        (ToolKind::Custom, "cpplint.txt"),
    ] {
        let lines = fixture_lines(fixture);
        let adapter = adapter(kind);
        assert_eq!(adapter.parse(&lines), adapter.parse(&lines), "{}", kind);
    }
}
