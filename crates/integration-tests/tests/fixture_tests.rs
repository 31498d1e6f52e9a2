//! Fixture-driven logger scenarios
//!
//! Discovers every JSON scenario under tests/fixtures/ and replays it.

#![cfg_attr(
    test,
    allow(
        dead_code,
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::missing_panics_doc,
        clippy::missing_errors_doc,
        clippy::print_stdout,
        clippy::print_stderr,
        clippy::tests_outside_test_module,
        reason = "Test allows"
    )
)]

use integration_tests::{ScenarioRunner, VerificationResult, discover_fixtures, init_tracing};
use std::fs;
use std::path::PathBuf;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

#[test]
fn test_all_fixtures() {
    init_tracing();
    let fixtures = discover_fixtures(&fixtures_dir()).expect("Failed to discover fixtures");
    assert!(fixtures.len() >= 10, "Expected the bundled fixtures, found {}", fixtures.len());

    let mut combined = VerificationResult::new();
    for path in &fixtures {
        let runner = ScenarioRunner::from_file(path)
            .unwrap_or_else(|error| panic!("{}: {error:#}", path.display()));
        combined.merge(runner.run());
    }

    assert!(combined.passed, "Fixture failures:\n{}", combined.report());
}

#[test]
fn test_fixture_names_match_files() {
    for path in discover_fixtures(&fixtures_dir()).unwrap() {
        let runner = ScenarioRunner::from_file(&path).unwrap();
        let stem = path.file_stem().and_then(|stem| stem.to_str()).unwrap();
        assert_eq!(runner.scenario().name, stem);
    }
}

#[test]
fn test_missing_directory_has_no_fixtures() {
    let fixtures = discover_fixtures(&fixtures_dir().join("does-not-exist")).unwrap();
    assert!(fixtures.is_empty());
}

#[test]
fn test_unreadable_fixture_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ not json").unwrap();

    let error = ScenarioRunner::from_file(&path).unwrap_err();
    assert!(error.to_string().contains("Failed to parse fixture"));
}
