//! Logger double scenarios written directly against the fluent API.

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

use integration_tests::init_tracing;
use log::{Level as LogLevel, Log, Record};
use serde_json::{Map, json};
use spyglass_core::Failure;
use spyglass_core::matchers::{any_value, contains_str, matches_regex};
use spyglass_doubles::{Level, Logger as _, Recording as _, Resettable as _, TestLogger, Verify as _};

#[test]
fn test_matching_pair_passes() {
    init_tracing();
    let logger = TestLogger::new();
    logger.info("message", Map::new());

    logger.expect(Level::Info, "message");
    logger.assert().unwrap();
}

#[test]
fn test_extra_event_lists_leftover() {
    let logger = TestLogger::new();
    logger.info("message", Map::new());
    logger.info("extra", Map::new());

    logger.expect(Level::Info, "message");
    let failure = logger.assert().unwrap_err();

    assert_eq!(failure.failures().len(), 1);
    match &failure.failures()[0] {
        Failure::Unexpected { elements } => {
            assert_eq!(elements.len(), 1);
            assert_eq!(elements[0].0, 1);
            assert!(elements[0].1.contains("extra"));
        }
        other => panic!("Expected leftover events, got {other:?}"),
    }
}

#[test]
fn test_reversed_order_after_disable_strict_sequence() {
    let logger = TestLogger::new();
    logger.info("second", Map::new());
    logger.info("first", Map::new());

    logger.expect(Level::Info, "first");
    logger.expect(Level::Info, "second");
    logger.assert().unwrap_err();

    logger.disable_strict_sequence();
    logger.assert().unwrap();
}

#[test]
fn test_warning_other_against_info_message() {
    let logger = TestLogger::new();
    logger.info("message", Map::new());

    logger.expect(Level::Warning, "other");
    let failure = logger.assert().unwrap_err();

    match &failure.failures()[0] {
        Failure::Mismatch { index, fields } => {
            assert_eq!(*index, 0);
            let names: Vec<&str> = fields.iter().map(|field| field.field.as_str()).collect();
            assert_eq!(names, vec!["0.level", "0.message"]);
        }
        other => panic!("Expected a positional mismatch, got {other:?}"),
    }
}

#[test]
fn test_assert_is_idempotent() {
    let logger = TestLogger::new();
    logger.error("boom", Map::new());
    logger.expect(Level::Critical, "boom");

    let first = logger.assert();
    let second = logger.assert();
    assert_eq!(first, second);
    assert_eq!(logger.records().len(), 1);
}

#[test]
fn test_matchers_in_expectations() {
    let logger = TestLogger::new();
    logger.warning(
        "Order 1042 delayed",
        json!({"carrier": "dhl"}).as_object().cloned().unwrap(),
    );
    logger.debug("tick", Map::new());

    logger
        .expect(Level::Warning, matches_regex(r"^Order \d+ delayed$").unwrap())
        .context(json!({"carrier": "dhl"}));
    logger.expect(Level::Debug, any_value());
    logger.verify();
}

#[test]
fn test_description_prefixes_failure() {
    let logger = TestLogger::new();
    logger.notice("shipped", Map::new());

    logger
        .with_description("Shipping notices")
        .expect(Level::Notice, contains_str("delivered"));
    let rendered = logger.assert().unwrap_err().to_string();
    assert!(rendered.starts_with("Shipping notices\n"));
}

#[test]
fn test_reset_then_record_again() {
    let logger = TestLogger::new();
    logger.alert("first run", Map::new());
    logger.expect(Level::Alert, "second run");
    logger.assert().unwrap_err();

    logger.reset();
    logger.alert("second run", Map::new());
    logger.verify();
}

#[test]
fn test_log_facade_calls_are_recorded() {
    let logger = TestLogger::new();
    Log::log(
        &logger,
        &Record::builder()
            .level(LogLevel::Warn)
            .target("billing")
            .args(format_args!("card declined"))
            .build(),
    );

    logger
        .expect(Level::Warning, "card declined")
        .context(json!({"target": "billing"}));
    logger.verify();
}
