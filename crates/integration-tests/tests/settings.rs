//! Suite settings loaded from TOML and applied to the doubles.

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

use std::fs;

use reqwest::Method;
use serde_json::Map;
use spyglass_core::{Error as CoreError, Settings};
use spyglass_doubles::{HttpClient as _, MockResponse, Recording as _, TestHttpClient, Verify as _};

const SUITE_SETTINGS: &str = r#"
[policy]
strict_sequence = false

[http]
base_uri = "https://api.shop.test/v2/"
"#;

#[test]
fn test_settings_file_configures_http_double() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("spyglass.toml");
    fs::write(&path, SUITE_SETTINGS).unwrap();

    let settings = Settings::load_from_file(&path).unwrap();
    let client = TestHttpClient::from_settings(MockResponse::new("ok"), &settings);
    assert_eq!(client.base_uri(), "https://api.shop.test/v2/");
    assert!(!client.recorder().policy().strict_sequence);

    client.request(Method::GET, "carts/1", Map::new()).unwrap();
    client.request(Method::DELETE, "carts/1", Map::new()).unwrap();

    client.expect(Method::DELETE, "https://api.shop.test/v2/carts/1");
    client.expect(Method::GET, "https://api.shop.test/v2/carts/1");
    client.verify();
}

#[test]
fn test_missing_settings_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let error = Settings::load_from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(error, CoreError::Io(_)));
}

#[test]
fn test_strict_size_still_applies_from_settings() {
    let settings = Settings::from_toml_str(SUITE_SETTINGS).unwrap();
    let client = TestHttpClient::from_settings(MockResponse::default(), &settings);

    client.request(Method::GET, "health", Map::new()).unwrap();
    client.request(Method::GET, "health", Map::new()).unwrap();
    client.expect(Method::GET, "https://api.shop.test/v2/health");

    let rendered = client.assert().unwrap_err().to_string();
    assert!(rendered.contains("Failed asserting that the http client requests does not contain the following element(s):"));
}
