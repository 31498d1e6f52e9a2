//! The sample signup service checked through every double at once.

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

use std::sync::Arc;

use anyhow::Result;
use integration_tests::services::{ADMIN_CHANNEL, BOUNCE_ADDRESS};
use integration_tests::{Collaborators, SignupError, SignupService, UserRegistered, init_tracing};
use reqwest::{Method, StatusCode};
use serde_json::json;
use spyglass_core::Expected;
use spyglass_core::matchers::{any_value, array_contains, is_null, starts_with};
use spyglass_doubles::mailer::{envelope_has_recipient, envelope_recipient_count, envelope_sender_same};
use spyglass_doubles::notifier::no_recipient;
use spyglass_doubles::{
    Error as DoublesError, Importance, Level, MockResponse, Recording as _, ResponseFactory, TestEventDispatcher, TestHttpClient, TestLogger,
    TestMailer, TestNotifier, TestTranslator, Verify as _,
};

struct Doubles {
    logger: Arc<TestLogger>,
    events: Arc<TestEventDispatcher>,
    http: Arc<TestHttpClient>,
    mailer: Arc<TestMailer>,
    notifier: Arc<TestNotifier>,
    translator: Arc<TestTranslator>,
}

impl Doubles {
    fn new(responses: impl Into<ResponseFactory>) -> Self {
        Self {
            logger: Arc::new(TestLogger::new()),
            events: Arc::new(TestEventDispatcher::new()),
            http: Arc::new(TestHttpClient::with_base_uri(responses, "https://users.shop.test/api/")),
            mailer: Arc::new(TestMailer::new()),
            notifier: Arc::new(TestNotifier::new()),
            translator: Arc::new(TestTranslator::new([("signup.welcome", "Welcome aboard!")])),
        }
    }

    fn service(&self) -> SignupService {
        SignupService::new(Collaborators {
            logger: Arc::clone(&self.logger) as _,
            events: Arc::clone(&self.events) as _,
            http: Arc::clone(&self.http) as _,
            mailer: Arc::clone(&self.mailer) as _,
            notifier: Arc::clone(&self.notifier) as _,
            translator: Arc::clone(&self.translator) as _,
        })
    }
}

#[test]
fn test_successful_signup() -> Result<()> {
    init_tracing();
    let doubles = Doubles::new(MockResponse::json(&json!({"id": 7})));

    let id = doubles.service().register("ana@shop.test", "Ana")?;
    assert_eq!(id, 7);

    doubles
        .logger
        .expect(Level::Info, "Registering user")
        .context(json!({"email": "ana@shop.test"}));
    doubles
        .logger
        .expect(Level::Info, "User registered")
        .context(json!({"id": 7}));

    doubles
        .http
        .expect(Method::POST, "https://users.shop.test/users")
        .option("json", json!({"email": "ana@shop.test", "name": "Ana"}))
        .option("headers", is_null());

    doubles
        .events
        .expect::<UserRegistered>()
        .name("user.registered")
        .payload(array_contains([("id", Expected::from(7))], false));

    doubles
        .translator
        .expect("signup.welcome")
        .parameter("%name%", "Ana")
        .domain("emails");

    doubles
        .mailer
        .expect("Welcome aboard!")
        .envelope(envelope_has_recipient("ana@shop.test"));

    doubles.logger.assert()?;
    doubles.http.assert()?;
    doubles.events.assert()?;
    doubles.translator.assert()?;
    doubles.mailer.assert()?;
    doubles.notifier.assert()?;
    Ok(())
}

#[test]
fn test_rejected_signup_alerts_admins() {
    let doubles = Doubles::new(MockResponse::new("taken").with_status(StatusCode::CONFLICT));

    let error = doubles
        .service()
        .register("ana@shop.test", "Ana")
        .unwrap_err();
    assert!(matches!(error, SignupError::Rejected(409)));

    doubles
        .notifier
        .expect("Signup rejected")
        .content(starts_with("ana@shop.test"))
        .importance(Importance::Urgent)
        .emoji("warning")
        .channels(json!([ADMIN_CHANNEL]))
        .recipients(vec![no_recipient()]);
    doubles.notifier.verify();

    doubles.logger.expect(Level::Info, any_value());
    doubles
        .logger
        .expect(Level::Error, "Signup rejected")
        .context(json!({"email": "ana@shop.test", "status": 409}));
    doubles.logger.verify();

    doubles.events.verify();
    doubles.mailer.verify();
}

#[test]
fn test_missing_id_is_an_invalid_response() {
    let doubles = Doubles::new(MockResponse::json(&json!({"name": "Ana"})));

    let error = doubles
        .service()
        .register("ana@shop.test", "Ana")
        .unwrap_err();
    assert!(matches!(error, SignupError::InvalidResponse(_)));
    assert!(doubles.events.dispatched().is_empty());
}

#[test]
fn test_exhausted_responses_surface_as_collaborator_error() {
    let doubles = Doubles::new(vec![MockResponse::json(&json!({"id": 1}))]);
    let service = doubles.service();

    service.register("ana@shop.test", "Ana").unwrap();
    let error = service.register("bea@shop.test", "Bea").unwrap_err();
    assert!(matches!(
        error,
        SignupError::Collaborator(DoublesError::ResponsesExhausted)
    ));
    assert_eq!(doubles.http.requests().len(), 1);
}

#[test]
fn test_envelope_expectations() {
    let doubles = Doubles::new(MockResponse::json(&json!({"id": 3})));
    doubles.service().register("cy@shop.test", "Cy").unwrap();

    doubles
        .mailer
        .expect("Welcome")
        .envelope(envelope_sender_same(BOUNCE_ADDRESS));
    doubles.mailer.verify();

    doubles.mailer.recorder().clear_expectations();
    doubles
        .mailer
        .expect("Welcome")
        .envelope(envelope_recipient_count(2));
    let rendered = doubles.mailer.assert().unwrap_err().to_string();
    assert!(rendered.contains("Failed asserting that the Envelope has \"2\" recipients."));
}

#[test]
fn test_unordered_checks_across_two_signups() {
    let doubles = Doubles::new(ResponseFactory::callback(|_, _, options| {
        let id = if options["json"]["name"] == "Ana" { 1 } else { 2 };
        MockResponse::json(&json!({"id": id}))
    }));
    let service = doubles.service();
    service.register("ana@shop.test", "Ana").unwrap();
    service.register("bea@shop.test", "Bea").unwrap();

    doubles.events.disable_strict_sequence();
    doubles
        .events
        .expect_event(any_value())
        .payload(json!({"id": 2, "email": "bea@shop.test"}));
    doubles
        .events
        .expect_event(any_value())
        .payload(json!({"id": 1, "email": "ana@shop.test"}));
    doubles.events.verify();
}
