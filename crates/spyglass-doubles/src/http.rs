//! Recording HTTP client backed by mock responses.

use core::fmt;
use core::result::Result as CoreResult;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use reqwest::{Method, StatusCode, Url};
use serde_json::{Map, Value, json};
use spyglass_core::{Expected, Recorder, Recording, Resettable, Settings, TestFailure, Verify};

use crate::error::{Error, Result};

/// Base URI used when none is configured.
pub const DEFAULT_BASE_URI: &str = "https://example.com";

/// Request options such as `headers`, `query`, `json` or `body`.
pub type RequestOptions = Map<String, Value>;

/// Canned response returned by [`TestHttpClient`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockResponse {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: String,
}

impl MockResponse {
    /// A 200 response with `body`.
    #[must_use]
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// A 200 response carrying `value` as JSON.
    #[must_use]
    pub fn json(value: &Value) -> Self {
        Self::new(value.to_string()).with_header("content-type", "application/json")
    }

    /// Replace the status code.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Append a response header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// First header named `name`, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(header, _)| header.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Raw body.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Body parsed as JSON.
    ///
    /// # Errors
    /// Returns an error if the body is not valid JSON.
    pub fn to_json(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.body)
    }
}

/// Builds a response for a request.
pub type ResponseCallback = Arc<dyn Fn(&Method, &Url, &RequestOptions) -> MockResponse + Send + Sync>;

/// Where [`TestHttpClient`] takes its responses from.
#[derive(Default)]
pub enum ResponseFactory {
    /// An empty 200 response for every request.
    #[default]
    Default,
    /// The same response for every request.
    Fixed(MockResponse),
    /// One queued response per request, in order.
    Sequence(VecDeque<MockResponse>),
    /// A response computed from the request.
    Callback(ResponseCallback),
}

impl ResponseFactory {
    /// Build a callback factory.
    pub fn callback<F>(callback: F) -> Self
    where
        F: Fn(&Method, &Url, &RequestOptions) -> MockResponse + Send + Sync + 'static,
    {
        Self::Callback(Arc::new(callback))
    }

    fn next_response(&mut self) -> Result<Pending> {
        match self {
            Self::Default => Ok(Pending::Ready(MockResponse::default())),
            Self::Fixed(response) => Ok(Pending::Ready(response.clone())),
            Self::Sequence(queue) => queue
                .pop_front()
                .map(Pending::Ready)
                .ok_or(Error::ResponsesExhausted),
            Self::Callback(callback) => Ok(Pending::Computed(Arc::clone(callback))),
        }
    }
}

/// Response taken from a factory; callbacks run once the factory is unlocked.
enum Pending {
    Ready(MockResponse),
    Computed(ResponseCallback),
}

impl From<MockResponse> for ResponseFactory {
    fn from(response: MockResponse) -> Self {
        Self::Fixed(response)
    }
}

impl From<Vec<MockResponse>> for ResponseFactory {
    fn from(responses: Vec<MockResponse>) -> Self {
        Self::Sequence(responses.into())
    }
}

impl fmt::Debug for ResponseFactory {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => formatter.write_str("Default"),
            Self::Fixed(response) => formatter.debug_tuple("Fixed").field(response).finish(),
            Self::Sequence(queue) => formatter.debug_tuple("Sequence").field(&queue.len()).finish(),
            Self::Callback(_) => formatter.write_str("Callback"),
        }
    }
}

/// HTTP collaborator.
pub trait HttpClient: Send + Sync {
    /// Send a request to `url`, resolved against the client's base URI.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or no response is available.
    fn request(&self, method: Method, url: &str, options: RequestOptions) -> Result<MockResponse>;
}

/// One captured request.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    /// HTTP method
    pub method: Method,
    /// Resolved URL
    pub url: Url,
    /// Default options merged with the request's own
    pub options: RequestOptions,
}

/// HTTP client double.
#[derive(Debug)]
pub struct TestHttpClient {
    recorder: Recorder<RecordedRequest>,
    factory: Arc<Mutex<ResponseFactory>>,
    base_uri: String,
    default_options: RequestOptions,
}

impl TestHttpClient {
    /// Client answering from `factory` with the default base URI.
    #[must_use]
    pub fn new(factory: impl Into<ResponseFactory>) -> Self {
        Self::with_base_uri(factory, DEFAULT_BASE_URI)
    }

    /// Client answering from `factory`, resolving relative URLs against
    /// `base_uri`.
    #[must_use]
    pub fn with_base_uri(factory: impl Into<ResponseFactory>, base_uri: impl Into<String>) -> Self {
        Self {
            recorder: Recorder::new("http client requests"),
            factory: Arc::new(Mutex::new(factory.into())),
            base_uri: base_uri.into(),
            default_options: RequestOptions::new(),
        }
    }

    /// Client using the base URI and match policy from `settings`.
    #[must_use]
    pub fn from_settings(factory: impl Into<ResponseFactory>, settings: &Settings) -> Self {
        let client = Self::with_base_uri(factory, settings.http.base_uri.clone());
        client.recorder.set_policy(settings.policy);
        client
    }

    /// A new client sharing this one's responses and base URI, with
    /// `options` merged over the current defaults.
    ///
    /// The new client records its own requests.
    #[must_use]
    pub fn with_options(&self, options: RequestOptions) -> Self {
        let mut default_options = self.default_options.clone();
        default_options.extend(options);
        Self {
            recorder: Recorder::with_policy("http client requests", self.recorder.policy()),
            factory: Arc::clone(&self.factory),
            base_uri: self.base_uri.clone(),
            default_options,
        }
    }

    /// Base URI relative URLs resolve against.
    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Captured requests in call order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.recorder.events()
    }

    /// Expect the next request to use `method` on `uri`.
    #[track_caller]
    pub fn expect(&self, method: Method, uri: impl Into<Expected>) -> &Self {
        self.recorder.next();
        self.recorder
            .set("method", method.as_str(), |request: &RecordedRequest| json!(request.method.as_str()));
        self.recorder
            .set("uri", uri, |request: &RecordedRequest| json!(request.url.as_str()));
        self
    }

    /// Also check every request option.
    #[track_caller]
    pub fn options(&self, options: impl Into<Expected>) -> &Self {
        self.recorder.set("options", options, |request: &RecordedRequest| {
            Value::Object(request.options.clone())
        });
        self
    }

    /// Also check one request option; absent options read as null.
    #[track_caller]
    pub fn option(&self, name: &str, value: impl Into<Expected>) -> &Self {
        let key = name.to_owned();
        self.recorder
            .set(&format!("options.{name}"), value, move |request: &RecordedRequest| {
                request.options.get(&key).cloned().unwrap_or(Value::Null)
            });
        self
    }

    fn resolve(&self, url: &str) -> Result<Url> {
        let base = Url::parse(&self.base_uri)
            .map_err(|error| Error::InvalidUrl(format!("{}: {error}", self.base_uri)))?;
        base.join(url)
            .map_err(|error| Error::InvalidUrl(format!("{url}: {error}")))
    }
}

impl Default for TestHttpClient {
    fn default() -> Self {
        Self::new(ResponseFactory::Default)
    }
}

impl HttpClient for TestHttpClient {
    fn request(&self, method: Method, url: &str, options: RequestOptions) -> Result<MockResponse> {
        let url = self.resolve(url)?;
        let mut merged = self.default_options.clone();
        merged.extend(options);

        let pending = self
            .factory
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .next_response()?;
        let response = match pending {
            Pending::Ready(response) => response,
            Pending::Computed(callback) => callback(&method, &url, &merged),
        };

        self.recorder.record(RecordedRequest {
            method,
            url,
            options: merged,
        });
        Ok(response)
    }
}

impl Recording for TestHttpClient {
    type Event = RecordedRequest;

    fn recorder(&self) -> &Recorder<RecordedRequest> {
        &self.recorder
    }
}

impl Verify for TestHttpClient {
    fn assert(&self) -> CoreResult<(), TestFailure> {
        self.recorder.assert()
    }
}

impl Resettable for TestHttpClient {
    fn reset(&self) {
        self.recorder.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::OnceLock;

    use spyglass_core::MatchPolicy;
    use spyglass_core::matchers::{array_contains, starts_with};

    fn options(value: Value) -> RequestOptions {
        match value {
            Value::Object(map) => map,
            _ => RequestOptions::new(),
        }
    }

    #[test]
    fn test_relative_urls_resolve_against_base() {
        let client = TestHttpClient::default();
        let response = client.request(Method::GET, "/users", RequestOptions::new()).unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body(), "");
        client.expect(Method::GET, "https://example.com/users");
        client.verify();
    }

    #[test]
    fn test_absolute_urls_are_kept() {
        let client = TestHttpClient::with_base_uri(ResponseFactory::Default, "https://api.test");
        client
            .request(Method::POST, "https://other.test/hook", RequestOptions::new())
            .unwrap();

        assert_eq!(client.requests()[0].url.as_str(), "https://other.test/hook");
    }

    #[test]
    fn test_sequence_responses_run_out() {
        let client = TestHttpClient::new(vec![
            MockResponse::json(&json!({"id": 1})),
            MockResponse::new("gone").with_status(StatusCode::NOT_FOUND),
        ]);

        let first = client.request(Method::GET, "/a", RequestOptions::new()).unwrap();
        assert_eq!(first.to_json().unwrap(), json!({"id": 1}));
        assert_eq!(first.header("Content-Type"), Some("application/json"));
        let second = client.request(Method::GET, "/b", RequestOptions::new()).unwrap();
        assert_eq!(second.status(), StatusCode::NOT_FOUND);

        let error = client.request(Method::GET, "/c", RequestOptions::new()).unwrap_err();
        assert!(matches!(error, Error::ResponsesExhausted));
        assert_eq!(client.requests().len(), 2);
    }

    #[test]
    fn test_callback_factory_sees_the_request() {
        let client = TestHttpClient::new(ResponseFactory::callback(|method, url, _options| {
            MockResponse::new(format!("{method} {}", url.path()))
        }));

        let response = client.request(Method::DELETE, "/items/4", RequestOptions::new()).unwrap();
        assert_eq!(response.body(), "DELETE /items/4");
    }

    #[test]
    fn test_callback_factory_can_call_a_client_sharing_it() {
        let slot: Arc<OnceLock<TestHttpClient>> = Arc::new(OnceLock::new());
        let handle = Arc::clone(&slot);
        let client = TestHttpClient::new(ResponseFactory::callback(move |_method, url, _options| {
            if url.path() == "/outer"
                && let Some(sibling) = handle.get()
            {
                let nested = sibling.request(Method::GET, "/inner", RequestOptions::new()).unwrap();
                return MockResponse::new(format!("wrapped {}", nested.body()));
            }
            MockResponse::new("inner")
        }));
        slot.set(client.with_options(RequestOptions::new())).unwrap();

        let response = client.request(Method::GET, "/outer", RequestOptions::new()).unwrap();

        assert_eq!(response.body(), "wrapped inner");
        assert_eq!(client.requests().len(), 1);
        assert_eq!(slot.get().unwrap().requests()[0].url.path(), "/inner");
    }

    #[test]
    fn test_option_expectations() {
        let client = TestHttpClient::default();
        client
            .request(
                Method::POST,
                "/orders",
                options(json!({"json": {"sku": "A1"}, "timeout": 5})),
            )
            .unwrap();

        client
            .expect(Method::POST, starts_with("https://example.com/"))
            .option("json", json!({"sku": "A1"}))
            .option("headers", Value::Null)
            .options(array_contains([("timeout", Expected::from(5))], false));
        client.verify();
    }

    #[test]
    fn test_with_options_merges_defaults_and_shares_responses() {
        let client = TestHttpClient::new(vec![MockResponse::new("one"), MockResponse::new("two")]);
        let authed = client.with_options(options(json!({"headers": {"authorization": "Bearer t"}})));

        assert_eq!(client.request(Method::GET, "/", RequestOptions::new()).unwrap().body(), "one");
        assert_eq!(authed.request(Method::GET, "/", RequestOptions::new()).unwrap().body(), "two");

        authed
            .expect(Method::GET, "https://example.com/")
            .option("headers", json!({"authorization": "Bearer t"}));
        authed.verify();
        assert_eq!(client.requests().len(), 1);
    }

    #[test]
    fn test_from_settings() {
        let mut settings = Settings::default();
        settings.http.base_uri = "https://settings.test".to_owned();
        settings.policy = MatchPolicy::lenient();

        let client = TestHttpClient::from_settings(ResponseFactory::Default, &settings);
        client.request(Method::GET, "/x", RequestOptions::new()).unwrap();
        client.request(Method::GET, "/y", RequestOptions::new()).unwrap();

        client.expect(Method::GET, "https://settings.test/y");
        client.verify();
    }

    #[test]
    fn test_invalid_base_uri() {
        let client = TestHttpClient::with_base_uri(ResponseFactory::Default, "not a url");
        let error = client.request(Method::GET, "/", RequestOptions::new()).unwrap_err();
        assert!(matches!(error, Error::InvalidUrl(_)));
    }

    #[test]
    fn test_reset_and_method_mismatch() {
        let client = TestHttpClient::default();
        client.request(Method::GET, "/", RequestOptions::new()).unwrap();
        client.reset();
        client.request(Method::PUT, "/", RequestOptions::new()).unwrap();

        client.expect(Method::GET, "https://example.com/");
        let rendered = client.assert().unwrap_err().to_string();
        assert!(rendered.contains("http client requests"));
        assert!(rendered.contains("0.method"));
    }
}
