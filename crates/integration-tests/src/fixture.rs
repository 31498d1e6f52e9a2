//! Logger scenario fixture format.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use spyglass_core::matchers::{any_value, contains_str};
use spyglass_core::{Expected, MatchPolicy};
use spyglass_doubles::Level;

/// One logger scenario: calls to replay, expectations to declare and the
/// outcome `assert()` must produce.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogScenario {
    /// Scenario name
    pub name: String,
    /// What the scenario checks
    #[serde(default)]
    pub description: String,
    /// Matching policy, strict when omitted
    #[serde(default)]
    pub policy: MatchPolicy,
    /// Log calls replayed into the logger, in order
    #[serde(default)]
    pub records: Vec<RecordFixture>,
    /// Expectations declared before asserting
    #[serde(default)]
    pub expectations: Vec<ExpectationFixture>,
    /// Expected result of `assert()`
    pub outcome: OutcomeFixture,
}

/// A log call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordFixture {
    /// Severity
    pub level: Level,
    /// Message text
    pub message: String,
    /// Structured context
    #[serde(default)]
    pub context: Map<String, Value>,
}

/// A logger expectation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpectationFixture {
    /// Expected severity
    pub level: Level,
    /// Exact message
    #[serde(default)]
    pub message: Option<String>,
    /// Substring the message must contain; wins over `message`
    #[serde(default)]
    pub message_contains: Option<String>,
    /// Exact context, unchecked when absent
    #[serde(default)]
    pub context: Option<Map<String, Value>>,
}

impl ExpectationFixture {
    /// Expected value for the message field.
    pub fn message_expected(&self) -> Expected {
        match (&self.message_contains, &self.message) {
            (Some(needle), _) => contains_str(needle.clone()),
            (None, Some(message)) => Expected::from(message.as_str()),
            (None, None) => any_value(),
        }
    }
}

/// Expected assertion outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeFixture {
    /// Whether `assert()` succeeds
    pub passes: bool,
    /// Fragments the rendered failure must contain
    #[serde(default)]
    pub failure_contains: Vec<String>,
}
