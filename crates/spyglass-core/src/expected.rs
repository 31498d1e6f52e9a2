//! Expected values and the matcher abstraction.
//!
//! Every field constraint compares a [`Value`] extracted from a recorded
//! event against an [`Expected`]. Literals are compared by identity; anything
//! smarter implements [`Matcher`].

use core::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

/// Renders a value the way failure messages show it.
///
/// Scalars use their compact JSON form, lists and maps are pretty-printed so
/// that diffs line up one entry per line.
pub fn export(value: &Value) -> String {
    match value {
        Value::Array(_) | Value::Object(_) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => value.to_string(),
    }
}

/// Expected-versus-actual rendering attached to a [`Mismatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diff {
    /// Exported expected value
    pub expected: String,
    /// Exported actual value
    pub actual: String,
}

impl Diff {
    fn render(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let expected: Vec<&str> = self.expected.lines().collect();
        let actual: Vec<&str> = self.actual.lines().collect();

        let prefix = expected
            .iter()
            .zip(&actual)
            .take_while(|(left, right)| left == right)
            .count();
        let suffix = expected[prefix..]
            .iter()
            .rev()
            .zip(actual[prefix..].iter().rev())
            .take_while(|(left, right)| left == right)
            .count();

        write!(formatter, "--- Expected\n+++ Actual\n@@ @@")?;
        for line in &expected[..prefix] {
            write!(formatter, "\n {line}")?;
        }
        for line in &expected[prefix..expected.len() - suffix] {
            write!(formatter, "\n-{line}")?;
        }
        for line in &actual[prefix..actual.len() - suffix] {
            write!(formatter, "\n+{line}")?;
        }
        for line in &expected[expected.len() - suffix..] {
            write!(formatter, "\n {line}")?;
        }
        Ok(())
    }
}

/// Description of a single failed comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    message: String,
    diff: Option<Diff>,
}

impl Mismatch {
    /// Create a mismatch with a plain message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            diff: None,
        }
    }

    /// Attach an expected-versus-actual diff.
    #[must_use]
    pub fn with_diff(mut self, expected: &Value, actual: &Value) -> Self {
        self.diff = Some(Diff {
            expected: export(expected),
            actual: export(actual),
        });
        self
    }

    /// Failure message without the diff.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Attached diff, if any.
    pub fn diff(&self) -> Option<&Diff> {
        self.diff.as_ref()
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.message)?;
        if let Some(diff) = &self.diff {
            formatter.write_str("\n")?;
            diff.render(formatter)?;
        }
        Ok(())
    }
}

/// A reusable comparison over extracted field values.
pub trait Matcher: Send + Sync {
    /// Whether `actual` satisfies this matcher.
    fn matches(&self, actual: &Value) -> bool;

    /// Short description completing "Failed asserting that <actual> ...".
    fn describe(&self) -> String;

    /// Build the failure reported when `actual` does not match.
    fn mismatch(&self, actual: &Value) -> Mismatch {
        Mismatch::new(format!(
            "Failed asserting that {} {}.",
            export(actual),
            self.describe()
        ))
    }
}

/// An expected field value: either a literal compared by identity or a
/// [`Matcher`].
#[derive(Clone)]
pub enum Expected {
    /// Compare by identity with this value.
    Identical(Value),
    /// Delegate to a matcher.
    Matcher(Arc<dyn Matcher>),
}

impl Expected {
    /// Wrap a matcher.
    #[must_use]
    pub fn matcher<M: Matcher + 'static>(matcher: M) -> Self {
        Self::Matcher(Arc::new(matcher))
    }

    /// Whether `actual` satisfies this expectation.
    pub fn matches(&self, actual: &Value) -> bool {
        match self {
            Self::Identical(expected) => expected == actual,
            Self::Matcher(matcher) => matcher.matches(actual),
        }
    }

    /// Compare `actual`, describing the failure when it does not satisfy
    /// this expectation.
    ///
    /// # Errors
    /// Returns the mismatch description when `actual` does not match.
    pub fn evaluate(&self, actual: &Value) -> Result<(), Mismatch> {
        if self.matches(actual) {
            return Ok(());
        }
        Err(match self {
            Self::Identical(expected) => identity_mismatch(expected, actual),
            Self::Matcher(matcher) => matcher.mismatch(actual),
        })
    }

    /// Human readable description of what is expected.
    pub fn describe(&self) -> String {
        match self {
            Self::Identical(expected) => format!("is identical to {}", export(expected)),
            Self::Matcher(matcher) => matcher.describe(),
        }
    }
}

fn identity_mismatch(expected: &Value, actual: &Value) -> Mismatch {
    let kind = match (expected, actual) {
        (Value::String(_), Value::String(_)) => Some("strings"),
        (Value::Array(_), Value::Array(_)) => Some("arrays"),
        (Value::Object(_), Value::Object(_)) => Some("objects"),
        _ => None,
    };
    match kind {
        Some(kind) => Mismatch::new(format!("Failed asserting that two {kind} are identical."))
            .with_diff(expected, actual),
        None => Mismatch::new(format!(
            "Failed asserting that {} is identical to {}.",
            export(actual),
            export(expected)
        )),
    }
}

impl fmt::Debug for Expected {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_tuple("Expected")
            .field(&self.describe())
            .finish()
    }
}

impl From<Value> for Expected {
    fn from(value: Value) -> Self {
        Self::Identical(value)
    }
}

impl From<Map<String, Value>> for Expected {
    fn from(value: Map<String, Value>) -> Self {
        Self::Identical(Value::Object(value))
    }
}

impl From<Vec<Value>> for Expected {
    fn from(value: Vec<Value>) -> Self {
        Self::Identical(Value::Array(value))
    }
}

impl From<&str> for Expected {
    fn from(value: &str) -> Self {
        Self::Identical(Value::from(value))
    }
}

impl From<String> for Expected {
    fn from(value: String) -> Self {
        Self::Identical(Value::from(value))
    }
}

impl From<bool> for Expected {
    fn from(value: bool) -> Self {
        Self::Identical(Value::from(value))
    }
}

impl From<i32> for Expected {
    fn from(value: i32) -> Self {
        Self::Identical(Value::from(value))
    }
}

impl From<i64> for Expected {
    fn from(value: i64) -> Self {
        Self::Identical(Value::from(value))
    }
}

impl From<u32> for Expected {
    fn from(value: u32) -> Self {
        Self::Identical(Value::from(value))
    }
}

impl From<u64> for Expected {
    fn from(value: u64) -> Self {
        Self::Identical(Value::from(value))
    }
}

impl From<usize> for Expected {
    fn from(value: usize) -> Self {
        Self::Identical(Value::from(value))
    }
}

impl From<f64> for Expected {
    fn from(value: f64) -> Self {
        Self::Identical(Value::from(value))
    }
}
