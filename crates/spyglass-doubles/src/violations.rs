//! Assertions over a list of validation violations.
//!
//! Unlike the other doubles nothing calls into [`TestViolationList`]: it wraps
//! violations a validator already produced, so the fluent builders can check
//! them with the same ordered/unordered matching.

use core::result::Result as CoreResult;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use spyglass_core::{Expected, Recorder, Recording, TestFailure, Verify};

/// One validation failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Violation {
    /// Rendered message
    pub message: String,
    /// Message before placeholder substitution
    pub message_template: String,
    /// Placeholder values
    pub parameters: Map<String, Value>,
    /// Pluralization count
    pub plural: Option<i64>,
    /// Path from the root to the invalid property
    pub path: String,
    /// Value that failed validation
    pub invalid_value: Value,
    /// Error code of the failing rule
    pub code: Option<String>,
    /// Name of the failing rule
    pub constraint: Option<String>,
    /// Object the validation started from
    pub root: Value,
}

impl Violation {
    /// Violation of `path` whose template is its rendered `message`.
    #[must_use]
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            message_template: message.clone(),
            message,
            path: path.into(),
            ..Self::default()
        }
    }
}

/// Violation list checked through fluent expectations.
#[derive(Debug)]
pub struct TestViolationList {
    recorder: Recorder<Violation>,
}

impl TestViolationList {
    /// List holding `violations` in order.
    #[must_use]
    pub fn new(violations: impl IntoIterator<Item = Violation>) -> Self {
        let list = Self {
            recorder: Recorder::new("constraint violations"),
        };
        for violation in violations {
            list.add(violation);
        }
        list
    }

    /// Append a violation.
    pub fn add(&self, violation: Violation) {
        self.recorder.record(violation);
    }

    /// Violations in order.
    pub fn violations(&self) -> Vec<Violation> {
        self.recorder.events()
    }

    /// Number of violations.
    pub fn len(&self) -> usize {
        self.recorder.len()
    }

    /// Whether validation passed.
    pub fn is_empty(&self) -> bool {
        self.recorder.is_empty()
    }

    /// Expect the next violation to carry `message`.
    #[track_caller]
    pub fn expect(&self, message: impl Into<Expected>) -> &Self {
        self.recorder.next();
        self.recorder
            .set("message", message, |violation: &Violation| json!(violation.message));
        self
    }

    /// Also check the property path.
    #[track_caller]
    pub fn path(&self, path: impl Into<Expected>) -> &Self {
        self.recorder
            .set("path", path, |violation: &Violation| json!(violation.path));
        self
    }

    /// Also check every placeholder value.
    #[track_caller]
    pub fn parameters(&self, parameters: impl Into<Expected>) -> &Self {
        self.recorder.set("parameters", parameters, |violation: &Violation| {
            Value::Object(violation.parameters.clone())
        });
        self
    }

    /// Also check the message template.
    #[track_caller]
    pub fn message_template(&self, template: impl Into<Expected>) -> &Self {
        self.recorder.set("messageTemplate", template, |violation: &Violation| {
            json!(violation.message_template)
        });
        self
    }

    /// Also check the invalid value.
    #[track_caller]
    pub fn invalid_value(&self, value: impl Into<Expected>) -> &Self {
        self.recorder.set("invalidValue", value, |violation: &Violation| {
            violation.invalid_value.clone()
        });
        self
    }

    /// Also check the pluralization count; unset reads as null.
    #[track_caller]
    pub fn plural(&self, plural: impl Into<Expected>) -> &Self {
        self.recorder
            .set("plural", plural, |violation: &Violation| json!(violation.plural));
        self
    }

    /// Also check the failing rule's name.
    #[track_caller]
    pub fn constraint(&self, constraint: impl Into<Expected>) -> &Self {
        self.recorder.set("constraint", constraint, |violation: &Violation| {
            json!(violation.constraint)
        });
        self
    }

    /// Also check the error code.
    #[track_caller]
    pub fn code(&self, code: impl Into<Expected>) -> &Self {
        self.recorder
            .set("code", code, |violation: &Violation| json!(violation.code));
        self
    }

    /// Also check the validation root.
    #[track_caller]
    pub fn root(&self, root: impl Into<Expected>) -> &Self {
        self.recorder
            .set("root", root, |violation: &Violation| violation.root.clone());
        self
    }
}

impl Default for TestViolationList {
    fn default() -> Self {
        Self::new([])
    }
}

impl FromIterator<Violation> for TestViolationList {
    fn from_iter<I: IntoIterator<Item = Violation>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl Recording for TestViolationList {
    type Event = Violation;

    fn recorder(&self) -> &Recorder<Violation> {
        &self.recorder
    }
}

impl Verify for TestViolationList {
    fn assert(&self) -> CoreResult<(), TestFailure> {
        self.recorder.assert()
    }
}
