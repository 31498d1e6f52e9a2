//! Field constraints: one expected value bound to one accessor.

use core::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::expected::{Expected, Mismatch};

/// Extracts the comparable field from a recorded event.
pub type Accessor<E> = Arc<dyn Fn(&E) -> Value + Send + Sync>;

/// A failing field: its name and what went wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMismatch {
    /// Field name, qualified by the expectation index when part of a group
    pub field: String,
    /// Comparison failure
    pub mismatch: Mismatch,
}

impl fmt::Display for FieldMismatch {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}\n{}", self.field, self.mismatch)
    }
}

/// A named expectation over one field of a recorded event.
pub struct FieldConstraint<E> {
    name: String,
    expected: Expected,
    accessor: Accessor<E>,
}

impl<E> Clone for FieldConstraint<E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            expected: self.expected.clone(),
            accessor: Arc::clone(&self.accessor),
        }
    }
}

impl<E> FieldConstraint<E> {
    /// Bind `expected` to the field extracted by `accessor`.
    pub fn new<F>(name: impl Into<String>, expected: impl Into<Expected>, accessor: F) -> Self
    where
        F: Fn(&E) -> Value + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            expected: expected.into(),
            accessor: Arc::new(accessor),
        }
    }

    /// Field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Expected value or matcher.
    pub fn expected(&self) -> &Expected {
        &self.expected
    }

    /// Whether the field of `event` satisfies the expectation.
    pub fn matches(&self, event: &E) -> bool {
        self.expected.matches(&(self.accessor)(event))
    }

    /// Evaluate against `event`.
    ///
    /// # Errors
    /// Returns the failing field when the extracted value does not match.
    pub fn evaluate(&self, event: &E) -> Result<(), FieldMismatch> {
        self.expected
            .evaluate(&(self.accessor)(event))
            .map_err(|mismatch| FieldMismatch {
                field: self.name.clone(),
                mismatch,
            })
    }

    /// "<name> <expectation>" line used in unmatched-expectation reports.
    pub fn describe(&self) -> String {
        format!("{} {}", self.name, self.expected.describe())
    }
}

impl<E> fmt::Debug for FieldConstraint<E> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("FieldConstraint")
            .field("name", &self.name)
            .field("expected", &self.expected)
            .finish_non_exhaustive()
    }
}
