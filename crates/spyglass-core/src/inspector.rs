//! Assertions over a single captured subject.

use core::fmt;
use core::result::Result as CoreResult;

use serde_json::Value;

use crate::constraint::FieldConstraint;
use crate::error::{Error, Result};
use crate::expected::Expected;
use crate::failure::{Failure, TestFailure};
use crate::recorder::Verify;

/// Named field constraints evaluated against one subject.
///
/// Unlike a [`Recorder`](crate::Recorder) there is no sequence: every
/// constraint is checked against the same value and every failing field is
/// reported.
pub struct Inspector<T> {
    name: &'static str,
    subject: T,
    constraints: Vec<FieldConstraint<T>>,
    description: Option<String>,
}

impl<T> Inspector<T> {
    /// Inspect `subject`, referred to as `name` in failure messages.
    #[must_use]
    pub fn new(name: &'static str, subject: T) -> Self {
        Self {
            name,
            subject,
            constraints: Vec::new(),
            description: None,
        }
    }

    /// The inspected subject.
    pub fn subject(&self) -> &T {
        &self.subject
    }

    /// Declare a field constraint.
    ///
    /// # Errors
    /// Returns [`Error::Redefined`] (at index 0) if `name` is already
    /// declared.
    pub fn try_set<F>(&mut self, name: &str, expected: impl Into<Expected>, accessor: F) -> Result<&mut Self>
    where
        F: Fn(&T) -> Value + Send + Sync + 'static,
    {
        if self.constraints.iter().any(|constraint| constraint.name() == name) {
            return Err(Error::Redefined {
                index: 0,
                name: name.to_owned(),
            });
        }
        self.constraints
            .push(FieldConstraint::new(name, expected, accessor));
        Ok(self)
    }

    /// Declare a field constraint.
    ///
    /// # Panics
    /// Panics at the caller if `name` is already declared.
    #[track_caller]
    pub fn set<F>(&mut self, name: &str, expected: impl Into<Expected>, accessor: F) -> &mut Self
    where
        F: Fn(&T) -> Value + Send + Sync + 'static,
    {
        if let Err(error) = self.try_set(name, expected, accessor) {
            panic!("{error}");
        }
        self
    }

    /// Prefix failure blocks with `description`.
    pub fn describe(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    /// Number of declared constraints.
    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    /// Whether nothing was declared.
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }
}

impl<T> Verify for Inspector<T> {
    fn assert(&self) -> CoreResult<(), TestFailure> {
        let failures: Vec<Failure> = self
            .constraints
            .iter()
            .filter_map(|constraint| constraint.evaluate(&self.subject).err())
            .map(Failure::Field)
            .collect();

        if failures.is_empty() {
            return Ok(());
        }
        tracing::debug!(
            subject = self.name,
            failures = failures.len(),
            "inspection failed"
        );
        Err(TestFailure::new(self.name, failures).with_description(self.description.clone()))
    }
}

impl<T: fmt::Debug> fmt::Debug for Inspector<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Inspector")
            .field("name", &self.name)
            .field("subject", &self.subject)
            .field("constraints", &self.constraints)
            .finish_non_exhaustive()
    }
}
