//! Fluent expectation builder state.

use core::fmt;

use serde_json::Value;

use crate::constraint::FieldConstraint;
use crate::error::{Error, Result};
use crate::expected::Expected;
use crate::group::ConstraintGroup;

/// Accumulates declared expectations, one [`ConstraintGroup`] per index.
///
/// [`next`](Self::next) opens a new expectation; [`try_set`](Self::try_set)
/// appends fields to the most recently opened one.
pub struct ExpectationSet<E> {
    groups: Vec<ConstraintGroup<E>>,
}

impl<E> ExpectationSet<E> {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self { groups: Vec::new() }
    }

    /// Open the next expectation and return its index.
    pub fn next(&mut self) -> usize {
        let index = self.groups.len();
        self.groups.push(ConstraintGroup::new(index));
        index
    }

    /// Index of the expectation receiving new fields.
    pub fn current(&self) -> Option<usize> {
        self.groups.len().checked_sub(1)
    }

    /// Declare a field on the current expectation.
    ///
    /// # Errors
    /// Returns [`Error::NoExpectation`] if [`next`](Self::next) was never
    /// called and [`Error::Redefined`] if the current expectation already
    /// declares `name`.
    pub fn try_set<F>(&mut self, name: &str, expected: impl Into<Expected>, accessor: F) -> Result<()>
    where
        F: Fn(&E) -> Value + Send + Sync + 'static,
    {
        let Some(group) = self.groups.last_mut() else {
            return Err(Error::NoExpectation {
                name: name.to_owned(),
            });
        };
        if group.contains(name) {
            return Err(Error::Redefined {
                index: group.index(),
                name: name.to_owned(),
            });
        }
        group.push(FieldConstraint::new(name, expected, accessor));
        Ok(())
    }

    /// Declared groups in index order.
    pub fn groups(&self) -> &[ConstraintGroup<E>] {
        &self.groups
    }

    /// Number of declared expectations.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether no expectation was declared.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Forget every declared expectation; indexes restart at zero.
    pub fn clear(&mut self) {
        self.groups.clear();
    }
}

impl<E> Default for ExpectationSet<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for ExpectationSet<E> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ExpectationSet")
            .field("groups", &self.groups)
            .finish()
    }
}
