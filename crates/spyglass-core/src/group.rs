//! Constraint groups: every field constraint declared for one expectation.

use core::fmt;

use crate::constraint::{FieldConstraint, FieldMismatch};

/// The field constraints of one expectation index.
///
/// A group passes only if every constraint passes against the same event.
pub struct ConstraintGroup<E> {
    index: usize,
    constraints: Vec<FieldConstraint<E>>,
}

impl<E> Clone for ConstraintGroup<E> {
    fn clone(&self) -> Self {
        Self {
            index: self.index,
            constraints: self.constraints.clone(),
        }
    }
}

impl<E> ConstraintGroup<E> {
    /// Create an empty group for expectation `index`.
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self {
            index,
            constraints: Vec::new(),
        }
    }

    /// Create a group from existing constraints.
    #[must_use]
    pub fn with_constraints(index: usize, constraints: Vec<FieldConstraint<E>>) -> Self {
        Self { index, constraints }
    }

    /// Expectation index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Field constraints in declaration order.
    pub fn constraints(&self) -> &[FieldConstraint<E>] {
        &self.constraints
    }

    /// Whether a field with `name` is already declared.
    pub fn contains(&self, name: &str) -> bool {
        self.constraints
            .iter()
            .any(|constraint| constraint.name() == name)
    }

    pub(crate) fn push(&mut self, constraint: FieldConstraint<E>) {
        self.constraints.push(constraint);
    }

    /// Whether every field of `event` satisfies its constraint. Stops at the
    /// first failing field.
    pub fn matches(&self, event: &E) -> bool {
        self.constraints
            .iter()
            .all(|constraint| constraint.matches(event))
    }

    /// Evaluate every field against `event`.
    ///
    /// # Errors
    /// Returns every failing field, not only the first one. Field names are
    /// qualified with the expectation index (`0.level`).
    pub fn evaluate(&self, event: &E) -> Result<(), Vec<FieldMismatch>> {
        let failures: Vec<FieldMismatch> = self
            .constraints
            .iter()
            .filter_map(|constraint| constraint.evaluate(event).err())
            .map(|failure| FieldMismatch {
                field: format!("{}.{}", self.index, failure.field),
                mismatch: failure.mismatch,
            })
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(failures)
        }
    }

    /// One line per field, qualified with the expectation index.
    pub fn describe(&self) -> String {
        self.constraints
            .iter()
            .map(|constraint| format!("{}.{}", self.index, constraint.describe()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl<E> fmt::Debug for ConstraintGroup<E> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ConstraintGroup")
            .field("index", &self.index)
            .field("constraints", &self.constraints)
            .finish()
    }
}
