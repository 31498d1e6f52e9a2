//! Aggregate assertion failures.

use core::fmt;
use std::error::Error as StdError;

use crate::constraint::FieldMismatch;

/// One reason an assertion failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// The event recorded at the expectation's position did not match.
    Mismatch {
        /// Expectation index
        index: usize,
        /// Every failing field
        fields: Vec<FieldMismatch>,
    },
    /// No event was recorded at the expectation's position.
    Missing {
        /// Expectation index
        index: usize,
        /// Rendered constraints of the expectation
        description: String,
    },
    /// No remaining event satisfied the expectation.
    Unmatched {
        /// Expectation index
        index: usize,
        /// Rendered constraints of the expectation
        description: String,
    },
    /// Recorded events left over after matching.
    Unexpected {
        /// Recorded position and debug rendering of each leftover event
        elements: Vec<(usize, String)>,
    },
    /// A field of a single inspected subject did not match.
    Field(FieldMismatch),
}

impl Failure {
    fn render(&self, subject: &str, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mismatch { index, fields } => {
                writeln!(
                    formatter,
                    "Failed asserting that the {subject} contains an element at index {index} that matches the following constraint(s):"
                )?;
                let rendered: Vec<String> = fields.iter().map(ToString::to_string).collect();
                formatter.write_str(&rendered.join("\n\n"))
            }
            Self::Missing { index, description } => write!(
                formatter,
                "Failed asserting that the {subject} contains an element at index {index} that matches the following constraint(s):\n{description}\n(no element recorded at this position)"
            ),
            Self::Unmatched { description, .. } => write!(
                formatter,
                "Failed asserting that the {subject} contains an element that matches the following constraint(s):\n{description}"
            ),
            Self::Unexpected { elements } => {
                write!(
                    formatter,
                    "Failed asserting that the {subject} does not contain the following element(s):"
                )?;
                for (position, element) in elements {
                    write!(formatter, "\n[{position}] {element}")?;
                }
                Ok(())
            }
            Self::Field(field) => write!(
                formatter,
                "Failed asserting that the {subject} matches the following constraint:\n{field}"
            ),
        }
    }
}

/// The single failure raised by `assert()` once every mismatch is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestFailure {
    subject: String,
    description: Option<String>,
    failures: Vec<Failure>,
}

impl TestFailure {
    /// Aggregate `failures` observed on `subject` ("logger", "mailer", ...).
    #[must_use]
    pub fn new(subject: impl Into<String>, failures: Vec<Failure>) -> Self {
        Self {
            subject: subject.into(),
            description: None,
            failures,
        }
    }

    /// Prefix every failure block with `description`.
    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Subject the failures were observed on.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Individual failures in report order.
    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }
}

impl fmt::Display for TestFailure {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, failure) in self.failures.iter().enumerate() {
            if position > 0 {
                formatter.write_str("\n\n")?;
            }
            if let Some(description) = &self.description {
                writeln!(formatter, "{description}")?;
            }
            failure.render(&self.subject, formatter)?;
        }
        Ok(())
    }
}

impl StdError for TestFailure {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expected::Mismatch;

    #[test]
    fn test_render_unmatched_and_unexpected() {
        let failure = TestFailure::new(
            "mailer",
            vec![
                Failure::Unmatched {
                    index: 0,
                    description: "0.message contains \"hello\"".to_owned(),
                },
                Failure::Unexpected {
                    elements: vec![(1, "Sent".to_owned())],
                },
            ],
        );

        assert_eq!(
            failure.to_string(),
            "Failed asserting that the mailer contains an element that matches the following constraint(s):\n0.message contains \"hello\"\n\nFailed asserting that the mailer does not contain the following element(s):\n[1] Sent"
        );
    }

    #[test]
    fn test_render_with_description() {
        let failure = TestFailure::new(
            "form",
            vec![Failure::Field(FieldMismatch {
                field: "required".to_owned(),
                mismatch: Mismatch::new("Failed asserting that false is identical to true."),
            })],
        )
        .with_description(Some("Checkout form".to_owned()));

        assert_eq!(
            failure.to_string(),
            "Checkout form\nFailed asserting that the form matches the following constraint:\nrequired\nFailed asserting that false is identical to true."
        );
        assert_eq!(failure.subject(), "form");
        assert_eq!(failure.failures().len(), 1);
    }
}
