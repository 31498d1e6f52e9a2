//! Declarative expectations over recorded calls.
//!
//! This crate provides the matching machinery shared by every test double:
//! - [`Expected`] values and the built-in [`matchers`]
//! - [`FieldConstraint`] and [`ConstraintGroup`] describing one expected call
//! - [`reconcile`] pairing expectations with recorded events in sequence or
//!   in any order
//! - [`Recorder`] and [`Inspector`], which report every mismatch as a single
//!   [`TestFailure`]
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
        reason = "Allow for tests"
    )
)]

/// Matching policy and settings files.
pub mod config;
/// Field constraints.
pub mod constraint;
/// Error types and result definitions.
pub mod error;
/// Builder state for indexed expectations.
pub mod expectations;
/// Expected values, matcher trait and mismatch reports.
pub mod expected;
/// Aggregate assertion failures.
pub mod failure;
/// Constraint groups.
pub mod group;
/// Single-subject assertions.
pub mod inspector;
/// Built-in matchers.
pub mod matchers;
/// Sequence and unordered matching.
pub mod reconcile;
/// Recorder base shared by the doubles.
pub mod recorder;

pub use config::{HttpSettings, MatchPolicy, Settings};
pub use constraint::{FieldConstraint, FieldMismatch};
pub use error::{Error, Result};
pub use expectations::ExpectationSet;
pub use expected::{Diff, Expected, Matcher, Mismatch, export};
pub use failure::{Failure, TestFailure};
pub use group::ConstraintGroup;
pub use inspector::Inspector;
pub use reconcile::reconcile;
pub use recorder::{Recorder, Recording, Resettable, Verify};
