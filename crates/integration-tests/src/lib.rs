//! Integration testing support for the spyglass doubles.
//!
//! Holds a sample service wired to every collaborator trait and a runner that
//! replays JSON logger scenarios from `tests/fixtures`.
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

/// Scenario fixture format
pub mod fixture;
/// Fixture loading and discovery
pub mod fixture_loader;
/// Scenario runner
pub mod runner;
/// Sample service under test
pub mod services;
/// Verification result types
pub mod verification_result;

pub use fixture::{ExpectationFixture, LogScenario, OutcomeFixture, RecordFixture};
pub use fixture_loader::{discover_fixtures, load_fixture};
pub use runner::ScenarioRunner;
pub use services::{Collaborators, SignupError, SignupService, UserRegistered};
pub use verification_result::VerificationResult;

use tracing_subscriber::fmt;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt as _, registry, util::SubscriberInitExt as _};

/// Install a test-writer subscriber filtered by `RUST_LOG`; later calls are
/// no-ops.
pub fn init_tracing() {
    drop(
        registry()
            .with(fmt::layer().with_test_writer().with_target(false))
            .with(EnvFilter::from_default_env())
            .try_init(),
    );
}
