//! Replays logger scenarios against a [`TestLogger`].

use std::path::Path;

use anyhow::Result;
use spyglass_core::{Recording as _, Verify as _};
use spyglass_doubles::{Logger as _, TestLogger};
use tracing::debug;

use crate::fixture::LogScenario;
use crate::fixture_loader::load_fixture;
use crate::verification_result::VerificationResult;

/// Runs one [`LogScenario`].
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    scenario: LogScenario,
}

impl ScenarioRunner {
    /// Runner for an already parsed scenario.
    #[must_use]
    pub fn new(scenario: LogScenario) -> Self {
        Self { scenario }
    }

    /// Runner for the scenario stored at `path`.
    ///
    /// # Errors
    /// Returns an error if the fixture cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(Self::new(load_fixture(path)?))
    }

    /// Scenario being run.
    pub fn scenario(&self) -> &LogScenario {
        &self.scenario
    }

    /// Replay the records, declare the expectations, then assert twice and
    /// compare both outcomes with the fixture.
    pub fn run(&self) -> VerificationResult {
        let scenario = &self.scenario;
        let logger = TestLogger::new();
        logger.recorder().set_policy(scenario.policy);

        for record in &scenario.records {
            logger.log(record.level, &record.message, record.context.clone());
        }
        for expectation in &scenario.expectations {
            logger.expect(expectation.level, expectation.message_expected());
            if let Some(context) = &expectation.context {
                logger.context(context.clone());
            }
        }

        let first = logger.assert();
        let second = logger.assert();
        debug!(scenario = %scenario.name, passed = first.is_ok(), "Scenario asserted");

        let mut result = VerificationResult::new();
        result.check(
            first == second,
            format!("{}: repeated assert gives the same outcome", scenario.name),
        );

        match (&first, scenario.outcome.passes) {
            (Ok(()), true) => result.add_success(format!("{}: passes", scenario.name)),
            (Ok(()), false) => result.add_failure(format!("{}: expected a failure, assert passed", scenario.name)),
            (Err(failure), true) => {
                result.add_failure(format!("{}: expected a pass, got:\n{failure}", scenario.name));
            }
            (Err(failure), false) => {
                let rendered = failure.to_string();
                for fragment in &scenario.outcome.failure_contains {
                    result.check(
                        rendered.contains(fragment.as_str()),
                        format!("{}: failure contains {fragment:?} in:\n{rendered}", scenario.name),
                    );
                }
            }
        }

        result
    }
}
