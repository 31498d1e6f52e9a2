//! Pass/fail ledger filled by [`ScenarioRunner`](crate::ScenarioRunner).

/// Checks made while replaying scenarios, split by outcome.
#[derive(Debug, Clone)]
pub struct VerificationResult {
    /// False once any check failed
    pub passed: bool,
    /// Messages of the checks that failed
    pub failures: Vec<String>,
    /// Messages of the checks that held
    pub successes: Vec<String>,
}

impl VerificationResult {
    /// Ledger with no checks, counted as passing.
    #[must_use]
    pub fn new() -> Self {
        Self {
            passed: true,
            failures: Vec::new(),
            successes: Vec::new(),
        }
    }

    /// Note a check that held.
    pub fn add_success(&mut self, message: String) {
        self.successes.push(message);
    }

    /// Note a check that failed; the ledger no longer passes.
    pub fn add_failure(&mut self, message: String) {
        self.passed = false;
        self.failures.push(message);
    }

    /// Note `message` on the side picked by `passed`.
    pub fn check(&mut self, passed: bool, message: String) {
        if passed {
            self.add_success(message);
        } else {
            self.add_failure(message);
        }
    }

    /// Fold the checks of another scenario into this ledger.
    pub fn merge(&mut self, other: Self) {
        self.passed &= other.passed;
        self.failures.extend(other.failures);
        self.successes.extend(other.successes);
    }

    /// Failure messages joined for a panic message.
    pub fn report(&self) -> String {
        self.failures.join("\n\n")
    }
}

impl Default for VerificationResult {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_failures() {
        let mut result = VerificationResult::new();
        result.check(true, "first".to_owned());

        let mut other = VerificationResult::new();
        other.check(false, "second".to_owned());
        result.merge(other);

        assert!(!result.passed);
        assert_eq!(result.successes, vec!["first".to_owned()]);
        assert_eq!(result.failures, vec!["second".to_owned()]);
    }

    #[test]
    fn test_merging_a_passing_ledger_keeps_the_failure() {
        let mut result = VerificationResult::default();
        result.add_failure("level differs".to_owned());
        result.add_failure("message differs".to_owned());
        result.merge(VerificationResult::new());

        assert!(!result.passed);
        assert!(result.successes.is_empty());
        assert_eq!(result.report(), "level differs\n\nmessage differs");
    }
}
