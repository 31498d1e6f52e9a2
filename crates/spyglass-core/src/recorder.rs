//! Shared state of every recording double.

use core::fmt;
use core::result::Result as CoreResult;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use crate::config::MatchPolicy;
use crate::error::Result;
use crate::expectations::ExpectationSet;
use crate::expected::Expected;
use crate::failure::TestFailure;
use crate::reconcile::reconcile;

/// Terminal assertion over declared expectations.
pub trait Verify {
    /// Reconcile expectations with what was recorded.
    ///
    /// # Errors
    /// Returns one [`TestFailure`] describing every mismatch.
    fn assert(&self) -> CoreResult<(), TestFailure>;

    /// Like [`assert`](Self::assert) but panics with the rendered failure.
    ///
    /// # Panics
    /// Panics if the assertion fails.
    #[track_caller]
    fn verify(&self) {
        if let Err(failure) = self.assert() {
            panic!("{failure}");
        }
    }
}

/// Doubles whose recorded calls can be discarded mid-test.
pub trait Resettable {
    /// Forget recorded calls. Declared expectations are kept.
    fn reset(&self);
}

/// Doubles built on a [`Recorder`].
///
/// The provided methods forward the policy toggles so every double exposes
/// them fluently.
pub trait Recording {
    /// Recorded event type.
    type Event: fmt::Debug;

    /// Underlying recorder.
    fn recorder(&self) -> &Recorder<Self::Event>;

    /// Let expectations match recorded events in any order.
    fn disable_strict_sequence(&self) -> &Self {
        self.recorder().disable_strict_sequence();
        self
    }

    /// Ignore recorded events no expectation claimed.
    fn disable_strict_size(&self) -> &Self {
        self.recorder().disable_strict_size();
        self
    }

    /// Prefix failure blocks with `description`.
    fn with_description(&self, description: &str) -> &Self {
        self.recorder().describe(description);
        self
    }
}

struct RecorderState<E> {
    events: Vec<E>,
    expectations: ExpectationSet<E>,
    policy: MatchPolicy,
    description: Option<String>,
}

/// Recorded events plus the expectations they are checked against.
///
/// State sits behind a mutex so a double shared through `Arc` with the code
/// under test can still be configured and asserted through `&self`.
pub struct Recorder<E> {
    subject: &'static str,
    state: Mutex<RecorderState<E>>,
}

impl<E: fmt::Debug> Recorder<E> {
    /// Create a recorder named `subject` in failure messages, using the
    /// strict default policy.
    #[must_use]
    pub fn new(subject: &'static str) -> Self {
        Self::with_policy(subject, MatchPolicy::default())
    }

    /// Create a recorder with an explicit policy.
    #[must_use]
    pub fn with_policy(subject: &'static str, policy: MatchPolicy) -> Self {
        Self {
            subject,
            state: Mutex::new(RecorderState {
                events: Vec::new(),
                expectations: ExpectationSet::new(),
                policy,
                description: None,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, RecorderState<E>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Subject name used in failure messages.
    pub fn subject(&self) -> &'static str {
        self.subject
    }

    /// Append a recorded event.
    pub fn record(&self, event: E) {
        let mut state = self.state();
        state.events.push(event);
        tracing::trace!(
            subject = self.subject,
            position = state.events.len() - 1,
            "recorded event"
        );
    }

    /// Copy of the recorded events.
    pub fn events(&self) -> Vec<E>
    where
        E: Clone,
    {
        self.state().events.clone()
    }

    /// Read the recorded events without copying them.
    pub fn with_events<R>(&self, read: impl FnOnce(&[E]) -> R) -> R {
        read(&self.state().events)
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.state().events.len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.state().events.is_empty()
    }

    /// Forget declared expectations, keeping recorded events.
    pub fn clear_expectations(&self) {
        self.state().expectations.clear();
    }

    /// Open the next expectation and return its index.
    pub fn next(&self) -> usize {
        self.state().expectations.next()
    }

    /// Declare a field on the current expectation.
    ///
    /// # Errors
    /// Returns a configuration error if no expectation is open or the field
    /// is already declared on it.
    pub fn try_set<F>(&self, name: &str, expected: impl Into<Expected>, accessor: F) -> Result<()>
    where
        F: Fn(&E) -> Value + Send + Sync + 'static,
    {
        self.state().expectations.try_set(name, expected, accessor)
    }

    /// Declare a field on the current expectation.
    ///
    /// # Panics
    /// Panics at the caller if no expectation is open or the field is
    /// already declared on it.
    #[track_caller]
    pub fn set<F>(&self, name: &str, expected: impl Into<Expected>, accessor: F)
    where
        F: Fn(&E) -> Value + Send + Sync + 'static,
    {
        if let Err(error) = self.try_set(name, expected, accessor) {
            panic!("{error}");
        }
    }

    /// Number of declared expectations.
    pub fn expectation_count(&self) -> usize {
        self.state().expectations.len()
    }

    /// Active policy.
    pub fn policy(&self) -> MatchPolicy {
        self.state().policy
    }

    /// Replace the policy.
    pub fn set_policy(&self, policy: MatchPolicy) {
        self.state().policy = policy;
    }

    /// Let expectations match recorded events in any order.
    pub fn disable_strict_sequence(&self) {
        self.state().policy.strict_sequence = false;
    }

    /// Ignore recorded events no expectation claimed.
    pub fn disable_strict_size(&self) {
        self.state().policy.strict_size = false;
    }

    /// Prefix failure blocks with `description`.
    pub fn describe(&self, description: impl Into<String>) {
        self.state().description = Some(description.into());
    }

    /// Reconcile under an explicit policy.
    ///
    /// # Errors
    /// Returns one [`TestFailure`] describing every mismatch.
    pub fn assert_with(&self, policy: MatchPolicy) -> CoreResult<(), TestFailure>
    where
        E: Clone,
    {
        // Matchers and accessors may read this recorder, so they run unlocked.
        let (groups, events, description) = {
            let state = self.state();
            (
                state.expectations.groups().to_vec(),
                state.events.clone(),
                state.description.clone(),
            )
        };
        let failures = reconcile(&groups, &events, policy);

        if failures.is_empty() {
            tracing::debug!(
                subject = self.subject,
                expectations = groups.len(),
                recorded = events.len(),
                "assertion passed"
            );
            return Ok(());
        }

        tracing::debug!(
            subject = self.subject,
            failures = failures.len(),
            "assertion failed"
        );
        Err(TestFailure::new(self.subject, failures).with_description(description))
    }
}

impl<E: fmt::Debug + Clone> Verify for Recorder<E> {
    fn assert(&self) -> CoreResult<(), TestFailure> {
        let policy = self.policy();
        self.assert_with(policy)
    }
}

impl<E: fmt::Debug> Resettable for Recorder<E> {
    fn reset(&self) {
        self.state().events.clear();
    }
}

impl<E> fmt::Debug for Recorder<E> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Recorder")
            .field("subject", &self.subject)
            .finish_non_exhaustive()
    }
}
