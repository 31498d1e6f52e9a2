//! In-memory test doubles that record every call.
//!
//! Each double implements its collaborator trait, so the code under test can
//! use it in place of a real transport, and exposes fluent `expect` builders
//! checked by [`Verify::assert`]:
//! - [`TestLogger`] for [`Logger`] and the `log` facade
//! - [`TestEventDispatcher`] for [`EventDispatcher`]
//! - [`TestHttpClient`] for [`HttpClient`]
//! - [`TestMailer`] for [`Mailer`]
//! - [`TestNotifier`] for [`Notifier`]
//! - [`TestTranslator`] for [`Translator`]
//! - [`TestViolationList`] over the [`Violation`]s a validator produced
//! - [`TestWorkflow`], a state machine dispatching into a
//!   [`TestEventDispatcher`]
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

/// Event dispatcher double.
pub mod dispatcher;
/// Error types and result definitions.
pub mod error;
/// HTTP client double.
pub mod http;
/// Logger double.
pub mod logger;
/// Mailer double and envelope matchers.
pub mod mailer;
/// Notifier double and recipient matchers.
pub mod notifier;
/// Translator double.
pub mod translator;
/// Violation list assertions.
pub mod violations;
/// Workflow double.
pub mod workflow;

pub use dispatcher::{DispatchedEvent, Event, EventDispatcher, EventSubscriber, Listener, TestEventDispatcher};
pub use error::{Error, Result};
pub use http::{HttpClient, MockResponse, RecordedRequest, RequestOptions, ResponseFactory, TestHttpClient};
pub use logger::{Level, LogRecord, Logger, TestLogger};
pub use mailer::{Address, Email, Envelope, Mailer, SentMessage, TestMailer};
pub use notifier::{ExceptionInfo, Importance, Notification, Notifier, Recipient, SentNotification, TestNotifier};
pub use spyglass_core::{Recording, Resettable, Verify};
pub use translator::{LocaleAware, TestTranslator, TranslationCall, Translator};
pub use violations::{TestViolationList, Violation};
pub use workflow::{
    Definition, DefinitionBuilder, Marking, MarkingStore, TestMarkingStore, TestWorkflow, TestWorkflowBuilder,
    Transition, WorkflowEvent, WorkflowPhase,
};
