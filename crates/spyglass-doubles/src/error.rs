use core::result::Result as CoreResult;

use spyglass_core::Error as CoreError;
use thiserror::Error;

/// Result type for the doubles.
pub type Result<T> = CoreResult<T, Error>;

/// Errors raised by the doubles while the code under test uses them.
#[derive(Debug, Error)]
pub enum Error {
    /// Expectation configuration failed.
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    /// A read-only double was asked to change.
    #[error("{0}")]
    Unmodifiable(&'static str),

    /// A request URL could not be parsed or resolved.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The queued mock responses ran out.
    #[error("The response factory has no more responses to return")]
    ResponsesExhausted,

    /// A workflow definition is inconsistent.
    #[error("Invalid workflow definition: {0}")]
    InvalidDefinition(String),

    /// The subject's marking does not enable the transition.
    #[error("Transition \"{transition}\" is not enabled for subject \"{subject}\"")]
    TransitionNotEnabled {
        /// Transition name
        transition: String,
        /// Subject identifier
        subject: String,
    },

    /// The workflow defines no transition with this name.
    #[error("Transition \"{0}\" is not defined")]
    UnknownTransition(String),
}
