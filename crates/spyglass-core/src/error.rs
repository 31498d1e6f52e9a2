use core::result::Result as CoreResult;
use std::io::Error as IoError;

use regex::Error as RegexError;
use thiserror::Error;
use toml::de::Error as TomlError;

/// Result type for expectation configuration.
pub type Result<T> = CoreResult<T, Error>;

/// Errors raised while declaring expectations or loading settings.
///
/// These are configuration errors: they surface at declaration time, never
/// at assertion time. Assertion outcomes are reported through
/// [`TestFailure`](crate::TestFailure) instead.
#[derive(Debug, Error)]
pub enum Error {
    /// A field was declared twice for the same expectation.
    #[error("Cannot redefine {index}.{name}")]
    Redefined {
        /// Expectation index the field belongs to
        index: usize,
        /// Field name
        name: String,
    },

    /// A field was declared before any expectation was started.
    #[error("Cannot define {name} before an expectation is started")]
    NoExpectation {
        /// Field name
        name: String,
    },

    /// A matcher was built from a value of the wrong shape.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A regular expression matcher could not be compiled.
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] RegexError),

    /// Settings are invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Reading a settings file failed.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// A settings file is not valid TOML.
    #[error("TOML deserialization error: {0}")]
    Toml(#[from] TomlError),
}
