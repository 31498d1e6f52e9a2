//! Recording logger.

use core::fmt;
use core::result::Result as CoreResult;

use log::{Level as LogLevel, Log, Metadata, Record};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use spyglass_core::{Expected, Recorder, Recording, Resettable, TestFailure, Verify};

/// Syslog severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// System is unusable
    Emergency,
    /// Action must be taken immediately
    Alert,
    /// Critical conditions
    Critical,
    /// Runtime errors
    Error,
    /// Exceptional occurrences that are not errors
    Warning,
    /// Normal but significant events
    Notice,
    /// Interesting events
    Info,
    /// Detailed debug information
    Debug,
}

impl Level {
    /// Lowercase level name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Emergency => "emergency",
            Self::Alert => "alert",
            Self::Critical => "critical",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Notice => "notice",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Self::Error,
            LogLevel::Warn => Self::Warning,
            LogLevel::Info => Self::Info,
            LogLevel::Debug | LogLevel::Trace => Self::Debug,
        }
    }
}

impl From<Level> for Expected {
    fn from(level: Level) -> Self {
        Self::Identical(Value::from(level.as_str()))
    }
}

/// One captured log call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Severity
    pub level: Level,
    /// Message text
    pub message: String,
    /// Structured context
    pub context: Map<String, Value>,
}

/// Logging collaborator.
pub trait Logger: Send + Sync {
    /// Log `message` at `level` with structured `context`.
    fn log(&self, level: Level, message: &str, context: Map<String, Value>);

    /// Log at [`Level::Emergency`].
    fn emergency(&self, message: &str, context: Map<String, Value>) {
        self.log(Level::Emergency, message, context);
    }

    /// Log at [`Level::Alert`].
    fn alert(&self, message: &str, context: Map<String, Value>) {
        self.log(Level::Alert, message, context);
    }

    /// Log at [`Level::Critical`].
    fn critical(&self, message: &str, context: Map<String, Value>) {
        self.log(Level::Critical, message, context);
    }

    /// Log at [`Level::Error`].
    fn error(&self, message: &str, context: Map<String, Value>) {
        self.log(Level::Error, message, context);
    }

    /// Log at [`Level::Warning`].
    fn warning(&self, message: &str, context: Map<String, Value>) {
        self.log(Level::Warning, message, context);
    }

    /// Log at [`Level::Notice`].
    fn notice(&self, message: &str, context: Map<String, Value>) {
        self.log(Level::Notice, message, context);
    }

    /// Log at [`Level::Info`].
    fn info(&self, message: &str, context: Map<String, Value>) {
        self.log(Level::Info, message, context);
    }

    /// Log at [`Level::Debug`].
    fn debug(&self, message: &str, context: Map<String, Value>) {
        self.log(Level::Debug, message, context);
    }
}

/// Logger double capturing every call.
///
/// ```
/// use serde_json::Map;
/// use spyglass_doubles::{Level, Logger as _, TestLogger, Verify as _};
///
/// let logger = TestLogger::new();
/// logger.info("message", Map::new());
///
/// logger.expect(Level::Info, "message");
/// logger.verify();
/// ```
#[derive(Debug)]
pub struct TestLogger {
    recorder: Recorder<LogRecord>,
}

impl TestLogger {
    /// Create an empty logger.
    #[must_use]
    pub fn new() -> Self {
        Self {
            recorder: Recorder::new("logger"),
        }
    }

    /// Captured records in call order.
    pub fn records(&self) -> Vec<LogRecord> {
        self.recorder.events()
    }

    /// Expect the next log call to carry `level` and `message`.
    #[track_caller]
    pub fn expect(&self, level: Level, message: impl Into<Expected>) -> &Self {
        self.recorder.next();
        self.recorder
            .set("level", level, |record: &LogRecord| json!(record.level.as_str()));
        self.recorder
            .set("message", message, |record: &LogRecord| json!(record.message));
        self
    }

    /// Also check the context of the current expectation.
    #[track_caller]
    pub fn context(&self, context: impl Into<Expected>) -> &Self {
        self.recorder.set("context", context, |record: &LogRecord| {
            Value::Object(record.context.clone())
        });
        self
    }
}

impl Default for TestLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger for TestLogger {
    fn log(&self, level: Level, message: &str, context: Map<String, Value>) {
        self.recorder.record(LogRecord {
            level,
            message: message.to_owned(),
            context,
        });
    }
}

impl Log for TestLogger {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        let mut context = Map::new();
        context.insert("target".to_owned(), Value::from(record.target()));
        Logger::log(self, record.level().into(), &record.args().to_string(), context);
    }

    fn flush(&self) {}
}

impl Recording for TestLogger {
    type Event = LogRecord;

    fn recorder(&self) -> &Recorder<LogRecord> {
        &self.recorder
    }
}

impl Verify for TestLogger {
    fn assert(&self) -> CoreResult<(), TestFailure> {
        self.recorder.assert()
    }
}

impl Resettable for TestLogger {
    fn reset(&self) {
        self.recorder.reset();
    }
}
