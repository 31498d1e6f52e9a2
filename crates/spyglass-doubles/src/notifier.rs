//! Recording notifier and recipient matchers.

use core::result::Result as CoreResult;
use core::{any, fmt};
use std::error::Error as StdError;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use spyglass_core::matchers::{array_contains_list, count};
use spyglass_core::{Expected, Matcher, Mismatch, Recorder, Recording, TestFailure, Verify};

/// How urgent a notification is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    /// Needs immediate attention
    Urgent,
    /// Default importance
    #[default]
    High,
    /// Routine
    Medium,
    /// Informational
    Low,
}

impl Importance {
    /// Lowercase importance name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Urgent => "urgent",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for Importance {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl From<Importance> for Expected {
    fn from(importance: Importance) -> Self {
        Self::Identical(Value::from(importance.as_str()))
    }
}

/// Error details attached to a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionInfo {
    /// Error type name
    pub class: String,
    /// Error message
    pub message: String,
    /// Error code
    pub code: i64,
}

impl ExceptionInfo {
    /// Capture `error` with its type name.
    #[must_use]
    pub fn from_error<E: StdError>(error: &E, code: i64) -> Self {
        Self {
            class: any::type_name::<E>().to_owned(),
            message: error.to_string(),
            code,
        }
    }
}

/// A notification to deliver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Subject line
    pub subject: String,
    /// Body
    pub content: String,
    /// Importance
    pub importance: Importance,
    /// Emoji prefix
    pub emoji: Option<String>,
    /// Attached error
    pub exception: Option<ExceptionInfo>,
    /// Requested channels
    pub channels: Vec<String>,
}

impl Notification {
    /// Notification with `subject` and defaults elsewhere.
    #[must_use]
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            ..Self::default()
        }
    }

    /// Set the body.
    #[must_use]
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Set the importance.
    #[must_use]
    pub fn importance(mut self, importance: Importance) -> Self {
        self.importance = importance;
        self
    }

    /// Set the emoji.
    #[must_use]
    pub fn emoji(mut self, emoji: impl Into<String>) -> Self {
        self.emoji = Some(emoji.into());
        self
    }

    /// Attach an error.
    #[must_use]
    pub fn exception(mut self, exception: ExceptionInfo) -> Self {
        self.exception = Some(exception);
        self
    }

    /// Set the channels.
    #[must_use]
    pub fn channels<I, S>(mut self, channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.channels = channels.into_iter().map(Into::into).collect();
        self
    }
}

/// Who a notification goes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Email only
    Email(String),
    /// SMS only
    Sms(String),
    /// Email and SMS
    Both {
        /// Email address
        email: String,
        /// Phone number
        phone: String,
    },
    /// Admin channels, no specific recipient
    NoRecipient,
}

impl Recipient {
    /// Email address, if any.
    pub fn email(&self) -> Option<&str> {
        match self {
            Self::Email(email) | Self::Both { email, .. } => Some(email),
            Self::Sms(_) | Self::NoRecipient => None,
        }
    }

    /// Phone number, if any.
    pub fn phone(&self) -> Option<&str> {
        match self {
            Self::Sms(phone) | Self::Both { phone, .. } => Some(phone),
            Self::Email(_) | Self::NoRecipient => None,
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Self::NoRecipient => json!({"no_recipient": true}),
            Self::Email(_) | Self::Sms(_) | Self::Both { .. } => {
                json!({"email": self.email(), "phone": self.phone()})
            }
        }
    }
}

/// Notification delivery collaborator.
pub trait Notifier: Send + Sync {
    /// Deliver `notification` to `recipients`.
    fn send(&self, notification: Notification, recipients: Vec<Recipient>);
}

/// One captured delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    /// Notification as sent
    pub notification: Notification,
    /// Recipients in call order
    pub recipients: Vec<Recipient>,
}

/// Notifier double.
#[derive(Debug)]
pub struct TestNotifier {
    recorder: Recorder<SentNotification>,
}

impl TestNotifier {
    /// Create an empty notifier.
    #[must_use]
    pub fn new() -> Self {
        Self {
            recorder: Recorder::new("notifier"),
        }
    }

    /// Captured deliveries in call order.
    pub fn sent(&self) -> Vec<SentNotification> {
        self.recorder.events()
    }

    /// Expect the next notification's subject.
    #[track_caller]
    pub fn expect(&self, subject: impl Into<Expected>) -> &Self {
        self.recorder.next();
        self.recorder
            .set("notification_subject", subject, |sent: &SentNotification| {
                json!(sent.notification.subject)
            });
        self
    }

    /// Also check the content.
    #[track_caller]
    pub fn content(&self, content: impl Into<Expected>) -> &Self {
        self.recorder
            .set("notification_content", content, |sent: &SentNotification| {
                json!(sent.notification.content)
            });
        self
    }

    /// Also check the importance.
    #[track_caller]
    pub fn importance(&self, importance: impl Into<Expected>) -> &Self {
        self.recorder
            .set("notification_importance", importance, |sent: &SentNotification| {
                json!(sent.notification.importance.as_str())
            });
        self
    }

    /// Also check the emoji.
    #[track_caller]
    pub fn emoji(&self, emoji: impl Into<Expected>) -> &Self {
        self.recorder
            .set("notification_emoji", emoji, |sent: &SentNotification| {
                json!(sent.notification.emoji)
            });
        self
    }

    /// Also check the attached error: its type name always, message and
    /// code when given.
    #[track_caller]
    pub fn exception(&self, class: &str, message: Option<Expected>, code: Option<Expected>) -> &Self {
        self.recorder
            .set("notification_exception_class", class, |sent: &SentNotification| {
                json!(sent.notification.exception.as_ref().map(|exception| &exception.class))
            });
        if let Some(message) = message {
            self.recorder
                .set("notification_exception_message", message, |sent: &SentNotification| {
                    json!(sent.notification.exception.as_ref().map(|exception| &exception.message))
                });
        }
        if let Some(code) = code {
            self.recorder
                .set("notification_exception_code", code, |sent: &SentNotification| {
                    json!(sent.notification.exception.as_ref().map(|exception| exception.code))
                });
        }
        self
    }

    /// Also check the channels.
    #[track_caller]
    pub fn channels(&self, channels: impl Into<Expected>) -> &Self {
        self.recorder
            .set("notification_channels", channels, |sent: &SentNotification| {
                json!(sent.notification.channels)
            });
        self
    }

    /// Also check the notification with a predicate.
    #[track_caller]
    pub fn custom<F>(&self, accept: F) -> &Self
    where
        F: Fn(&Notification) -> bool + Send + Sync + 'static,
    {
        self.recorder
            .set("notification_custom", true, move |sent: &SentNotification| {
                Value::Bool(accept(&sent.notification))
            });
        self
    }

    /// Also check the recipients position by position. An empty list
    /// expects no recipients at all.
    #[track_caller]
    pub fn recipients(&self, recipients: Vec<Expected>) -> &Self {
        let expected = if recipients.is_empty() {
            count(0)
        } else {
            array_contains_list(recipients, true)
        };
        self.recorder
            .set("recipients", expected, |sent: &SentNotification| {
                Value::Array(sent.recipients.iter().map(Recipient::to_value).collect())
            });
        self
    }
}

impl Default for TestNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for TestNotifier {
    fn send(&self, notification: Notification, recipients: Vec<Recipient>) {
        self.recorder.record(SentNotification {
            notification,
            recipients,
        });
    }
}

impl Recording for TestNotifier {
    type Event = SentNotification;

    fn recorder(&self) -> &Recorder<SentNotification> {
        &self.recorder
    }
}

impl Verify for TestNotifier {
    fn assert(&self) -> CoreResult<(), TestFailure> {
        self.recorder.assert()
    }
}

/// Accept recipients with an email address matching `email`.
pub fn email_recipient(email: impl Into<Expected>) -> Expected {
    Expected::matcher(RecipientField {
        field: "email",
        expected: email.into(),
    })
}

/// Accept recipients with a phone number matching `phone`.
pub fn sms_recipient(phone: impl Into<Expected>) -> Expected {
    Expected::matcher(RecipientField {
        field: "phone",
        expected: phone.into(),
    })
}

/// Accept only [`Recipient::NoRecipient`].
pub fn no_recipient() -> Expected {
    Expected::matcher(NoRecipientMatcher)
}

struct RecipientField {
    field: &'static str,
    expected: Expected,
}

impl Matcher for RecipientField {
    fn matches(&self, actual: &Value) -> bool {
        actual
            .get(self.field)
            .filter(|value| !value.is_null())
            .is_some_and(|value| self.expected.matches(value))
    }

    fn describe(&self) -> String {
        format!("recipient {} {}", self.field, self.expected.describe())
    }

    fn mismatch(&self, actual: &Value) -> Mismatch {
        match actual.get(self.field).filter(|value| !value.is_null()) {
            Some(value) => self
                .expected
                .evaluate(value)
                .err()
                .unwrap_or_else(|| Mismatch::new(format!("Failed asserting that the {}.", self.describe()))),
            None => Mismatch::new(format!(
                "Failed asserting that the recipient has an {} ({}).",
                self.field,
                self.describe()
            )),
        }
    }
}

struct NoRecipientMatcher;

impl Matcher for NoRecipientMatcher {
    fn matches(&self, actual: &Value) -> bool {
        actual["no_recipient"] == Value::Bool(true)
    }

    fn describe(&self) -> String {
        "contains no recipient instance".to_owned()
    }

    fn mismatch(&self, _actual: &Value) -> Mismatch {
        Mismatch::new(format!("Failed asserting that the notification {}.", self.describe()))
    }
}
