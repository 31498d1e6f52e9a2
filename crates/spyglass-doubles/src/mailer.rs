//! Recording mailer and envelope matchers.

use core::fmt;
use core::result::Result as CoreResult;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use spyglass_core::{Expected, Matcher, Mismatch, Recorder, Recording, TestFailure, Verify};

use crate::error::Result;

/// A mailbox, optionally with a display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Mailbox address
    pub email: String,
    /// Display name
    pub name: Option<String>,
}

impl Address {
    /// Address without a display name.
    #[must_use]
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
        }
    }

    /// Address with a display name.
    #[must_use]
    pub fn named(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: Some(name.into()),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(formatter, "\"{name}\" <{}>", self.email),
            None => formatter.write_str(&self.email),
        }
    }
}

/// An email message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    /// Sender
    pub from: Vec<Address>,
    /// Primary recipients
    pub to: Vec<Address>,
    /// Subject line
    pub subject: String,
    /// Plain text body
    pub text: Option<String>,
    /// HTML body
    pub html: Option<String>,
}

impl Email {
    /// Empty message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sender.
    #[must_use]
    pub fn from(mut self, address: Address) -> Self {
        self.from.push(address);
        self
    }

    /// Add a recipient.
    #[must_use]
    pub fn to(mut self, address: Address) -> Self {
        self.to.push(address);
        self
    }

    /// Set the subject.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Set the plain text body.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set the HTML body.
    #[must_use]
    pub fn html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }
}

/// SMTP envelope: who the transport sends as and to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Envelope sender
    pub sender: Address,
    /// Envelope recipients
    pub recipients: Vec<Address>,
}

impl Envelope {
    /// Envelope from `sender` to `recipients`.
    #[must_use]
    pub fn new(sender: Address, recipients: Vec<Address>) -> Self {
        Self { sender, recipients }
    }

    fn to_value(&self) -> Value {
        json!({
            "sender": self.sender.to_string(),
            "recipients": self
                .recipients
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>(),
        })
    }
}

/// Mail sending collaborator.
pub trait Mailer: Send + Sync {
    /// Send `message`, using `envelope` when given.
    ///
    /// # Errors
    /// Returns an error if the transport rejects the message.
    fn send(&self, message: Email, envelope: Option<Envelope>) -> Result<()>;
}

/// One captured send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    /// Message as sent
    pub message: Email,
    /// Envelope, when one was given
    pub envelope: Option<Envelope>,
}

/// Mailer double.
#[derive(Debug)]
pub struct TestMailer {
    recorder: Recorder<SentMessage>,
}

impl TestMailer {
    /// Create an empty mailer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            recorder: Recorder::new("mailer"),
        }
    }

    /// Captured sends in call order.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.recorder.events()
    }

    /// Expect the next message's text body to contain `text`.
    #[track_caller]
    pub fn expect(&self, text: &str) -> &Self {
        self.expect_message(body_contains(text))
    }

    /// Expect the next message, serialized as JSON, to match.
    #[track_caller]
    pub fn expect_message(&self, message: impl Into<Expected>) -> &Self {
        self.recorder.next();
        self.recorder.set("message", message, |sent: &SentMessage| {
            serde_json::to_value(&sent.message).unwrap_or(Value::Null)
        });
        self
    }

    /// Also check the envelope; a missing envelope reads as null.
    #[track_caller]
    pub fn envelope(&self, envelope: impl Into<Expected>) -> &Self {
        self.recorder.set("envelope", envelope, |sent: &SentMessage| {
            sent.envelope.as_ref().map_or(Value::Null, Envelope::to_value)
        });
        self
    }
}

impl Default for TestMailer {
    fn default() -> Self {
        Self::new()
    }
}

impl Mailer for TestMailer {
    fn send(&self, message: Email, envelope: Option<Envelope>) -> Result<()> {
        self.recorder.record(SentMessage { message, envelope });
        Ok(())
    }
}

impl Recording for TestMailer {
    type Event = SentMessage;

    fn recorder(&self) -> &Recorder<SentMessage> {
        &self.recorder
    }
}

impl Verify for TestMailer {
    fn assert(&self) -> CoreResult<(), TestFailure> {
        self.recorder.assert()
    }
}

/// Accept messages whose text body contains `text`.
pub fn body_contains(text: impl Into<String>) -> Expected {
    Expected::matcher(MessageBodyContains(text.into()))
}

/// Accept envelopes with a recipient rendered as `address`.
pub fn envelope_has_recipient(address: impl Into<String>) -> Expected {
    Expected::matcher(EnvelopeHasRecipient(address.into()))
}

/// Accept envelopes whose sender renders as `address`.
pub fn envelope_sender_same(address: impl Into<String>) -> Expected {
    Expected::matcher(EnvelopeSenderSame(address.into()))
}

/// Accept envelopes with exactly `count` recipients.
pub fn envelope_recipient_count(count: usize) -> Expected {
    Expected::matcher(EnvelopeRecipientCount(count))
}

struct MessageBodyContains(String);

impl Matcher for MessageBodyContains {
    fn matches(&self, actual: &Value) -> bool {
        actual["text"]
            .as_str()
            .or_else(|| actual.as_str())
            .is_some_and(|body| body.contains(&self.0))
    }

    fn describe(&self) -> String {
        format!("contains \"{}\"", self.0)
    }

    fn mismatch(&self, _actual: &Value) -> Mismatch {
        Mismatch::new(format!("Failed asserting that the Message body {}.", self.describe()))
    }
}

fn envelope_mismatch(matcher: &dyn Matcher) -> Mismatch {
    Mismatch::new(format!("Failed asserting that the Envelope {}.", matcher.describe()))
}

struct EnvelopeHasRecipient(String);

impl Matcher for EnvelopeHasRecipient {
    fn matches(&self, actual: &Value) -> bool {
        actual["recipients"].as_array().is_some_and(|recipients| {
            recipients
                .iter()
                .any(|recipient| recipient.as_str() == Some(self.0.as_str()))
        })
    }

    fn describe(&self) -> String {
        format!("contains recipient \"{}\"", self.0)
    }

    fn mismatch(&self, _actual: &Value) -> Mismatch {
        envelope_mismatch(self)
    }
}

struct EnvelopeSenderSame(String);

impl Matcher for EnvelopeSenderSame {
    fn matches(&self, actual: &Value) -> bool {
        actual["sender"].as_str() == Some(self.0.as_str())
    }

    fn describe(&self) -> String {
        format!("contains sender \"{}\"", self.0)
    }

    fn mismatch(&self, _actual: &Value) -> Mismatch {
        envelope_mismatch(self)
    }
}

struct EnvelopeRecipientCount(usize);

impl Matcher for EnvelopeRecipientCount {
    fn matches(&self, actual: &Value) -> bool {
        actual["recipients"]
            .as_array()
            .is_some_and(|recipients| recipients.len() == self.0)
    }

    fn describe(&self) -> String {
        format!("has \"{}\" recipients", self.0)
    }

    fn mismatch(&self, _actual: &Value) -> Mismatch {
        envelope_mismatch(self)
    }
}
