//! Sample service wired to every collaborator trait, so the doubles can be
//! exercised together the way an application would use them.

use std::sync::Arc;

use reqwest::Method;
use serde_json::{Map, Value, json};
use spyglass_doubles::{
    Address, Email, Envelope, Event, EventDispatcher, HttpClient, Importance, Logger, Mailer, Notification, Notifier,
    Recipient, Translator,
};
use thiserror::Error;

/// Channel admins are alerted on.
pub const ADMIN_CHANNEL: &str = "chat";
/// Address welcome emails are sent from.
pub const SENDER: &str = "noreply@shop.test";
/// Envelope sender for bounces.
pub const BOUNCE_ADDRESS: &str = "bounce@shop.test";

/// Errors raised while registering a user.
#[derive(Error, Debug)]
pub enum SignupError {
    /// The user API refused the account
    #[error("Signup rejected with status {0}")]
    Rejected(u16),
    /// The user API answered without an id
    #[error("Invalid user API response: {0}")]
    InvalidResponse(String),
    /// A collaborator failed
    #[error(transparent)]
    Collaborator(#[from] spyglass_doubles::Error),
}

/// Dispatched once a user exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRegistered {
    /// New user id
    pub id: i64,
    /// New user email
    pub email: String,
}

impl Event for UserRegistered {
    fn event_name(&self) -> String {
        "user.registered".to_owned()
    }

    fn payload(&self) -> Value {
        json!({"id": self.id, "email": self.email})
    }
}

/// Collaborators of [`SignupService`].
#[derive(Clone)]
pub struct Collaborators {
    /// Application log
    pub logger: Arc<dyn Logger>,
    /// Domain events
    pub events: Arc<dyn EventDispatcher>,
    /// User API
    pub http: Arc<dyn HttpClient>,
    /// Outgoing mail
    pub mailer: Arc<dyn Mailer>,
    /// Admin alerts
    pub notifier: Arc<dyn Notifier>,
    /// Message catalogue
    pub translator: Arc<dyn Translator>,
}

/// Registers users through a remote API and welcomes them.
pub struct SignupService {
    collaborators: Collaborators,
}

impl SignupService {
    /// Service using `collaborators`.
    #[must_use]
    pub fn new(collaborators: Collaborators) -> Self {
        Self { collaborators }
    }

    /// Create the account, announce it and send a welcome email.
    ///
    /// A refused account is logged and reported to the admin channel.
    ///
    /// # Errors
    /// Returns an error if the API refuses the account, answers without an
    /// id, or a collaborator fails.
    pub fn register(&self, email: &str, name: &str) -> Result<i64, SignupError> {
        let services = &self.collaborators;
        services
            .logger
            .info("Registering user", context(json!({"email": email})));

        let response = services.http.request(
            Method::POST,
            "/users",
            context(json!({"json": {"email": email, "name": name}})),
        )?;

        let status = response.status();
        if !status.is_success() {
            services
                .logger
                .error("Signup rejected", context(json!({"email": email, "status": status.as_u16()})));
            services.notifier.send(
                Notification::new("Signup rejected")
                    .content(format!("{email} was rejected with status {}", status.as_u16()))
                    .importance(Importance::Urgent)
                    .emoji("warning")
                    .channels([ADMIN_CHANNEL]),
                vec![Recipient::NoRecipient],
            );
            return Err(SignupError::Rejected(status.as_u16()));
        }

        let body = response
            .to_json()
            .map_err(|error| SignupError::InvalidResponse(error.to_string()))?;
        let id = body["id"]
            .as_i64()
            .ok_or_else(|| SignupError::InvalidResponse(format!("missing id in {body}")))?;

        services.events.dispatch(
            &UserRegistered {
                id,
                email: email.to_owned(),
            },
            None,
        );

        let greeting = services.translator.trans(
            "signup.welcome",
            &context(json!({"%name%": name})),
            Some("emails"),
            None,
        );
        services.mailer.send(
            Email::new()
                .from(Address::new(SENDER))
                .to(Address::named(email, name))
                .subject("Welcome")
                .text(greeting),
            Some(Envelope::new(Address::new(BOUNCE_ADDRESS), vec![Address::new(email)])),
        )?;

        services
            .logger
            .info("User registered", context(json!({"id": id})));
        Ok(id)
    }
}

fn context(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
