//! Recording event dispatcher.

use core::any;
use core::result::Result as CoreResult;
use std::sync::Arc;

use serde_json::{Value, json};
use spyglass_core::matchers::instance_of;
use spyglass_core::{Expected, Recorder, Recording, TestFailure, Verify};

use crate::error::{Error, Result};

const UNMODIFIABLE: &str = "Unmodifiable event dispatchers must not be modified.";

/// Something that can be dispatched.
pub trait Event: Send + Sync {
    /// Concrete type name, compared by [`instance_of`].
    fn type_name(&self) -> &'static str {
        any::type_name::<Self>()
    }

    /// Name used when the dispatcher is not given one.
    fn event_name(&self) -> String {
        self.type_name().to_owned()
    }

    /// Data exposed to expectations.
    fn payload(&self) -> Value {
        Value::Null
    }
}

/// Callback invoked for a dispatched event.
pub type Listener = Arc<dyn Fn(&dyn Event) + Send + Sync>;

/// Declares the events it listens to.
pub trait EventSubscriber: Send + Sync {
    /// Event names and priorities.
    fn subscribed_events(&self) -> Vec<(String, i32)>;
}

/// Event dispatching collaborator.
pub trait EventDispatcher: Send + Sync {
    /// Dispatch `event` under `name`, or under its own name when `None`.
    fn dispatch(&self, event: &dyn Event, name: Option<&str>);

    /// Register a listener.
    ///
    /// # Errors
    /// Returns an error if the dispatcher cannot be modified.
    fn add_listener(&self, event_name: &str, listener: Listener, priority: i32) -> Result<()>;

    /// Unregister a listener.
    ///
    /// # Errors
    /// Returns an error if the dispatcher cannot be modified.
    fn remove_listener(&self, event_name: &str, listener: &Listener) -> Result<()>;

    /// Register every listener of a subscriber.
    ///
    /// # Errors
    /// Returns an error if the dispatcher cannot be modified.
    fn add_subscriber(&self, subscriber: Arc<dyn EventSubscriber>) -> Result<()>;

    /// Unregister every listener of a subscriber.
    ///
    /// # Errors
    /// Returns an error if the dispatcher cannot be modified.
    fn remove_subscriber(&self, subscriber: &Arc<dyn EventSubscriber>) -> Result<()>;

    /// Listeners registered for `event_name`, or for every event when `None`.
    fn listeners(&self, event_name: Option<&str>) -> Vec<Listener>;

    /// Whether any listener is registered.
    fn has_listeners(&self, event_name: Option<&str>) -> bool;
}

/// One captured dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchedEvent {
    /// Concrete type name of the event
    pub type_name: &'static str,
    /// Name the event was dispatched under
    pub name: String,
    /// Event payload at dispatch time
    pub payload: Value,
}

/// Dispatcher double: records dispatches and refuses listeners.
#[derive(Debug)]
pub struct TestEventDispatcher {
    recorder: Recorder<DispatchedEvent>,
}

impl TestEventDispatcher {
    /// Create an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self {
            recorder: Recorder::new("event dispatcher"),
        }
    }

    /// Captured dispatches in call order.
    pub fn dispatched(&self) -> Vec<DispatchedEvent> {
        self.recorder.events()
    }

    /// Expect the next dispatch to carry an event of type `T`.
    #[track_caller]
    pub fn expect<T: ?Sized>(&self) -> &Self {
        self.expect_event(instance_of::<T>())
    }

    /// Expect the next dispatch to carry an event whose type name matches.
    #[track_caller]
    pub fn expect_event(&self, event: impl Into<Expected>) -> &Self {
        self.recorder.next();
        self.recorder
            .set("event", event, |dispatched: &DispatchedEvent| json!(dispatched.type_name));
        self
    }

    /// Also check the name the event was dispatched under.
    #[track_caller]
    pub fn name(&self, name: impl Into<Expected>) -> &Self {
        self.recorder
            .set("name", name, |dispatched: &DispatchedEvent| json!(dispatched.name));
        self
    }

    /// Also check the event payload.
    #[track_caller]
    pub fn payload(&self, payload: impl Into<Expected>) -> &Self {
        self.recorder
            .set("payload", payload, |dispatched: &DispatchedEvent| dispatched.payload.clone());
        self
    }
}

impl Default for TestEventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl EventDispatcher for TestEventDispatcher {
    fn dispatch(&self, event: &dyn Event, name: Option<&str>) {
        self.recorder.record(DispatchedEvent {
            type_name: event.type_name(),
            name: name.map_or_else(|| event.event_name(), ToOwned::to_owned),
            payload: event.payload(),
        });
    }

    fn add_listener(&self, _event_name: &str, _listener: Listener, _priority: i32) -> Result<()> {
        Err(Error::Unmodifiable(UNMODIFIABLE))
    }

    fn remove_listener(&self, _event_name: &str, _listener: &Listener) -> Result<()> {
        Err(Error::Unmodifiable(UNMODIFIABLE))
    }

    fn add_subscriber(&self, _subscriber: Arc<dyn EventSubscriber>) -> Result<()> {
        Err(Error::Unmodifiable(UNMODIFIABLE))
    }

    fn remove_subscriber(&self, _subscriber: &Arc<dyn EventSubscriber>) -> Result<()> {
        Err(Error::Unmodifiable(UNMODIFIABLE))
    }

    fn listeners(&self, _event_name: Option<&str>) -> Vec<Listener> {
        Vec::new()
    }

    fn has_listeners(&self, _event_name: Option<&str>) -> bool {
        false
    }
}

impl Recording for TestEventDispatcher {
    type Event = DispatchedEvent;

    fn recorder(&self) -> &Recorder<DispatchedEvent> {
        &self.recorder
    }
}

impl Verify for TestEventDispatcher {
    fn assert(&self) -> CoreResult<(), TestFailure> {
        self.recorder.assert()
    }
}
