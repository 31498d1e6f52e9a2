//! Workflow double: a Petri-net state machine whose events land in a
//! [`TestEventDispatcher`].
//!
//! Applying a transition dispatches, in order: guard, leave, transition,
//! enter, entered, completed, then one announce per newly enabled
//! transition. Each event is named `workflow.<workflow>.<phase>`. Guard
//! events are always dispatched; the other phases can be restricted with
//! `events_to_dispatch`.

use core::fmt;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use spyglass_core::Inspector;

use crate::dispatcher::{Event, EventDispatcher as _, TestEventDispatcher};
use crate::error::{Error, Result};

/// Name given to workflows built without one.
pub const DEFAULT_WORKFLOW_NAME: &str = "unnamed";

/// A named move from some places to others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    name: String,
    froms: Vec<String>,
    tos: Vec<String>,
}

impl Transition {
    /// Transition `name` from `froms` to `tos`.
    #[must_use]
    pub fn new<F, T>(name: impl Into<String>, froms: F, tos: T) -> Self
    where
        F: IntoIterator,
        F::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        Self {
            name: name.into(),
            froms: froms.into_iter().map(Into::into).collect(),
            tos: tos.into_iter().map(Into::into).collect(),
        }
    }

    /// Transition name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Places the transition consumes.
    pub fn froms(&self) -> &[String] {
        &self.froms
    }

    /// Places the transition produces.
    pub fn tos(&self) -> &[String] {
        &self.tos
    }
}

/// Places and transitions of a workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    places: Vec<String>,
    transitions: Vec<Transition>,
    initial_places: Vec<String>,
}

impl Definition {
    /// Declared places in declaration order.
    pub fn places(&self) -> &[String] {
        &self.places
    }

    /// Declared transitions in declaration order.
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Places marked when a subject has no marking yet.
    pub fn initial_places(&self) -> &[String] {
        &self.initial_places
    }

    /// Transition named `name`.
    pub fn transition(&self, name: &str) -> Option<&Transition> {
        self.transitions
            .iter()
            .find(|transition| transition.name == name)
    }
}

/// Incrementally assembles a [`Definition`].
#[derive(Debug, Clone, Default)]
pub struct DefinitionBuilder {
    places: Vec<String>,
    transitions: Vec<Transition>,
    initial_places: Vec<String>,
}

impl DefinitionBuilder {
    /// Empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a place; duplicates are ignored.
    pub fn add_place(&mut self, place: impl Into<String>) -> &mut Self {
        let place = place.into();
        if !self.places.contains(&place) {
            self.places.push(place);
        }
        self
    }

    /// Declare several places.
    pub fn add_places<I>(&mut self, places: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        for place in places {
            self.add_place(place);
        }
        self
    }

    /// Declare a transition.
    pub fn add_transition(&mut self, transition: Transition) -> &mut Self {
        self.transitions.push(transition);
        self
    }

    /// Places marked on subjects without a marking. Defaults to the first
    /// declared place.
    pub fn set_initial_places<I>(&mut self, places: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.initial_places = places.into_iter().map(Into::into).collect();
        self
    }

    /// Validate and build.
    ///
    /// # Errors
    /// Returns [`Error::InvalidDefinition`] if a transition or initial place
    /// refers to an undeclared place, or a transition name is reused.
    pub fn build(&self) -> Result<Definition> {
        let undeclared = |place: &String| !self.places.contains(place);

        for (position, transition) in self.transitions.iter().enumerate() {
            if let Some(place) = transition.froms.iter().chain(&transition.tos).find(|place| undeclared(*place)) {
                return Err(Error::InvalidDefinition(format!(
                    "transition \"{}\" refers to undeclared place \"{place}\"",
                    transition.name
                )));
            }
            if self.transitions[..position]
                .iter()
                .any(|earlier| earlier.name == transition.name)
            {
                return Err(Error::InvalidDefinition(format!(
                    "transition \"{}\" is declared twice",
                    transition.name
                )));
            }
        }
        if let Some(place) = self.initial_places.iter().find(|place| undeclared(*place)) {
            return Err(Error::InvalidDefinition(format!(
                "initial place \"{place}\" is not declared"
            )));
        }

        let initial_places = if self.initial_places.is_empty() {
            self.places.first().cloned().into_iter().collect()
        } else {
            self.initial_places.clone()
        };
        Ok(Definition {
            places: self.places.clone(),
            transitions: self.transitions.clone(),
            initial_places,
        })
    }
}

/// Token count per place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marking {
    places: BTreeMap<String, u32>,
}

impl Marking {
    /// Marking with one token in each of `places`.
    #[must_use]
    pub fn new<I>(places: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            places: places.into_iter().map(|place| (place.into(), 1)).collect(),
        }
    }

    /// Whether `place` holds a token.
    pub fn has(&self, place: &str) -> bool {
        self.places.get(place).is_some_and(|tokens| *tokens > 0)
    }

    /// Add a token to `place`.
    pub fn mark(&mut self, place: &str) {
        *self.places.entry(place.to_owned()).or_insert(0) += 1;
    }

    /// Remove a token from `place`.
    pub fn unmark(&mut self, place: &str) {
        match self.places.get_mut(place) {
            Some(tokens) if *tokens > 1 => *tokens -= 1,
            Some(_) => {
                self.places.remove(place);
            }
            None => {}
        }
    }

    /// Marked places and their token counts.
    pub fn places(&self) -> &BTreeMap<String, u32> {
        &self.places
    }

    /// Whether no place holds a token.
    pub fn is_empty(&self) -> bool {
        self.places.values().all(|tokens| *tokens == 0)
    }

    /// JSON object of place to token count.
    pub fn to_value(&self) -> Value {
        json!(self.places)
    }
}

/// Stores the marking of each subject.
pub trait MarkingStore: Send + Sync {
    /// Current marking of `subject`, empty when never set.
    fn marking(&self, subject: &str) -> Marking;

    /// Replace the marking of `subject`.
    fn set_marking(&self, subject: &str, marking: Marking, context: &Map<String, Value>);
}

/// In-memory [`MarkingStore`].
#[derive(Debug, Default)]
pub struct TestMarkingStore {
    markings: Mutex<HashMap<String, Marking>>,
}

impl TestMarkingStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl MarkingStore for TestMarkingStore {
    fn marking(&self, subject: &str) -> Marking {
        self.markings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(subject)
            .cloned()
            .unwrap_or_default()
    }

    fn set_marking(&self, subject: &str, marking: Marking, _context: &Map<String, Value>) {
        self.markings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(subject.to_owned(), marking);
    }
}

/// Stage of a transition an event is dispatched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowPhase {
    /// Deciding whether the transition may happen
    Guard,
    /// Leaving the `from` places
    Leave,
    /// Passing through the transition
    Transition,
    /// About to enter the `to` places
    Enter,
    /// Marking updated
    Entered,
    /// Transition finished
    Completed,
    /// A transition became available
    Announce,
}

impl WorkflowPhase {
    /// Lowercase phase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Guard => "guard",
            Self::Leave => "leave",
            Self::Transition => "transition",
            Self::Enter => "enter",
            Self::Entered => "entered",
            Self::Completed => "completed",
            Self::Announce => "announce",
        }
    }
}

impl fmt::Display for WorkflowPhase {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Event dispatched by [`TestWorkflow`].
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowEvent {
    /// Phase the event belongs to
    pub phase: WorkflowPhase,
    /// Workflow name
    pub workflow: String,
    /// Subject identifier
    pub subject: String,
    /// Transition being applied or announced
    pub transition: Transition,
    /// Subject marking when the event was dispatched
    pub marking: Marking,
    /// Caller-supplied context
    pub context: Map<String, Value>,
}

impl Event for WorkflowEvent {
    fn event_name(&self) -> String {
        format!("workflow.{}.{}", self.workflow, self.phase)
    }

    fn payload(&self) -> Value {
        json!({
            "phase": self.phase.as_str(),
            "workflow": self.workflow,
            "subject": self.subject,
            "transition": self.transition.name,
            "marking": self.marking.to_value(),
            "context": self.context,
        })
    }
}

/// Workflow dispatching into its own [`TestEventDispatcher`].
pub struct TestWorkflow {
    name: String,
    definition: Definition,
    store: Arc<dyn MarkingStore>,
    dispatcher: TestEventDispatcher,
    events_to_dispatch: Option<Vec<WorkflowPhase>>,
}

impl TestWorkflow {
    /// Workflow over `definition` storing markings in `store`.
    ///
    /// `events_to_dispatch` limits the dispatched phases; `None` dispatches
    /// all of them.
    #[must_use]
    pub fn new(
        definition: Definition,
        store: Arc<dyn MarkingStore>,
        name: impl Into<String>,
        events_to_dispatch: Option<Vec<WorkflowPhase>>,
    ) -> Self {
        Self {
            name: name.into(),
            definition,
            store,
            dispatcher: TestEventDispatcher::new(),
            events_to_dispatch,
        }
    }

    /// Workflow name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Places and transitions.
    pub fn definition(&self) -> &Definition {
        &self.definition
    }

    /// Marking store.
    pub fn marking_store(&self) -> &Arc<dyn MarkingStore> {
        &self.store
    }

    /// Dispatcher receiving every workflow event.
    pub fn event_dispatcher(&self) -> &TestEventDispatcher {
        &self.dispatcher
    }

    /// Marking of `subject`, initialised to the initial places when empty.
    pub fn marking(&self, subject: &str) -> Marking {
        let marking = self.store.marking(subject);
        if !marking.is_empty() || self.definition.initial_places.is_empty() {
            return marking;
        }
        let initial = Marking::new(self.definition.initial_places.iter().cloned());
        self.store.set_marking(subject, initial.clone(), &Map::new());
        initial
    }

    /// Transitions the current marking of `subject` enables. No guard
    /// event is dispatched.
    pub fn enabled_transitions(&self, subject: &str) -> Vec<&Transition> {
        let marking = self.marking(subject);
        self.definition
            .transitions
            .iter()
            .filter(|transition| is_enabled(&marking, transition))
            .collect()
    }

    /// Whether `subject` can take `transition`. Dispatches a guard event
    /// when the marking allows it.
    ///
    /// # Errors
    /// Returns [`Error::UnknownTransition`] if no transition has that name.
    pub fn can(&self, subject: &str, transition: &str) -> Result<bool> {
        let transition = self.lookup(transition)?;
        let marking = self.marking(subject);
        if !is_enabled(&marking, transition) {
            return Ok(false);
        }
        self.dispatch(WorkflowPhase::Guard, subject, transition, &marking, &Map::new());
        Ok(true)
    }

    /// Apply `transition` to `subject` and return the new marking.
    ///
    /// # Errors
    /// Returns [`Error::UnknownTransition`] if no transition has that name and
    /// [`Error::TransitionNotEnabled`] if the marking does not allow it.
    pub fn apply(&self, subject: &str, transition: &str, context: Map<String, Value>) -> Result<Marking> {
        let transition = self.lookup(transition)?;
        let mut marking = self.marking(subject);
        if !is_enabled(&marking, transition) {
            return Err(Error::TransitionNotEnabled {
                transition: transition.name.clone(),
                subject: subject.to_owned(),
            });
        }

        self.dispatch(WorkflowPhase::Guard, subject, transition, &marking, &context);
        self.dispatch(WorkflowPhase::Leave, subject, transition, &marking, &context);
        for place in &transition.froms {
            marking.unmark(place);
        }
        self.dispatch(WorkflowPhase::Transition, subject, transition, &marking, &context);
        self.dispatch(WorkflowPhase::Enter, subject, transition, &marking, &context);
        for place in &transition.tos {
            marking.mark(place);
        }
        self.store.set_marking(subject, marking.clone(), &context);
        self.dispatch(WorkflowPhase::Entered, subject, transition, &marking, &context);
        self.dispatch(WorkflowPhase::Completed, subject, transition, &marking, &context);
        for enabled in self
            .definition
            .transitions
            .iter()
            .filter(|candidate| is_enabled(&marking, candidate))
        {
            self.dispatch(WorkflowPhase::Announce, subject, enabled, &marking, &context);
        }

        tracing::debug!(
            workflow = %self.name,
            subject,
            transition = %transition.name,
            "applied transition"
        );
        Ok(marking)
    }

    /// Inspector over the current marking of `subject`.
    pub fn inspect(&self, subject: &str) -> Inspector<Marking> {
        Inspector::new("workflow marking", self.marking(subject))
    }

    fn lookup(&self, name: &str) -> Result<&Transition> {
        self.definition
            .transition(name)
            .ok_or_else(|| Error::UnknownTransition(name.to_owned()))
    }

    fn dispatch(
        &self,
        phase: WorkflowPhase,
        subject: &str,
        transition: &Transition,
        marking: &Marking,
        context: &Map<String, Value>,
    ) {
        let allowed = phase == WorkflowPhase::Guard
            || self
                .events_to_dispatch
                .as_ref()
                .is_none_or(|phases| phases.contains(&phase));
        if !allowed {
            return;
        }
        let event = WorkflowEvent {
            phase,
            workflow: self.name.clone(),
            subject: subject.to_owned(),
            transition: transition.clone(),
            marking: marking.clone(),
            context: context.clone(),
        };
        self.dispatcher.dispatch(&event, None);
    }
}

impl fmt::Debug for TestWorkflow {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("TestWorkflow")
            .field("name", &self.name)
            .field("definition", &self.definition)
            .field("events_to_dispatch", &self.events_to_dispatch)
            .finish_non_exhaustive()
    }
}

fn is_enabled(marking: &Marking, transition: &Transition) -> bool {
    transition.froms.iter().all(|place| marking.has(place))
}

/// Collects what a [`TestWorkflow`] needs before building it.
pub struct TestWorkflowBuilder {
    /// Workflow name
    pub name: String,
    /// Places and transitions
    pub definition: DefinitionBuilder,
    /// Marking store; a fresh [`TestMarkingStore`] when `None`
    pub marking_store: Option<Arc<dyn MarkingStore>>,
    /// Phases to dispatch; all when `None`
    pub events_to_dispatch: Option<Vec<WorkflowPhase>>,
}

impl TestWorkflowBuilder {
    /// Builder for an unnamed workflow with no places.
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: DEFAULT_WORKFLOW_NAME.to_owned(),
            definition: DefinitionBuilder::new(),
            marking_store: None,
            events_to_dispatch: None,
        }
    }

    /// Build the workflow.
    ///
    /// # Errors
    /// Returns [`Error::InvalidDefinition`] if the definition is inconsistent.
    pub fn build(self) -> Result<TestWorkflow> {
        Ok(TestWorkflow::new(
            self.definition.build()?,
            self.marking_store
                .unwrap_or_else(|| Arc::new(TestMarkingStore::new())),
            self.name,
            self.events_to_dispatch,
        ))
    }
}

impl Default for TestWorkflowBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TestWorkflowBuilder {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("TestWorkflowBuilder")
            .field("name", &self.name)
            .field("definition", &self.definition)
            .field("events_to_dispatch", &self.events_to_dispatch)
            .finish_non_exhaustive()
    }
}

/// Build a workflow after letting `configure` adjust the builder.
///
/// # Errors
/// Returns [`Error::InvalidDefinition`] if the configured definition is
/// inconsistent.
pub fn create_workflow(configure: impl FnOnce(&mut TestWorkflowBuilder)) -> Result<TestWorkflow> {
    let mut builder = TestWorkflowBuilder::new();
    configure(&mut builder);
    builder.build()
}

/// Transition `name` from `froms` to `tos`.
pub fn create_transition<F, T>(name: &str, froms: F, tos: T) -> Transition
where
    F: IntoIterator,
    F::Item: Into<String>,
    T: IntoIterator,
    T::Item: Into<String>,
{
    Transition::new(name, froms, tos)
}

/// Marking with one token in each place `transition` consumes.
pub fn create_marking(transition: &Transition) -> Marking {
    Marking::new(transition.froms.iter().cloned())
}

/// Event for `phase` as a workflow holding only `transition` would
/// dispatch it for `subject`.
///
/// `configure` may adjust the workflow builder first, for instance to
/// rename the workflow.
///
/// # Errors
/// Returns [`Error::InvalidDefinition`] if the configured definition is
/// inconsistent.
pub fn create_event(
    phase: WorkflowPhase,
    subject: &str,
    transition: &Transition,
    context: Map<String, Value>,
    configure: impl FnOnce(&mut TestWorkflowBuilder),
) -> Result<WorkflowEvent> {
    let workflow = create_workflow(|builder| {
        configure(builder);
        builder
            .definition
            .add_places(transition.froms.iter().cloned())
            .add_places(transition.tos.iter().cloned())
            .add_transition(transition.clone());
    })?;
    let marking = create_marking(transition);
    workflow
        .marking_store()
        .set_marking(subject, marking.clone(), &context);

    Ok(WorkflowEvent {
        phase,
        workflow: workflow.name,
        subject: subject.to_owned(),
        transition: transition.clone(),
        marking,
        context,
    })
}
