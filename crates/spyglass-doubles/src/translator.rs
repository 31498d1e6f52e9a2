//! Recording translator.

use core::result::Result as CoreResult;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use serde_json::{Map, Value, json};
use spyglass_core::{Expected, Recorder, Recording, Resettable, TestFailure, Verify};

const DEFAULT_LOCALE: &str = "en";

/// Message translation collaborator.
pub trait Translator: Send + Sync {
    /// Translate message `id`.
    fn trans(&self, id: &str, parameters: &Map<String, Value>, domain: Option<&str>, locale: Option<&str>) -> String;
}

/// Translators with a current locale.
pub trait LocaleAware {
    /// Change the current locale.
    fn set_locale(&self, locale: &str);

    /// Current locale.
    fn current_locale(&self) -> String;
}

/// One captured translation lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationCall {
    /// Message id
    pub id: String,
    /// Placeholder values
    pub parameters: Map<String, Value>,
    /// Translation domain
    pub domain: Option<String>,
    /// Requested locale
    pub locale: Option<String>,
}

/// Translator double answering from a fixed catalogue.
///
/// Unknown ids translate to themselves. Parameters are recorded but never
/// substituted.
#[derive(Debug)]
pub struct TestTranslator {
    recorder: Recorder<TranslationCall>,
    translations: HashMap<String, String>,
    locale: Mutex<String>,
}

impl TestTranslator {
    /// Translator answering from `translations`.
    #[must_use]
    pub fn new<I, K, V>(translations: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            recorder: Recorder::new("translator"),
            translations: translations
                .into_iter()
                .map(|(id, translation)| (id.into(), translation.into()))
                .collect(),
            locale: Mutex::new(DEFAULT_LOCALE.to_owned()),
        }
    }

    /// Captured lookups in call order.
    pub fn calls(&self) -> Vec<TranslationCall> {
        self.recorder.events()
    }

    /// Expect the next lookup to request `id`.
    #[track_caller]
    pub fn expect(&self, id: impl Into<Expected>) -> &Self {
        self.recorder.next();
        self.recorder
            .set("id", id, |call: &TranslationCall| json!(call.id));
        self
    }

    /// Also check every parameter.
    #[track_caller]
    pub fn parameters(&self, parameters: impl Into<Expected>) -> &Self {
        self.recorder.set("parameters", parameters, |call: &TranslationCall| {
            Value::Object(call.parameters.clone())
        });
        self
    }

    /// Also check one parameter; absent parameters read as null.
    #[track_caller]
    pub fn parameter(&self, name: &str, value: impl Into<Expected>) -> &Self {
        let key = name.to_owned();
        self.recorder
            .set(&format!("parameters.{name}"), value, move |call: &TranslationCall| {
                call.parameters.get(&key).cloned().unwrap_or(Value::Null)
            });
        self
    }

    /// Also check the domain.
    #[track_caller]
    pub fn domain(&self, domain: impl Into<Expected>) -> &Self {
        self.recorder
            .set("domain", domain, |call: &TranslationCall| json!(call.domain));
        self
    }

    /// Also check the requested locale.
    #[track_caller]
    pub fn locale(&self, locale: impl Into<Expected>) -> &Self {
        self.recorder
            .set("locale", locale, |call: &TranslationCall| json!(call.locale));
        self
    }
}

impl Default for TestTranslator {
    fn default() -> Self {
        Self::new(Vec::<(String, String)>::new())
    }
}

impl Translator for TestTranslator {
    fn trans(&self, id: &str, parameters: &Map<String, Value>, domain: Option<&str>, locale: Option<&str>) -> String {
        self.recorder.record(TranslationCall {
            id: id.to_owned(),
            parameters: parameters.clone(),
            domain: domain.map(ToOwned::to_owned),
            locale: locale.map(ToOwned::to_owned),
        });
        self.translations
            .get(id)
            .cloned()
            .unwrap_or_else(|| id.to_owned())
    }
}

impl LocaleAware for TestTranslator {
    fn set_locale(&self, locale: &str) {
        locale.clone_into(&mut self.locale.lock().unwrap_or_else(PoisonError::into_inner));
    }

    fn current_locale(&self) -> String {
        self.locale
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Recording for TestTranslator {
    type Event = TranslationCall;

    fn recorder(&self) -> &Recorder<TranslationCall> {
        &self.recorder
    }
}

impl Verify for TestTranslator {
    fn assert(&self) -> CoreResult<(), TestFailure> {
        self.recorder.assert()
    }
}

impl Resettable for TestTranslator {
    fn reset(&self) {
        self.recorder.reset();
    }
}
