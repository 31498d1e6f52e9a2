//! Built-in matchers.
//!
//! Each constructor returns a ready-to-use [`Expected`]. Constructors that can
//! be misconfigured (a bad pattern, a list where a map is required) return a
//! [`Result`] so the mistake surfaces at declaration time.

use core::any;

use regex::Regex;
use serde_json::{Number, Value};

use crate::error::{Error, Result};
use crate::expected::{Expected, Matcher, Mismatch, export};

/// Compare by identity. Equivalent to converting the value into [`Expected`].
pub fn identical(value: impl Into<Value>) -> Expected {
    Expected::Identical(value.into())
}

/// Compare by loose equality: numbers compare by value regardless of their
/// integer/float representation and numeric strings equal their number.
pub fn equal_to(value: impl Into<Value>) -> Expected {
    Expected::matcher(EqualTo(value.into()))
}

/// Accept any value, including null.
pub fn any_value() -> Expected {
    Expected::matcher(AnyValue)
}

/// Accept only null.
pub fn is_null() -> Expected {
    Expected::matcher(IsNull)
}

/// Invert another expectation.
pub fn not(inner: impl Into<Expected>) -> Expected {
    Expected::matcher(Not(inner.into()))
}

/// Accept strings containing `needle`.
pub fn contains_str(needle: impl Into<String>) -> Expected {
    Expected::matcher(StringContains(needle.into()))
}

/// Accept strings starting with `prefix`.
pub fn starts_with(prefix: impl Into<String>) -> Expected {
    Expected::matcher(StringStartsWith(prefix.into()))
}

/// Accept strings matching a regular expression.
///
/// # Errors
/// Returns [`Error::InvalidPattern`] if the pattern does not compile.
pub fn matches_regex(pattern: &str) -> Result<Expected> {
    Ok(Expected::matcher(MatchesRegex(Regex::new(pattern)?)))
}

/// Accept lists holding at least one element satisfying `element`.
pub fn contains_element(element: impl Into<Expected>) -> Expected {
    Expected::matcher(ContainsElement(element.into()))
}

/// Accept lists (or maps) where `accept` returns true for at least one
/// element. The callback receives the element and its position.
pub fn any_element<F>(accept: F) -> Expected
where
    F: Fn(&Value, usize) -> bool + Send + Sync + 'static,
{
    Expected::matcher(AnyElement(Box::new(accept)))
}

/// Accept lists or maps with exactly `expected` entries.
pub fn count(expected: usize) -> Expected {
    Expected::matcher(Count(expected))
}

/// Accept values for which `accept` returns true.
pub fn callback<F>(accept: F) -> Expected
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    Expected::matcher(Callback(Box::new(accept)))
}

/// Accept the type name of `T`, as recorded by doubles that capture the
/// concrete type of what they receive.
pub fn instance_of<T: ?Sized>() -> Expected {
    Expected::matcher(InstanceOf(any::type_name::<T>()))
}

/// Compare a list or map key by key. Every key error is reported, nested
/// expectations included. With `strict`, keys absent from `entries` are
/// reported as well.
///
/// Keys address map entries by name and list elements by their decimal
/// position.
pub fn array_contains<K, I>(entries: I, strict: bool) -> Expected
where
    K: Into<String>,
    I: IntoIterator<Item = (K, Expected)>,
{
    Expected::matcher(ArrayContains {
        entries: entries
            .into_iter()
            .map(|(key, expected)| (key.into(), expected))
            .collect(),
        strict,
    })
}

/// Positional variant of [`array_contains`].
pub fn array_contains_list(elements: Vec<Expected>, strict: bool) -> Expected {
    array_contains(
        elements
            .into_iter()
            .enumerate()
            .map(|(position, expected)| (position.to_string(), expected)),
        strict,
    )
}

/// Compare a map entry by entry, values by identity.
///
/// # Errors
/// Returns [`Error::InvalidArgument`] if `value` is not a map.
pub fn associative_contains(value: Value, strict: bool) -> Result<Expected> {
    let Value::Object(entries) = value else {
        return Err(Error::InvalidArgument(
            "Cannot use this constraint with non associative array, use list_contains instead."
                .to_owned(),
        ));
    };
    Ok(array_contains(
        entries
            .into_iter()
            .map(|(key, expected)| (key, Expected::Identical(expected))),
        strict,
    ))
}

/// Compare a list position by position, values by identity. Extra trailing
/// elements are accepted.
///
/// # Errors
/// Returns [`Error::InvalidArgument`] if `value` is not a list.
pub fn list_contains(value: Value) -> Result<Expected> {
    let Value::Array(elements) = value else {
        return Err(Error::InvalidArgument(
            "Cannot use this constraint with non list array, use associative_contains instead."
                .to_owned(),
        ));
    };
    Ok(Expected::matcher(ListContains(
        elements.into_iter().map(Expected::Identical).collect(),
    )))
}

struct EqualTo(Value);

impl Matcher for EqualTo {
    fn matches(&self, actual: &Value) -> bool {
        loosely_equal(&self.0, actual)
    }

    fn describe(&self) -> String {
        format!("is equal to {}", export(&self.0))
    }

    fn mismatch(&self, actual: &Value) -> Mismatch {
        match (&self.0, actual) {
            (Value::String(_), Value::String(_))
            | (Value::Array(_), Value::Array(_))
            | (Value::Object(_), Value::Object(_)) => {
                Mismatch::new("Failed asserting that two values are equal.").with_diff(&self.0, actual)
            }
            _ => Mismatch::new(format!(
                "Failed asserting that {} {}.",
                export(actual),
                self.describe()
            )),
        }
    }
}

fn loosely_equal(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Number(left), Value::Number(right)) => match (integer(left), integer(right)) {
            (Some(left), Some(right)) => left == right,
            _ => match (left.as_f64(), right.as_f64()) {
                (Some(left), Some(right)) => (left - right).abs() < f64::EPSILON,
                _ => left == right,
            },
        },
        (Value::Number(number), Value::String(text)) | (Value::String(text), Value::Number(number)) => {
            let text = text.trim();
            match (integer(number), text.parse::<i128>()) {
                (Some(left), Ok(right)) => left == right,
                _ => match (number.as_f64(), text.parse::<f64>()) {
                    (Some(left), Ok(right)) => (left - right).abs() < f64::EPSILON,
                    _ => false,
                },
            }
        }
        (Value::Array(left), Value::Array(right)) => {
            left.len() == right.len()
                && left
                    .iter()
                    .zip(right)
                    .all(|(left_item, right_item)| loosely_equal(left_item, right_item))
        }
        (Value::Object(left), Value::Object(right)) => {
            left.len() == right.len()
                && left.iter().all(|(key, left_item)| {
                    right
                        .get(key)
                        .is_some_and(|right_item| loosely_equal(left_item, right_item))
                })
        }
        _ => expected == actual,
    }
}

/// Integers compare exactly; only floats go through `f64`.
fn integer(number: &Number) -> Option<i128> {
    number
        .as_i64()
        .map(i128::from)
        .or_else(|| number.as_u64().map(i128::from))
}

struct AnyValue;

impl Matcher for AnyValue {
    fn matches(&self, _actual: &Value) -> bool {
        true
    }

    fn describe(&self) -> String {
        "is anything".to_owned()
    }
}

struct IsNull;

impl Matcher for IsNull {
    fn matches(&self, actual: &Value) -> bool {
        actual.is_null()
    }

    fn describe(&self) -> String {
        "is null".to_owned()
    }
}

struct Not(Expected);

impl Matcher for Not {
    fn matches(&self, actual: &Value) -> bool {
        !self.0.matches(actual)
    }

    fn describe(&self) -> String {
        format!("is not ({})", self.0.describe())
    }
}

struct StringContains(String);

impl Matcher for StringContains {
    fn matches(&self, actual: &Value) -> bool {
        actual.as_str().is_some_and(|text| text.contains(&self.0))
    }

    fn describe(&self) -> String {
        format!("contains \"{}\"", self.0)
    }
}

struct StringStartsWith(String);

impl Matcher for StringStartsWith {
    fn matches(&self, actual: &Value) -> bool {
        actual.as_str().is_some_and(|text| text.starts_with(&self.0))
    }

    fn describe(&self) -> String {
        format!("starts with \"{}\"", self.0)
    }
}

struct MatchesRegex(Regex);

impl Matcher for MatchesRegex {
    fn matches(&self, actual: &Value) -> bool {
        actual.as_str().is_some_and(|text| self.0.is_match(text))
    }

    fn describe(&self) -> String {
        format!("matches pattern \"{}\"", self.0.as_str())
    }
}

struct ContainsElement(Expected);

impl Matcher for ContainsElement {
    fn matches(&self, actual: &Value) -> bool {
        actual
            .as_array()
            .is_some_and(|elements| elements.iter().any(|element| self.0.matches(element)))
    }

    fn describe(&self) -> String {
        format!("contains an element that {}", self.0.describe())
    }
}

/// Element predicate receiving the element and its position.
type ElementPredicate = Box<dyn Fn(&Value, usize) -> bool + Send + Sync>;

struct AnyElement(ElementPredicate);

impl Matcher for AnyElement {
    fn matches(&self, actual: &Value) -> bool {
        match actual {
            Value::Array(elements) => elements
                .iter()
                .enumerate()
                .any(|(position, element)| (self.0)(element, position)),
            Value::Object(entries) => entries
                .values()
                .enumerate()
                .any(|(position, element)| (self.0)(element, position)),
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => false,
        }
    }

    fn describe(&self) -> String {
        "contains an element accepted by the callback".to_owned()
    }
}

struct Count(usize);

impl Matcher for Count {
    fn matches(&self, actual: &Value) -> bool {
        match actual {
            Value::Array(elements) => elements.len() == self.0,
            Value::Object(entries) => entries.len() == self.0,
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => false,
        }
    }

    fn describe(&self) -> String {
        format!("has {} element(s)", self.0)
    }
}

/// Value predicate used by [`callback`].
type ValuePredicate = Box<dyn Fn(&Value) -> bool + Send + Sync>;

struct Callback(ValuePredicate);

impl Matcher for Callback {
    fn matches(&self, actual: &Value) -> bool {
        (self.0)(actual)
    }

    fn describe(&self) -> String {
        "is accepted by specified callback".to_owned()
    }
}

struct InstanceOf(&'static str);

impl Matcher for InstanceOf {
    fn matches(&self, actual: &Value) -> bool {
        actual.as_str() == Some(self.0)
    }

    fn describe(&self) -> String {
        format!("is an instance of {}", self.0)
    }
}

fn lookup<'value>(actual: &'value Value, key: &str) -> Option<&'value Value> {
    match actual {
        Value::Object(entries) => entries.get(key),
        Value::Array(elements) => key
            .parse::<usize>()
            .ok()
            .and_then(|position| elements.get(position)),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => None,
    }
}

fn keys(actual: &Value) -> Vec<String> {
    match actual {
        Value::Object(entries) => entries.keys().cloned().collect(),
        Value::Array(elements) => (0..elements.len()).map(|position| position.to_string()).collect(),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => Vec::new(),
    }
}

struct ArrayContains {
    entries: Vec<(String, Expected)>,
    strict: bool,
}

impl ArrayContains {
    fn errors(&self, actual: &Value) -> Vec<String> {
        if !actual.is_array() && !actual.is_object() {
            return vec![format!(
                "Failed asserting that {} is a list or a map.",
                export(actual)
            )];
        }

        let mut errors = Vec::new();
        for (key, expected) in &self.entries {
            match lookup(actual, key) {
                None => errors.push(format!("Failed asserting that key/index \"{key}\" exist.")),
                Some(value) => {
                    if let Err(mismatch) = expected.evaluate(value) {
                        errors.push(format!("- key/index: {key}\n{mismatch}"));
                    }
                }
            }
        }

        if self.strict {
            for key in keys(actual) {
                if !self.entries.iter().any(|(declared, _)| *declared == key) {
                    errors.push(format!(
                        "Failed asserting that key/index \"{key}\" does not exist."
                    ));
                }
            }
        }

        errors
    }
}

impl Matcher for ArrayContains {
    fn matches(&self, actual: &Value) -> bool {
        self.errors(actual).is_empty()
    }

    fn describe(&self) -> String {
        "contains another array".to_owned()
    }

    fn mismatch(&self, actual: &Value) -> Mismatch {
        Mismatch::new(format!(
            "Failed asserting that an array {}.\n{}",
            self.describe(),
            self.errors(actual).join("\n\n")
        ))
    }
}

struct ListContains(Vec<Expected>);

impl ListContains {
    fn errors(&self, actual: &Value) -> Vec<String> {
        let elements = actual.as_array();
        self.0
            .iter()
            .enumerate()
            .filter_map(|(position, expected)| {
                match elements.and_then(|elements| elements.get(position)) {
                    None => Some(format!("{position}. Failed asserting that index {position} exists.")),
                    Some(element) => expected
                        .evaluate(element)
                        .err()
                        .map(|mismatch| format!("{position}. {}", mismatch.message())),
                }
            })
            .collect()
    }
}

impl Matcher for ListContains {
    fn matches(&self, actual: &Value) -> bool {
        actual.is_array() && self.errors(actual).is_empty()
    }

    fn describe(&self) -> String {
        "contains another list array".to_owned()
    }

    fn mismatch(&self, actual: &Value) -> Mismatch {
        if !actual.is_array() {
            return Mismatch::new(format!("Failed asserting that {} is a list.", export(actual)));
        }
        Mismatch::new(format!(
            "Failed asserting that a list {}.\n{}",
            self.describe(),
            self.errors(actual).join("\n")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_equal_to_is_loose_on_numbers() {
        let expected = equal_to(1);
        assert!(expected.matches(&json!(1.0)));
        assert!(expected.matches(&json!("1")));
        assert!(!expected.matches(&json!(2)));
        assert!(equal_to(json!({"a": [1, 2]})).matches(&json!({"a": [1.0, 2]})));
    }

    #[test]
    fn test_equal_to_keeps_large_integers_apart() {
        assert!(!equal_to(9_007_199_254_740_993u64).matches(&json!(9_007_199_254_740_992u64)));
        assert!(!equal_to(i64::MAX).matches(&json!(i64::MAX - 1)));
        assert!(!equal_to(9_007_199_254_740_993u64).matches(&json!("9007199254740992")));
        assert!(equal_to(u64::MAX).matches(&json!(u64::MAX)));
        assert!(equal_to(-3).matches(&json!(" -3 ")));
        assert!(equal_to(2).matches(&json!("2.0")));
    }

    #[test]
    fn test_string_matchers() {
        assert!(contains_str("ell").matches(&json!("hello")));
        assert!(!contains_str("ell").matches(&json!(12)));
        assert!(starts_with("he").matches(&json!("hello")));
        assert!(!starts_with("lo").matches(&json!("hello")));

        let pattern = matches_regex(r"^user-\d+$").unwrap();
        assert!(pattern.matches(&json!("user-42")));
        assert!(!pattern.matches(&json!("user-x")));
        assert_eq!(pattern.describe(), "matches pattern \"^user-\\d+$\"");
    }

    #[test]
    fn test_invalid_regex_is_configuration_error() {
        let error = matches_regex("(unclosed").unwrap_err();
        assert!(matches!(error, Error::InvalidPattern(_)));
    }

    #[test]
    fn test_not_and_null() {
        assert!(is_null().matches(&Value::Null));
        assert!(not(is_null()).matches(&json!(0)));
        assert!(!not("a").matches(&json!("a")));
        assert!(any_value().matches(&Value::Null));
    }

    #[test]
    fn test_collection_matchers() {
        let list = json!(["a", "b", "c"]);
        assert!(contains_element("b").matches(&list));
        assert!(!contains_element("z").matches(&list));
        assert!(count(3).matches(&list));
        assert!(!count(2).matches(&list));
        assert!(count(1).matches(&json!({"k": 1})));
        assert!(any_element(|element, position| position == 2 && element == "c").matches(&list));
        assert!(callback(Value::is_array).matches(&list));
    }

    #[test]
    fn test_instance_of_compares_type_names() {
        let expected = instance_of::<String>();
        assert!(expected.matches(&json!(any::type_name::<String>())));
        assert!(!expected.matches(&json!("u8")));
    }

    #[test]
    fn test_array_contains_reports_every_key() {
        let expected = array_contains(
            [
                (
                    "a",
                    array_contains([("c", Expected::from("onae")), ("h", Expected::from("two"))], true),
                ),
                ("b", Expected::from(json!({"t": "threae"}))),
                ("missing", any_value()),
            ],
            true,
        );
        let actual = json!({
            "a": {"c": "one", "h": "two"},
            "b": {"t": "three"},
            "extra": 1,
        });

        let mismatch = expected.evaluate(&actual).unwrap_err();
        let rendered = mismatch.to_string();

        assert!(rendered.starts_with("Failed asserting that an array contains another array."));
        assert!(rendered.contains("- key/index: a\n"));
        assert!(rendered.contains("- key/index: c\n"));
        assert!(rendered.contains("- key/index: b\n"));
        assert!(rendered.contains("key/index \"missing\" exist."));
        assert!(rendered.contains("key/index \"extra\" does not exist."));
    }

    #[test]
    fn test_array_contains_lenient_ignores_extra_keys() {
        let expected = array_contains([("a", Expected::from(1))], false);
        assert!(expected.matches(&json!({"a": 1, "b": 2})));
        assert!(!array_contains([("a", Expected::from(1))], true).matches(&json!({"a": 1, "b": 2})));
    }

    #[test]
    fn test_array_contains_list_by_position() {
        let expected = array_contains_list(vec![Expected::from("x"), contains_str("y")], true);
        assert!(expected.matches(&json!(["x", "yy"])));
        assert!(!expected.matches(&json!(["x", "yy", "z"])));
        assert!(!expected.matches(&json!("x")));
    }

    #[test]
    fn test_associative_contains_rejects_lists() {
        let error = associative_contains(json!([1, 2]), true).unwrap_err();
        assert!(matches!(error, Error::InvalidArgument(_)));

        let expected = associative_contains(json!({"a": 1}), false).unwrap();
        assert!(expected.matches(&json!({"a": 1, "b": 2})));
    }

    #[test]
    fn test_list_contains() {
        let error = list_contains(json!({"a": 1})).unwrap_err();
        assert!(matches!(error, Error::InvalidArgument(_)));

        let expected = list_contains(json!(["a", "b"])).unwrap();
        assert!(expected.matches(&json!(["a", "b", "c"])));

        let mismatch = expected.evaluate(&json!(["a"])).unwrap_err();
        assert!(mismatch.message().contains("1. Failed asserting that index 1 exists."));

        let mismatch = expected.evaluate(&json!(["z", "b"])).unwrap_err();
        assert!(mismatch.message().contains("0. Failed asserting that two strings are identical."));
    }
}
