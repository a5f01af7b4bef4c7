//! Assertion facade.
//!
//! [`TestContext`] is handed to every test body. Each assertion builds the
//! matching [`Constraint`], adds its weight to the assertion counter and
//! evaluates it; a mismatch comes back as [`TestError::Failure`]. Arguments
//! of the wrong shape are rejected with [`TestError::InvalidArgument`]
//! before anything is counted.

use crate::comparator::EqualsOptions;
use crate::constraint::{self, Constraint};
use crate::failure::{AssertionFailure, TestError};
use crate::value::{ArrayKey, Value};

type AssertResult = Result<(), TestError>;

/// Per-invocation assertion state: counter, captured output and resource log.
#[derive(Debug, Default)]
pub struct TestContext {
    assertions: usize,
    output: String,
    resource_uses: Vec<String>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assertions performed so far, failed ones included.
    pub fn assertion_count(&self) -> usize {
        self.assertions
    }

    pub fn add_assertions(&mut self, count: usize) {
        self.assertions += count;
    }

    /// Output printed by the test.
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn has_output(&self) -> bool {
        !self.output.is_empty()
    }

    pub fn print(&mut self, text: impl AsRef<str>) {
        self.output.push_str(text.as_ref());
    }

    /// Record that `function` touched an external resource at `location`.
    pub fn use_resource(&mut self, function: &str, location: &str) {
        self.resource_uses
            .push(format!("{}() used in {}", function, location));
    }

    pub fn resource_uses(&self) -> &[String] {
        &self.resource_uses
    }

    // ========================================================================
    // Core
    // ========================================================================

    /// Evaluate `constraint` against `value`, prefixing any failure with
    /// `message`.
    pub fn assert_that(&mut self, value: &Value, constraint: &Constraint, message: &str) -> AssertResult {
        self.assertions += constraint.count();
        constraint.evaluate(value, message)
    }

    fn check(&mut self, value: impl Into<Value>, constraint: Constraint) -> AssertResult {
        self.assert_that(&value.into(), &constraint, "")
    }

    pub fn fail(&self, message: impl Into<String>) -> TestError {
        AssertionFailure::new(message).into()
    }

    pub fn mark_incomplete(&self, message: impl Into<String>) -> TestError {
        AssertionFailure::incomplete(message).into()
    }

    pub fn mark_skipped(&self, message: impl Into<String>) -> TestError {
        AssertionFailure::skipped(message).into()
    }

    pub fn read_attribute(&self, object: &Value, name: &str) -> Result<Value, TestError> {
        constraint::read_attribute(object, name)
    }

    // ========================================================================
    // Equality and identity
    // ========================================================================

    pub fn assert_equals(&mut self, expected: impl Into<Value>, actual: impl Into<Value>) -> AssertResult {
        self.check(actual, Constraint::equal_to(expected))
    }

    pub fn assert_equals_with(
        &mut self,
        expected: impl Into<Value>,
        actual: impl Into<Value>,
        options: EqualsOptions,
    ) -> AssertResult {
        self.check(actual, Constraint::equal_with(expected, options))
    }

    pub fn assert_not_equals(&mut self, expected: impl Into<Value>, actual: impl Into<Value>) -> AssertResult {
        self.check(actual, Constraint::not(Constraint::equal_to(expected)))
    }

    pub fn assert_not_equals_with(
        &mut self,
        expected: impl Into<Value>,
        actual: impl Into<Value>,
        options: EqualsOptions,
    ) -> AssertResult {
        self.check(actual, Constraint::not(Constraint::equal_with(expected, options)))
    }

    pub fn assert_same(&mut self, expected: impl Into<Value>, actual: impl Into<Value>) -> AssertResult {
        self.check(actual, Constraint::identical_to(expected))
    }

    pub fn assert_not_same(&mut self, expected: impl Into<Value>, actual: impl Into<Value>) -> AssertResult {
        self.check(actual, Constraint::not(Constraint::identical_to(expected)))
    }

    pub fn assert_attribute_equals(
        &mut self,
        expected: impl Into<Value>,
        attribute: &str,
        object: &Value,
    ) -> AssertResult {
        if !matches!(object, Value::Object(_)) {
            return Err(TestError::invalid_argument(3, "assert_attribute_equals", "object"));
        }
        let constraint = Constraint::attribute(attribute, Constraint::equal_to(expected));
        self.assert_that(object, &constraint, "")
    }

    // ========================================================================
    // Scalars
    // ========================================================================

    pub fn assert_true(&mut self, condition: impl Into<Value>) -> AssertResult {
        self.check(condition, Constraint::IsTrue)
    }

    pub fn assert_false(&mut self, condition: impl Into<Value>) -> AssertResult {
        self.check(condition, Constraint::IsFalse)
    }

    pub fn assert_null(&mut self, actual: impl Into<Value>) -> AssertResult {
        self.check(actual, Constraint::IsNull)
    }

    pub fn assert_not_null(&mut self, actual: impl Into<Value>) -> AssertResult {
        self.check(actual, Constraint::not(Constraint::IsNull))
    }

    pub fn assert_nan(&mut self, actual: impl Into<Value>) -> AssertResult {
        self.check(actual, Constraint::IsNan)
    }

    pub fn assert_finite(&mut self, actual: impl Into<Value>) -> AssertResult {
        self.check(actual, Constraint::IsFinite)
    }

    pub fn assert_infinite(&mut self, actual: impl Into<Value>) -> AssertResult {
        self.check(actual, Constraint::IsInfinite)
    }

    pub fn assert_greater_than(&mut self, expected: impl Into<Value>, actual: impl Into<Value>) -> AssertResult {
        self.check(actual, Constraint::greater_than(expected))
    }

    pub fn assert_greater_than_or_equal(
        &mut self,
        expected: impl Into<Value>,
        actual: impl Into<Value>,
    ) -> AssertResult {
        self.check(actual, Constraint::greater_than_or_equal(expected))
    }

    pub fn assert_less_than(&mut self, expected: impl Into<Value>, actual: impl Into<Value>) -> AssertResult {
        self.check(actual, Constraint::less_than(expected))
    }

    pub fn assert_less_than_or_equal(
        &mut self,
        expected: impl Into<Value>,
        actual: impl Into<Value>,
    ) -> AssertResult {
        self.check(actual, Constraint::less_than_or_equal(expected))
    }

    // ========================================================================
    // Types
    // ========================================================================

    pub fn assert_instance_of(&mut self, class: &str, actual: impl Into<Value>) -> AssertResult {
        if class.is_empty() {
            return Err(TestError::invalid_argument(1, "assert_instance_of", "class or interface name"));
        }
        self.check(actual, Constraint::instance_of(class))
    }

    pub fn assert_not_instance_of(&mut self, class: &str, actual: impl Into<Value>) -> AssertResult {
        if class.is_empty() {
            return Err(TestError::invalid_argument(1, "assert_not_instance_of", "class or interface name"));
        }
        self.check(actual, Constraint::not(Constraint::instance_of(class)))
    }

    pub fn assert_internal_type(&mut self, type_name: &str, actual: impl Into<Value>) -> AssertResult {
        let constraint = Constraint::is_type(type_name)
            .map_err(|_| TestError::invalid_argument(1, "assert_internal_type", "valid type name"))?;
        self.check(actual, constraint)
    }

    pub fn assert_not_internal_type(&mut self, type_name: &str, actual: impl Into<Value>) -> AssertResult {
        let constraint = Constraint::is_type(type_name)
            .map_err(|_| TestError::invalid_argument(1, "assert_not_internal_type", "valid type name"))?;
        self.check(actual, Constraint::not(constraint))
    }

    pub fn assert_object_has_attribute(&mut self, attribute: &str, object: impl Into<Value>) -> AssertResult {
        self.object_attribute(attribute, object.into(), false)
    }

    pub fn assert_object_not_has_attribute(&mut self, attribute: &str, object: impl Into<Value>) -> AssertResult {
        self.object_attribute(attribute, object.into(), true)
    }

    fn object_attribute(&mut self, attribute: &str, object: Value, negated: bool) -> AssertResult {
        let function = if negated {
            "assert_object_not_has_attribute"
        } else {
            "assert_object_has_attribute"
        };
        if !is_attribute_name(attribute) {
            return Err(TestError::invalid_argument(1, function, "valid attribute name"));
        }
        if !matches!(object, Value::Object(_)) {
            return Err(TestError::invalid_argument(2, function, "object"));
        }
        let mut constraint = Constraint::has_attribute(attribute);
        if negated {
            constraint = Constraint::not(constraint);
        }
        self.assert_that(&object, &constraint, "")
    }

    // ========================================================================
    // Collections
    // ========================================================================

    pub fn assert_empty(&mut self, actual: impl Into<Value>) -> AssertResult {
        self.check(actual, Constraint::IsEmpty)
    }

    pub fn assert_not_empty(&mut self, actual: impl Into<Value>) -> AssertResult {
        self.check(actual, Constraint::not(Constraint::IsEmpty))
    }

    pub fn assert_count(&mut self, expected: usize, haystack: impl Into<Value>) -> AssertResult {
        let haystack = countable(haystack.into(), 2, "assert_count")?;
        self.assert_that(&haystack, &Constraint::has_count(expected), "")
    }

    pub fn assert_not_count(&mut self, expected: usize, haystack: impl Into<Value>) -> AssertResult {
        let haystack = countable(haystack.into(), 2, "assert_not_count")?;
        self.assert_that(&haystack, &Constraint::not(Constraint::has_count(expected)), "")
    }

    pub fn assert_same_size(&mut self, expected: impl Into<Value>, actual: impl Into<Value>) -> AssertResult {
        let expected = countable(expected.into(), 1, "assert_same_size")?;
        let actual = countable(actual.into(), 2, "assert_same_size")?;
        let constraint = Constraint::same_size(&expected)?;
        self.assert_that(&actual, &constraint, "")
    }

    /// Array membership, or substring search when `haystack` is a string.
    pub fn assert_contains(&mut self, needle: impl Into<Value>, haystack: impl Into<Value>) -> AssertResult {
        let pair = contains_constraint(needle.into(), &haystack.into(), "assert_contains")?;
        self.check_pair(pair)
    }

    pub fn assert_not_contains(&mut self, needle: impl Into<Value>, haystack: impl Into<Value>) -> AssertResult {
        let (constraint, haystack) =
            contains_constraint(needle.into(), &haystack.into(), "assert_not_contains")?;
        self.check_pair((Constraint::not(constraint), haystack))
    }

    fn check_pair(&mut self, (constraint, haystack): (Constraint, Value)) -> AssertResult {
        self.assert_that(&haystack, &constraint, "")
    }

    /// Every element of `haystack` is of the native type `type_name`.
    pub fn assert_contains_only(&mut self, type_name: &str, haystack: impl Into<Value>) -> AssertResult {
        let haystack = haystack.into();
        if haystack.as_array().is_none() {
            return Err(TestError::invalid_argument(2, "assert_contains_only", "array or traversable"));
        }
        let constraint = Constraint::contains_only(type_name, true)
            .map_err(|_| TestError::invalid_argument(1, "assert_contains_only", "valid type name"))?;
        self.assert_that(&haystack, &constraint, "")
    }

    /// Every element of `haystack` is an instance of `class`.
    pub fn assert_contains_only_instances_of(&mut self, class: &str, haystack: impl Into<Value>) -> AssertResult {
        let haystack = haystack.into();
        if haystack.as_array().is_none() {
            return Err(TestError::invalid_argument(
                2,
                "assert_contains_only_instances_of",
                "array or traversable",
            ));
        }
        let constraint = Constraint::contains_only(class, false)?;
        self.assert_that(&haystack, &constraint, "")
    }

    pub fn assert_array_has_key(&mut self, key: impl Into<ArrayKey>, array: impl Into<Value>) -> AssertResult {
        let array = array.into();
        if array.as_array().is_none() {
            return Err(TestError::invalid_argument(2, "assert_array_has_key", "array"));
        }
        self.assert_that(&array, &Constraint::array_has_key(key), "")
    }

    pub fn assert_array_not_has_key(&mut self, key: impl Into<ArrayKey>, array: impl Into<Value>) -> AssertResult {
        let array = array.into();
        if array.as_array().is_none() {
            return Err(TestError::invalid_argument(2, "assert_array_not_has_key", "array"));
        }
        self.assert_that(&array, &Constraint::not(Constraint::array_has_key(key)), "")
    }

    // ========================================================================
    // Strings and JSON
    // ========================================================================

    pub fn assert_regex(&mut self, pattern: &str, subject: impl Into<Value>) -> AssertResult {
        let constraint = Constraint::matches_regex(pattern)
            .map_err(|_| TestError::invalid_argument(1, "assert_regex", "valid regular expression"))?;
        let subject = string_argument(subject.into(), 2, "assert_regex")?;
        self.assert_that(&subject, &constraint, "")
    }

    pub fn assert_not_regex(&mut self, pattern: &str, subject: impl Into<Value>) -> AssertResult {
        let constraint = Constraint::matches_regex(pattern)
            .map_err(|_| TestError::invalid_argument(1, "assert_not_regex", "valid regular expression"))?;
        let subject = string_argument(subject.into(), 2, "assert_not_regex")?;
        self.assert_that(&subject, &Constraint::not(constraint), "")
    }

    pub fn assert_string_starts_with(&mut self, prefix: &str, subject: impl Into<Value>) -> AssertResult {
        let subject = string_argument(subject.into(), 2, "assert_string_starts_with")?;
        self.assert_that(&subject, &Constraint::starts_with(prefix), "")
    }

    pub fn assert_string_ends_with(&mut self, suffix: &str, subject: impl Into<Value>) -> AssertResult {
        let subject = string_argument(subject.into(), 2, "assert_string_ends_with")?;
        self.assert_that(&subject, &Constraint::ends_with(suffix), "")
    }

    pub fn assert_json(&mut self, candidate: impl Into<Value>) -> AssertResult {
        let candidate = string_argument(candidate.into(), 1, "assert_json")?;
        self.assert_that(&candidate, &Constraint::IsJson, "")
    }

    /// Both texts are valid JSON and decode to the same document.
    pub fn assert_json_string_equals_json_string(&mut self, expected: &str, actual: &str) -> AssertResult {
        self.assert_json(expected)?;
        self.assert_json(actual)?;
        self.check(actual, Constraint::json_matches(expected))
    }

    pub fn assert_json_string_not_equals_json_string(&mut self, expected: &str, actual: &str) -> AssertResult {
        self.assert_json(expected)?;
        self.assert_json(actual)?;
        self.check(actual, Constraint::not(Constraint::json_matches(expected)))
    }
}

fn countable(value: Value, argument: usize, function: &'static str) -> Result<Value, TestError> {
    match value.count() {
        Some(_) => Ok(value),
        None => Err(TestError::invalid_argument(argument, function, "countable or traversable")),
    }
}

fn string_argument(value: Value, argument: usize, function: &'static str) -> Result<Value, TestError> {
    match value {
        Value::String(_) => Ok(value),
        _ => Err(TestError::invalid_argument(argument, function, "string")),
    }
}

fn contains_constraint(
    needle: Value,
    haystack: &Value,
    function: &'static str,
) -> Result<(Constraint, Value), TestError> {
    match haystack {
        Value::Array(_) => Ok((Constraint::contains(needle), haystack.clone())),
        Value::String(_) => {
            let needle = needle
                .scalar_to_string()
                .ok_or_else(|| TestError::invalid_argument(1, function, "string"))?;
            Ok((Constraint::string_contains(needle, false), haystack.clone()))
        }
        _ => Err(TestError::invalid_argument(2, function, "array, traversable or string")),
    }
}

fn is_attribute_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first == '_' || first.is_alphabetic() => {
            chars.all(|c| c == '_' || c.is_alphanumeric())
        }
        _ => false,
    }
}
