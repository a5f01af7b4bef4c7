//! Composable, self-describing predicates over values.
//!
//! A [`Constraint`] can be asked whether a value satisfies it
//! ([`Constraint::matches`]) or be evaluated in assertion mode
//! ([`Constraint::evaluate`]), where a mismatch becomes an
//! [`AssertionFailure`] whose message reads
//! `Failed asserting that <failure description>.`

mod describe;
mod matching;

pub use matching::NativeType;

use crate::comparator::{ComparatorFactory, ComparisonFailure, EqualsOptions};
use crate::exporter::export;
use crate::failure::{AssertionFailure, TestError};
use crate::value::{ArrayKey, Value};
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// Predicate used by [`Constraint::Callback`].
#[derive(Clone)]
pub struct Predicate(Arc<dyn Fn(&Value) -> bool + Send + Sync>);

impl Predicate {
    pub fn new(f: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        Predicate(Arc::new(f))
    }

    fn call(&self, value: &Value) -> bool {
        (self.0)(value)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

#[derive(Debug, Clone)]
pub enum Constraint {
    /// Accepts every value; counts as no assertion
    Anything,
    IsEqual {
        value: Value,
        options: EqualsOptions,
    },
    IsIdentical(Value),
    IsType {
        name: String,
        native: NativeType,
    },
    IsInstanceOf(String),
    IsNull,
    IsTrue,
    IsFalse,
    IsNan,
    IsFinite,
    IsInfinite,
    IsEmpty,
    IsJson,
    JsonMatches(String),
    GreaterThan(Value),
    LessThan(Value),
    Count(usize),
    ArrayHasKey(ArrayKey),
    TraversableContains {
        value: Value,
        check_object_identity: bool,
        check_non_object_identity: bool,
    },
    TraversableContainsOnly {
        type_name: String,
        inner: Box<Constraint>,
    },
    StringContains {
        needle: String,
        ignore_case: bool,
    },
    StringStartsWith(String),
    StringEndsWith(String),
    RegexMatch(Regex),
    ObjectHasAttribute(String),
    Callback(Predicate),
    And(Vec<Constraint>),
    Or(Vec<Constraint>),
    Xor(Vec<Constraint>),
    Not(Box<Constraint>),
    /// Evaluate `inner` against a field of the object, whatever its visibility
    Attribute {
        name: String,
        inner: Box<Constraint>,
    },
}

// ============================================================================
// Constructors
// ============================================================================

impl Constraint {
    pub fn equal_to(value: impl Into<Value>) -> Self {
        Self::equal_with(value, EqualsOptions::default())
    }

    pub fn equal_with(value: impl Into<Value>, options: EqualsOptions) -> Self {
        Constraint::IsEqual {
            value: value.into(),
            options,
        }
    }

    pub fn identical_to(value: impl Into<Value>) -> Self {
        Constraint::IsIdentical(value.into())
    }

    /// Type check by name (`int`, `string`, `numeric`, `scalar`, ...).
    pub fn is_type(name: &str) -> Result<Self, TestError> {
        let native = NativeType::parse(name)
            .ok_or_else(|| TestError::invalid_argument(1, "is_type", "valid type name"))?;
        Ok(Constraint::IsType {
            name: name.to_string(),
            native,
        })
    }

    pub fn instance_of(class: impl Into<String>) -> Self {
        Constraint::IsInstanceOf(class.into())
    }

    pub fn greater_than(value: impl Into<Value>) -> Self {
        Constraint::GreaterThan(value.into())
    }

    pub fn less_than(value: impl Into<Value>) -> Self {
        Constraint::LessThan(value.into())
    }

    pub fn greater_than_or_equal(value: impl Into<Value>) -> Self {
        let value = value.into();
        Constraint::Or(vec![
            Constraint::equal_to(value.clone()),
            Constraint::GreaterThan(value),
        ])
    }

    pub fn less_than_or_equal(value: impl Into<Value>) -> Self {
        let value = value.into();
        Constraint::Or(vec![
            Constraint::equal_to(value.clone()),
            Constraint::LessThan(value),
        ])
    }

    pub fn has_count(expected: usize) -> Self {
        Constraint::Count(expected)
    }

    /// Count matching the size of `reference`.
    pub fn same_size(reference: &Value) -> Result<Self, TestError> {
        reference
            .count()
            .map(Constraint::Count)
            .ok_or_else(|| TestError::invalid_argument(1, "same_size", "countable"))
    }

    pub fn array_has_key(key: impl Into<ArrayKey>) -> Self {
        Constraint::ArrayHasKey(key.into())
    }

    /// Membership; objects are looked up by identity, other values by equality.
    pub fn contains(value: impl Into<Value>) -> Self {
        Self::contains_with(value, true, false)
    }

    pub fn contains_with(
        value: impl Into<Value>,
        check_object_identity: bool,
        check_non_object_identity: bool,
    ) -> Self {
        Constraint::TraversableContains {
            value: value.into(),
            check_object_identity,
            check_non_object_identity,
        }
    }

    /// Every element is of the native type (or class) `type_name`.
    pub fn contains_only(type_name: &str, is_native_type: bool) -> Result<Self, TestError> {
        let inner = if is_native_type {
            Constraint::is_type(type_name)?
        } else {
            Constraint::instance_of(type_name)
        };
        Ok(Constraint::TraversableContainsOnly {
            type_name: type_name.to_string(),
            inner: Box::new(inner),
        })
    }

    pub fn string_contains(needle: impl Into<String>, ignore_case: bool) -> Self {
        Constraint::StringContains {
            needle: needle.into(),
            ignore_case,
        }
    }

    pub fn starts_with(prefix: impl Into<String>) -> Self {
        Constraint::StringStartsWith(prefix.into())
    }

    pub fn ends_with(suffix: impl Into<String>) -> Self {
        Constraint::StringEndsWith(suffix.into())
    }

    pub fn matches_regex(pattern: &str) -> Result<Self, TestError> {
        Regex::new(pattern)
            .map(Constraint::RegexMatch)
            .map_err(|_| TestError::invalid_argument(1, "matches_regex", "valid regular expression"))
    }

    pub fn json_matches(expected_json: impl Into<String>) -> Self {
        Constraint::JsonMatches(expected_json.into())
    }

    pub fn has_attribute(name: impl Into<String>) -> Self {
        Constraint::ObjectHasAttribute(name.into())
    }

    pub fn callback(f: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        Constraint::Callback(Predicate::new(f))
    }

    pub fn attribute(name: impl Into<String>, inner: Constraint) -> Self {
        Constraint::Attribute {
            name: name.into(),
            inner: Box::new(inner),
        }
    }

    pub fn not(inner: Constraint) -> Self {
        Constraint::Not(Box::new(inner))
    }

    pub fn all_of(constraints: Vec<Constraint>) -> Self {
        Constraint::And(constraints)
    }

    pub fn any_of(constraints: Vec<Constraint>) -> Self {
        Constraint::Or(constraints)
    }

    pub fn one_of(constraints: Vec<Constraint>) -> Self {
        Constraint::Xor(constraints)
    }
}

// ============================================================================
// Evaluation
// ============================================================================

impl Constraint {
    /// Number of atomic assertions this constraint stands for.
    pub fn count(&self) -> usize {
        match self {
            Constraint::Anything => 0,
            Constraint::And(children) | Constraint::Or(children) | Constraint::Xor(children) => {
                children.iter().map(Constraint::count).sum()
            }
            Constraint::Not(inner) | Constraint::Attribute { inner, .. } => inner.count(),
            _ => 1,
        }
    }

    /// Evaluate in assertion mode.
    ///
    /// A mismatch is returned as [`TestError::Failure`], prefixed with
    /// `description` on its own line when one is given.
    pub fn evaluate(&self, other: &Value, description: &str) -> Result<(), TestError> {
        match self {
            Constraint::IsEqual { value, options } => {
                if value.identical(other) {
                    return Ok(());
                }
                ComparatorFactory::shared()
                    .assert_equals(value, other, options)
                    .map_err(|failure| {
                        let message = format!("{}\n{}", description, failure.message());
                        AssertionFailure::expectation(message.trim(), Some(failure)).into()
                    })
            }
            Constraint::IsIdentical(value) => {
                if self.matches(other) {
                    return Ok(());
                }
                let comparison = match (value, other) {
                    (Value::String(_), Value::String(_)) => Some(ComparisonFailure::new(
                        value,
                        other,
                        export(value),
                        export(other),
                        "",
                    )),
                    (Value::Array(_), Value::Array(_)) => Some(ComparisonFailure::new(
                        value,
                        other,
                        export(value),
                        export(other),
                        "",
                    )),
                    _ => None,
                };
                Err(self.fail(other, description, comparison).into())
            }
            Constraint::JsonMatches(expected) => {
                if self.matches(other) {
                    return Ok(());
                }
                let comparison = match (pretty_json(expected), other.as_str().and_then(pretty_json)) {
                    (Some(e), Some(a)) => Some(ComparisonFailure::new(
                        &Value::string(expected),
                        other,
                        e,
                        a,
                        "",
                    )),
                    _ => None,
                };
                Err(self.fail(other, description, comparison).into())
            }
            Constraint::Attribute { name, inner } => {
                let value = read_attribute(other, name)?;
                inner
                    .evaluate(&value, description)
                    .map_err(|error| match error {
                        TestError::Failure(_) => self.fail(&value, description, None).into(),
                        other => other,
                    })
            }
            _ => {
                if self.matches(other) {
                    Ok(())
                } else {
                    Err(self.fail(other, description, None).into())
                }
            }
        }
    }

    /// Build the failure for `other`.
    pub fn fail(
        &self,
        other: &Value,
        description: &str,
        comparison: Option<ComparisonFailure>,
    ) -> AssertionFailure {
        let mut message = format!("Failed asserting that {}.", self.failure_description(other));
        if !description.is_empty() {
            message = format!("{}\n{}", description, message);
        }
        AssertionFailure::expectation(message, comparison)
    }
}

/// Read a field of an object regardless of its visibility.
pub fn read_attribute(object: &Value, name: &str) -> Result<Value, TestError> {
    match object {
        Value::Object(obj) => obj.read_attribute(name).ok_or_else(|| {
            TestError::Uncaught(anyhow::anyhow!("Attribute \"{}\" not found in object.", name))
        }),
        _ => Err(TestError::invalid_argument(2, "read_attribute", "object")),
    }
}

fn pretty_json(text: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|json| serde_json::to_string_pretty(&json).ok())
}
