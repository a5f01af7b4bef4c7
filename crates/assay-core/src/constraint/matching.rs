use super::{read_attribute, Constraint};
use crate::comparator::{equals, EqualsOptions, EPSILON};
use crate::value::Value;
use std::cmp::Ordering;

/// Native type names understood by [`Constraint::IsType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeType {
    Array,
    Bool,
    Float,
    Int,
    Null,
    Numeric,
    Object,
    Resource,
    String,
    Scalar,
    Iterable,
}

impl NativeType {
    pub fn parse(name: &str) -> Option<Self> {
        let native = match name {
            "array" => NativeType::Array,
            "boolean" | "bool" => NativeType::Bool,
            "double" | "float" | "real" => NativeType::Float,
            "integer" | "int" => NativeType::Int,
            "null" => NativeType::Null,
            "numeric" => NativeType::Numeric,
            "object" => NativeType::Object,
            "resource" => NativeType::Resource,
            "string" => NativeType::String,
            "scalar" => NativeType::Scalar,
            "iterable" => NativeType::Iterable,
            _ => return None,
        };
        Some(native)
    }

    pub fn matches(self, value: &Value) -> bool {
        match self {
            NativeType::Array | NativeType::Iterable => matches!(value, Value::Array(_)),
            NativeType::Bool => matches!(value, Value::Bool(_)),
            NativeType::Float => matches!(value, Value::Float(_)),
            NativeType::Int => matches!(value, Value::Int(_)),
            NativeType::Null => matches!(value, Value::Null),
            NativeType::Numeric => value.is_numeric(),
            NativeType::Object => value.is_object_like(),
            NativeType::Resource => matches!(value, Value::Resource(_)),
            NativeType::String => matches!(value, Value::String(_)),
            NativeType::Scalar => value.is_scalar(),
        }
    }
}

impl Constraint {
    /// Evaluate without raising.
    pub fn matches(&self, other: &Value) -> bool {
        match self {
            Constraint::Anything => true,
            Constraint::IsEqual { value, options } => {
                value.identical(other) || equals(value, other, options)
            }
            Constraint::IsIdentical(value) => identical(value, other),
            Constraint::IsType { native, .. } => native.matches(other),
            Constraint::IsInstanceOf(class) => match other {
                Value::Object(obj) => obj.is_instance_of(class),
                _ => other.class_name().as_deref() == Some(class.as_str()),
            },
            Constraint::IsNull => matches!(other, Value::Null),
            Constraint::IsTrue => matches!(other, Value::Bool(true)),
            Constraint::IsFalse => matches!(other, Value::Bool(false)),
            Constraint::IsNan => matches!(other, Value::Float(f) if f.is_nan()),
            Constraint::IsFinite => match other {
                Value::Int(_) => true,
                Value::Float(f) => f.is_finite(),
                _ => false,
            },
            Constraint::IsInfinite => matches!(other, Value::Float(f) if f.is_infinite()),
            Constraint::IsEmpty => is_empty(other),
            Constraint::IsJson => other
                .as_str()
                .map(|s| json_error(s).is_none())
                .unwrap_or(false),
            Constraint::JsonMatches(expected) => match other.as_str() {
                Some(actual) => {
                    let decode = |s: &str| serde_json::from_str::<serde_json::Value>(s).ok();
                    matches!((decode(expected), decode(actual)), (Some(e), Some(a)) if e == a)
                }
                None => false,
            },
            Constraint::GreaterThan(value) => loose_order(value, other) == Some(Ordering::Less),
            Constraint::LessThan(value) => loose_order(value, other) == Some(Ordering::Greater),
            Constraint::Count(expected) => other.count() == Some(*expected),
            Constraint::ArrayHasKey(key) => other
                .as_array()
                .map(|arr| arr.contains_key(key))
                .unwrap_or(false),
            Constraint::TraversableContains {
                value,
                check_object_identity,
                check_non_object_identity,
            } => {
                let Some(haystack) = other.as_array() else {
                    return false;
                };
                let by_identity = if matches!(value, Value::Object(_) | Value::Resource(_)) {
                    *check_object_identity
                } else {
                    *check_non_object_identity
                };
                haystack.values().any(|element| {
                    if by_identity {
                        value.identical(element)
                    } else {
                        equals(value, element, &EqualsOptions::default())
                    }
                })
            }
            Constraint::TraversableContainsOnly { inner, .. } => other
                .as_array()
                .map(|arr| arr.values().all(|element| inner.matches(element)))
                .unwrap_or(false),
            Constraint::StringContains {
                needle,
                ignore_case,
            } => match other.scalar_to_string() {
                Some(haystack) if *ignore_case => {
                    haystack.to_lowercase().contains(&needle.to_lowercase())
                }
                Some(haystack) => haystack.contains(needle.as_str()),
                None => false,
            },
            Constraint::StringStartsWith(prefix) => other
                .as_str()
                .map(|s| s.starts_with(prefix.as_str()))
                .unwrap_or(false),
            Constraint::StringEndsWith(suffix) => other
                .as_str()
                .map(|s| s.ends_with(suffix.as_str()))
                .unwrap_or(false),
            Constraint::RegexMatch(regex) => other
                .as_str()
                .map(|s| regex.is_match(s))
                .unwrap_or(false),
            Constraint::ObjectHasAttribute(name) => match other {
                Value::Object(obj) => obj.has_attribute(name),
                _ => false,
            },
            Constraint::Callback(predicate) => predicate.call(other),
            Constraint::And(children) => children.iter().all(|c| c.matches(other)),
            Constraint::Or(children) => children.iter().any(|c| c.matches(other)),
            Constraint::Xor(children) => children
                .iter()
                .map(|c| c.matches(other))
                .reduce(|acc, next| acc ^ next)
                .unwrap_or(false),
            Constraint::Not(inner) => !inner.matches(other),
            Constraint::Attribute { name, inner } => read_attribute(other, name)
                .map(|value| inner.matches(&value))
                .unwrap_or(false),
        }
    }
}

/// Identity with a tolerance for floats.
fn identical(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Float(e), Value::Float(a)) if e.is_finite() && a.is_finite() => {
            (e - a).abs() < EPSILON
        }
        _ => expected.identical(actual),
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Int(i) => *i == 0,
        Value::Float(f) => *f == 0.0,
        Value::String(s) => s.is_empty(),
        Value::Array(arr) => arr.is_empty(),
        _ => false,
    }
}

/// Order `expected` against `actual`: numerically when both are numeric,
/// lexically when both are strings, otherwise unordered.
fn loose_order(expected: &Value, actual: &Value) -> Option<Ordering> {
    match (expected.as_number(), actual.as_number()) {
        (Some(e), Some(a)) => e.partial_cmp(&a),
        _ => match (expected, actual) {
            (Value::String(e), Value::String(a)) => Some(e.cmp(a)),
            _ => None,
        },
    }
}

/// Decoding error for a candidate JSON text, `None` when it is valid.
pub(super) fn json_error(text: &str) -> Option<String> {
    if text.is_empty() {
        return Some("Syntax error".to_string());
    }
    serde_json::from_str::<serde_json::Value>(text)
        .err()
        .map(|e| e.to_string())
}
