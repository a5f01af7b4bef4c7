use super::{Comparator, ComparisonFailure, Comparison, EqualsOptions};
use crate::exporter::{export, export_key, shortened_export};
use crate::value::{Value, ValueArray};
use std::cmp::Ordering;

/// Arrays, compared key by key.
///
/// Both renderings list every key; unchanged entries use the shortened form
/// so the diff only expands the entries that differ.
pub struct ArrayComparator;

impl Comparator for ArrayComparator {
    fn accepts(&self, expected: &Value, actual: &Value) -> bool {
        matches!((expected, actual), (Value::Array(_), Value::Array(_)))
    }

    fn assert_equals(
        &self,
        expected: &Value,
        actual: &Value,
        options: &EqualsOptions,
        comparison: &mut Comparison<'_>,
    ) -> Result<(), ComparisonFailure> {
        let (Value::Array(e), Value::Array(a)) = (expected, actual) else {
            return Err(ComparisonFailure::new(
                expected,
                actual,
                "",
                "",
                "Failed asserting that two arrays are equal.",
            ));
        };
        match compare_entries(e, a, options, comparison) {
            None => Ok(()),
            Some((expected_repr, actual_repr)) => Err(ComparisonFailure::new(
                expected,
                actual,
                format!("Array {}", expected_repr),
                format!("Array {}", actual_repr),
                "Failed asserting that two arrays are equal.",
            )),
        }
    }
}

/// Compare two key/value maps. Returns the parenthesised renderings of both
/// sides when they differ.
pub(super) fn compare_entries(
    expected: &ValueArray,
    actual: &ValueArray,
    options: &EqualsOptions,
    comparison: &mut Comparison<'_>,
) -> Option<(String, String)> {
    let (expected, actual) = if options.canonicalize {
        (canonical(expected), canonical(actual))
    } else {
        (expected.clone(), actual.clone())
    };
    let collapse = comparison.depth() >= options.max_depth;

    let mut remaining = actual.clone();
    let mut expected_repr = String::from("(\n");
    let mut actual_repr = String::from("(\n");
    let mut equal = true;

    for (key, value) in expected.iter() {
        let key_repr = export_key(key);
        let Some(other) = actual.get(key) else {
            expected_repr.push_str(&entry(&key_repr, &shortened_export(value)));
            equal = false;
            continue;
        };
        remaining.remove(key);

        match comparison.compare(value, other, options) {
            Ok(()) => {
                expected_repr.push_str(&entry(&key_repr, &shortened_export(value)));
                actual_repr.push_str(&entry(&key_repr, &shortened_export(other)));
            }
            Err(failure) => {
                expected_repr.push_str(&entry(
                    &key_repr,
                    &nested(failure.expected_repr(), failure.expected(), collapse),
                ));
                actual_repr.push_str(&entry(
                    &key_repr,
                    &nested(failure.actual_repr(), failure.actual(), collapse),
                ));
                equal = false;
            }
        }
    }

    for (key, value) in remaining.iter() {
        actual_repr.push_str(&entry(&export_key(key), &shortened_export(value)));
        equal = false;
    }

    if equal {
        return None;
    }
    expected_repr.push(')');
    actual_repr.push(')');
    Some((expected_repr, actual_repr))
}

fn entry(key: &str, value: &str) -> String {
    format!("    {} => {}\n", key, value)
}

fn nested(repr: &str, value: &Value, collapse: bool) -> String {
    if repr.is_empty() || collapse {
        shortened_export(value)
    } else {
        repr.replace('\n', "\n    ").trim().to_string()
    }
}

/// Values sorted by [`canonical_order`] and re-keyed `0..n`.
fn canonical(array: &ValueArray) -> ValueArray {
    let mut values: Vec<Value> = array.values().cloned().collect();
    values.sort_by(canonical_order);
    ValueArray::from_values(values)
}

/// Total order used to canonicalize containers: by kind, then by value.
pub(crate) fn canonical_order(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Int(_) | Value::Float(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) | Value::DateTime(_) | Value::Markup(_) => 5,
            Value::Resource(_) => 6,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            let x = a.as_number().unwrap_or(f64::NAN);
            let y = b.as_number().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => x.len().cmp(&y.len()).then_with(|| {
            x.values()
                .zip(y.values())
                .map(|(l, r)| canonical_order(l, r))
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
        }),
        _ => rank(a)
            .cmp(&rank(b))
            .then_with(|| export(a).cmp(&export(b))),
    }
}
