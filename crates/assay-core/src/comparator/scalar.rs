use super::{Comparator, ComparisonFailure, Comparison, EqualsOptions};
use crate::exporter::export;
use crate::value::{numeric_literal, Value};

/// Null, booleans, and any pair involving a string.
///
/// When either side is a string both sides are compared as strings, except
/// that two finite numeric strings compare by value. Null and booleans are
/// only equal to themselves.
pub struct ScalarComparator;

impl Comparator for ScalarComparator {
    fn accepts(&self, expected: &Value, actual: &Value) -> bool {
        is_scalar_or_null(expected) && is_scalar_or_null(actual)
    }

    fn assert_equals(
        &self,
        expected: &Value,
        actual: &Value,
        options: &EqualsOptions,
        _comparison: &mut Comparison<'_>,
    ) -> Result<(), ComparisonFailure> {
        let equal = match (expected.scalar_to_string(), actual.scalar_to_string()) {
            (Some(e), Some(a))
                if matches!(expected, Value::String(_)) || matches!(actual, Value::String(_)) =>
            {
                strings_equal(e, a, options.ignore_case)
            }
            _ => loosely_identical(expected, actual),
        };
        if equal {
            return Ok(());
        }

        if let (Value::String(_), Value::String(_)) = (expected, actual) {
            return Err(ComparisonFailure::new(
                expected,
                actual,
                export(expected),
                export(actual),
                "Failed asserting that two strings are equal.",
            ));
        }

        Err(ComparisonFailure::new(
            expected,
            actual,
            "",
            "",
            format!(
                "Failed asserting that {} matches expected {}.",
                export(actual),
                export(expected)
            ),
        ))
    }
}

fn is_scalar_or_null(value: &Value) -> bool {
    value.is_scalar() || matches!(value, Value::Null)
}

fn strings_equal(expected: String, actual: String, ignore_case: bool) -> bool {
    let (expected, actual) = if ignore_case {
        (expected.to_lowercase(), actual.to_lowercase())
    } else {
        (expected, actual)
    };
    match (numeric_literal(&expected), numeric_literal(&actual)) {
        (Some(e), Some(a)) if e.is_finite() && a.is_finite() => e == a,
        _ => expected == actual,
    }
}

fn loosely_identical(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(e), Value::Bool(a)) => e == a,
        (Value::Int(e), Value::Int(a)) => e == a,
        (Value::Float(e), Value::Float(a)) => e == a,
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            expected.as_number() == actual.as_number()
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use crate::comparator::{compare, EqualsOptions};
    use crate::value::Value;
    use rstest::rstest;

    #[rstest]
    #[case(Value::string("string"), Value::string("string"))]
    #[case(Value::string("1"), Value::Int(1))]
    #[case(Value::Int(1), Value::string("1"))]
    #[case(Value::string("1e3"), Value::string("1000"))]
    #[case(Value::Null, Value::Null)]
    #[case(Value::Bool(true), Value::Bool(true))]
    #[case(Value::string("1.0"), Value::Float(1.0))]
    fn test_equal_scalars(#[case] expected: Value, #[case] actual: Value) {
        assert!(compare(&expected, &actual, &EqualsOptions::default()).equal);
    }

    #[rstest]
    #[case(Value::Int(0), Value::string("Foobar"))]
    #[case(Value::string("Foobar"), Value::Int(0))]
    #[case(Value::string("9E6666666"), Value::string("9E7777777"))]
    #[case(Value::string("a"), Value::string("A"))]
    #[case(Value::Null, Value::Bool(false))]
    #[case(Value::Bool(true), Value::string("true"))]
    fn test_unequal_scalars(#[case] expected: Value, #[case] actual: Value) {
        assert!(!compare(&expected, &actual, &EqualsOptions::default()).equal);
    }

    #[test]
    fn test_ignore_case() {
        let options = EqualsOptions::default().ignoring_case();
        assert!(compare(&Value::string("a"), &Value::string("A"), &options).equal);
    }

    #[test]
    fn test_string_failure_renders_both_sides() {
        let result = compare(
            &Value::string("foo"),
            &Value::string("bar"),
            &EqualsOptions::default(),
        );
        assert_eq!(result.message, "Failed asserting that two strings are equal.");
        assert_eq!(result.expected_repr, "'foo'");
        assert_eq!(result.actual_repr, "'bar'");
    }

    #[test]
    fn test_mixed_failure_names_both_values() {
        let result = compare(
            &Value::Int(0),
            &Value::string("Foobar"),
            &EqualsOptions::default(),
        );
        assert_eq!(
            result.message,
            "Failed asserting that 'Foobar' matches expected 0."
        );
        assert_eq!(result.diff, None);
    }
}
