use super::{Comparator, ComparisonFailure, Comparison, EqualsOptions, EPSILON};
use crate::exporter::export;
use crate::value::Value;

/// Numbers and numeric strings, unless both sides are strings.
pub struct NumericComparator;

impl Comparator for NumericComparator {
    fn accepts(&self, expected: &Value, actual: &Value) -> bool {
        expected.is_numeric() && actual.is_numeric() && !both_strings(expected, actual)
    }

    fn assert_equals(
        &self,
        expected: &Value,
        actual: &Value,
        options: &EqualsOptions,
        _comparison: &mut Comparison<'_>,
    ) -> Result<(), ComparisonFailure> {
        compare_numbers(expected, actual, options.delta)
    }
}

/// Pairs with a float on at least one side. A zero delta becomes [`EPSILON`].
pub struct DoubleComparator;

impl Comparator for DoubleComparator {
    fn accepts(&self, expected: &Value, actual: &Value) -> bool {
        (matches!(expected, Value::Float(_)) || matches!(actual, Value::Float(_)))
            && NumericComparator.accepts(expected, actual)
    }

    fn assert_equals(
        &self,
        expected: &Value,
        actual: &Value,
        options: &EqualsOptions,
        _comparison: &mut Comparison<'_>,
    ) -> Result<(), ComparisonFailure> {
        let delta = if options.delta == 0.0 {
            EPSILON
        } else {
            options.delta
        };
        compare_numbers(expected, actual, delta)
    }
}

fn both_strings(expected: &Value, actual: &Value) -> bool {
    matches!((expected, actual), (Value::String(_), Value::String(_)))
}

fn compare_numbers(expected: &Value, actual: &Value, delta: f64) -> Result<(), ComparisonFailure> {
    if let (Value::Int(e), Value::Int(a)) = (expected, actual) {
        if (*e as i128 - *a as i128).unsigned_abs() as f64 <= delta.abs() {
            return Ok(());
        }
        return Err(mismatch(expected, actual));
    }

    let (Some(e), Some(a)) = (expected.as_number(), actual.as_number()) else {
        return Err(mismatch(expected, actual));
    };

    if e.is_infinite() && a.is_infinite() && e.signum() == a.signum() {
        return Ok(());
    }
    if e.is_infinite() != a.is_infinite() || e.is_nan() || a.is_nan() || (a - e).abs() > delta.abs()
    {
        return Err(mismatch(expected, actual));
    }
    Ok(())
}

fn mismatch(expected: &Value, actual: &Value) -> ComparisonFailure {
    ComparisonFailure::new(
        expected,
        actual,
        "",
        "",
        format!(
            "Failed asserting that {} matches expected {}.",
            export(actual),
            export(expected)
        ),
    )
}

#[cfg(test)]
mod tests {
    use crate::comparator::{compare, EqualsOptions};
    use crate::value::Value;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case(Value::Int(5), Value::Int(5), 0.0)]
    #[case(Value::Float(1.0 / 3.0), Value::Float(1.0 - 2.0 / 3.0), 0.0)]
    #[case(Value::Float(2.3), Value::Float(2.5), 0.5)]
    #[case(Value::Int(5), Value::Int(6), 1.0)]
    #[case(Value::string("10"), Value::Int(10), 0.0)]
    #[case(Value::Float(f64::INFINITY), Value::Float(f64::INFINITY), 0.0)]
    fn test_equal_numbers(#[case] expected: Value, #[case] actual: Value, #[case] delta: f64) {
        let options = EqualsOptions::default().with_delta(delta);
        assert!(compare(&expected, &actual, &options).equal);
    }

    #[rstest]
    #[case(Value::Float(2.3), Value::Float(4.2), 0.5)]
    #[case(Value::Float(f64::NAN), Value::Float(f64::NAN), 0.0)]
    #[case(Value::Int(3), Value::Float(8.0_f64.acos()), 0.0)]
    #[case(Value::Float(f64::INFINITY), Value::Float(f64::NEG_INFINITY), 0.0)]
    #[case(Value::Float(f64::INFINITY), Value::Int(1), 0.0)]
    #[case(Value::Int(1), Value::Int(2), 0.0)]
    fn test_unequal_numbers(#[case] expected: Value, #[case] actual: Value, #[case] delta: f64) {
        let options = EqualsOptions::default().with_delta(delta);
        assert!(!compare(&expected, &actual, &options).equal);
    }

    #[test]
    fn test_failure_message() {
        let result = compare(&Value::Float(2.3), &Value::Float(4.2), &EqualsOptions::default());
        assert_eq!(result.message, "Failed asserting that 4.2 matches expected 2.3.");
    }

    proptest! {
        #[test]
        fn prop_number_equals_itself(n in any::<i64>()) {
            prop_assert!(compare(&Value::Int(n), &Value::Int(n), &EqualsOptions::default()).equal);
        }

        #[test]
        fn prop_delta_bounds_float_equality(a in -1e6f64..1e6, offset in 0.0f64..10.0) {
            let options = EqualsOptions::default().with_delta(offset + 0.001);
            prop_assert!(compare(&Value::Float(a), &Value::Float(a + offset), &options).equal);
        }
    }
}
