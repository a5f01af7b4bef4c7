use super::{Comparator, ComparisonFailure, Comparison, EqualsOptions};
use crate::exporter::DATETIME_FORMAT;
use crate::value::Value;

/// Instants, equal when at most `delta` seconds apart. Offsets are ignored.
pub struct DateTimeComparator;

impl Comparator for DateTimeComparator {
    fn accepts(&self, expected: &Value, actual: &Value) -> bool {
        matches!((expected, actual), (Value::DateTime(_), Value::DateTime(_)))
    }

    fn assert_equals(
        &self,
        expected: &Value,
        actual: &Value,
        options: &EqualsOptions,
        _comparison: &mut Comparison<'_>,
    ) -> Result<(), ComparisonFailure> {
        let (Value::DateTime(e), Value::DateTime(a)) = (expected, actual) else {
            return Err(ComparisonFailure::new(
                expected,
                actual,
                "",
                "",
                "Failed asserting that two DateTime objects are equal.",
            ));
        };

        let apart = (*a - *e)
            .num_microseconds()
            .map(|us| us.unsigned_abs() as f64 / 1_000_000.0)
            .unwrap_or(f64::INFINITY);
        if apart <= options.delta.abs() {
            return Ok(());
        }

        Err(ComparisonFailure::new(
            expected,
            actual,
            e.format(DATETIME_FORMAT).to_string(),
            a.format(DATETIME_FORMAT).to_string(),
            "Failed asserting that two DateTime objects are equal.",
        ))
    }
}
