use super::{Comparator, ComparisonFailure, Comparison, EqualsOptions};
use crate::exporter::export;
use crate::value::Value;

/// Resource handles: equal only to themselves.
pub struct ResourceComparator;

impl Comparator for ResourceComparator {
    fn accepts(&self, expected: &Value, actual: &Value) -> bool {
        matches!((expected, actual), (Value::Resource(_), Value::Resource(_)))
    }

    fn assert_equals(
        &self,
        expected: &Value,
        actual: &Value,
        _options: &EqualsOptions,
        _comparison: &mut Comparison<'_>,
    ) -> Result<(), ComparisonFailure> {
        match (expected, actual) {
            (Value::Resource(e), Value::Resource(a)) if e.ptr_eq(a) => Ok(()),
            _ => Err(ComparisonFailure::new(
                expected,
                actual,
                export(expected),
                export(actual),
                "Failed asserting that two resources are equal.",
            )),
        }
    }
}
