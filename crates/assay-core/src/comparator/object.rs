use super::array::compare_entries;
use super::{Comparator, ComparisonFailure, Comparison, EqualsOptions};
use crate::exporter::export;
use crate::value::{ArrayKey, ObjectRef, Value, ValueArray};

/// Objects, compared field by field.
///
/// Every (expected, actual) pair of handles is recorded for the duration of
/// the comparison; meeting a recorded pair again counts as equal, which is
/// what stops the recursion on cyclic graphs.
pub struct ObjectComparator;

impl Comparator for ObjectComparator {
    fn accepts(&self, expected: &Value, actual: &Value) -> bool {
        expected.is_object_like() && actual.is_object_like()
    }

    fn assert_equals(
        &self,
        expected: &Value,
        actual: &Value,
        options: &EqualsOptions,
        comparison: &mut Comparison<'_>,
    ) -> Result<(), ComparisonFailure> {
        let expected_class = expected.class_name().unwrap_or_default();
        let actual_class = actual.class_name().unwrap_or_default();
        if expected_class != actual_class {
            return Err(ComparisonFailure::new(
                expected,
                actual,
                export(expected),
                export(actual),
                format!(
                    "{} is not instance of expected class \"{}\".",
                    export(actual),
                    expected_class
                ),
            ));
        }

        let (Value::Object(e), Value::Object(a)) = (expected, actual) else {
            return if expected.identical(actual) {
                Ok(())
            } else {
                Err(ComparisonFailure::new(
                    expected,
                    actual,
                    export(expected),
                    export(actual),
                    "Failed asserting that two objects are equal.",
                ))
            };
        };

        if !comparison.visit(e.id(), a.id()) {
            return Ok(());
        }

        match compare_entries(&fields(e), &fields(a), options, comparison) {
            None => Ok(()),
            Some((expected_repr, actual_repr)) => Err(ComparisonFailure::new(
                expected,
                actual,
                format!("{} Object {}", expected_class, expected_repr),
                format!("{} Object {}", actual_class, actual_repr),
                "Failed asserting that two objects are equal.",
            )),
        }
    }
}

fn fields(object: &ObjectRef) -> ValueArray {
    object
        .fields()
        .into_iter()
        .map(|(name, value)| (ArrayKey::from(name), value))
        .collect()
}
