use super::{Comparator, ComparisonFailure, Comparison, EqualsOptions};
use crate::exporter::shortened_export;
use crate::value::Value;

/// Fallback for pairs no other comparator accepts: differing shapes fail,
/// matching shapes pass.
pub struct TypeComparator;

impl Comparator for TypeComparator {
    fn accepts(&self, _expected: &Value, _actual: &Value) -> bool {
        true
    }

    fn assert_equals(
        &self,
        expected: &Value,
        actual: &Value,
        _options: &EqualsOptions,
        _comparison: &mut Comparison<'_>,
    ) -> Result<(), ComparisonFailure> {
        if std::mem::discriminant(expected) == std::mem::discriminant(actual) {
            return Ok(());
        }
        Err(ComparisonFailure::new(
            expected,
            actual,
            "",
            "",
            format!(
                "{} does not match expected type \"{}\".",
                shortened_export(actual),
                expected.type_name()
            ),
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::comparator::{compare, EqualsOptions};
    use crate::value::Value;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_array_against_scalar() {
        let result = compare(
            &Value::list(vec![1.into()]),
            &Value::string("foo"),
            &EqualsOptions::default(),
        );
        assert_eq!(result.message, "'foo' does not match expected type \"array\".");
    }

    #[test]
    fn test_scalar_against_array() {
        let result = compare(
            &Value::Int(1),
            &Value::list(vec![1.into(), 2.into()]),
            &EqualsOptions::default(),
        );
        assert_eq!(result.message, "Array (...) does not match expected type \"integer\".");
    }
}
