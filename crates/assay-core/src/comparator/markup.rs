use super::{Comparator, ComparisonFailure, Comparison, EqualsOptions};
use crate::value::Value;

/// Documents, compared by canonical rendering.
pub struct MarkupComparator;

impl Comparator for MarkupComparator {
    fn accepts(&self, expected: &Value, actual: &Value) -> bool {
        matches!((expected, actual), (Value::Markup(_), Value::Markup(_)))
    }

    fn assert_equals(
        &self,
        expected: &Value,
        actual: &Value,
        options: &EqualsOptions,
        _comparison: &mut Comparison<'_>,
    ) -> Result<(), ComparisonFailure> {
        let (Value::Markup(e), Value::Markup(a)) = (expected, actual) else {
            return Err(ComparisonFailure::new(
                expected,
                actual,
                "",
                "",
                "Failed asserting that two DOM documents are equal.",
            ));
        };

        let mut expected_text = e.to_pretty_string();
        let mut actual_text = a.to_pretty_string();
        if options.ignore_case {
            expected_text = expected_text.to_lowercase();
            actual_text = actual_text.to_lowercase();
        }
        if expected_text == actual_text {
            return Ok(());
        }

        Err(ComparisonFailure::new(
            expected,
            actual,
            expected_text,
            actual_text,
            "Failed asserting that two DOM documents are equal.",
        ))
    }
}
