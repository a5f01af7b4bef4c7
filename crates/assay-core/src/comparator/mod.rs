//! Structural equality engine
//!
//! A [`ComparatorFactory`] holds the registered [`Comparator`]s and picks the
//! most recently registered one that accepts a pair of values. Comparators for
//! containers recurse back through the [`Comparison`] so nested values are
//! dispatched the same way, sharing one visited-pair set per comparison.

mod array;
mod datetime;
mod markup;
mod numeric;
mod object;
mod resource;
mod scalar;
mod type_check;

pub use array::ArrayComparator;
pub use datetime::DateTimeComparator;
pub use markup::MarkupComparator;
pub use numeric::{DoubleComparator, NumericComparator};
pub use object::ObjectComparator;
pub use resource::ResourceComparator;
pub use scalar::ScalarComparator;
pub use type_check::TypeComparator;

use crate::diff;
use crate::value::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

/// Tolerance applied to float comparisons when no delta was requested.
pub const EPSILON: f64 = 0.000_000_000_1;

/// Knobs of an equality comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EqualsOptions {
    /// Absolute tolerance for numbers, in seconds for date-times.
    pub delta: f64,
    /// Nesting depth beyond which failure renderings are shortened.
    pub max_depth: usize,
    /// Compare containers as order-insensitive multisets.
    pub canonicalize: bool,
    /// Lower-case strings (and markup) before comparing.
    pub ignore_case: bool,
}

impl Default for EqualsOptions {
    fn default() -> Self {
        Self {
            delta: 0.0,
            max_depth: 10,
            canonicalize: false,
            ignore_case: false,
        }
    }
}

impl EqualsOptions {
    pub fn with_delta(mut self, delta: f64) -> Self {
        self.delta = delta;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn canonicalizing(mut self) -> Self {
        self.canonicalize = true;
        self
    }

    pub fn ignoring_case(mut self) -> Self {
        self.ignore_case = true;
        self
    }
}

/// Structured mismatch: both sides rendered for a diff, plus a message.
#[derive(Debug, Clone)]
pub struct ComparisonFailure {
    expected: Value,
    actual: Value,
    expected_repr: String,
    actual_repr: String,
    message: String,
}

impl ComparisonFailure {
    pub fn new(
        expected: &Value,
        actual: &Value,
        expected_repr: impl Into<String>,
        actual_repr: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            expected: expected.clone(),
            actual: actual.clone(),
            expected_repr: expected_repr.into(),
            actual_repr: actual_repr.into(),
            message: message.into(),
        }
    }

    pub fn expected(&self) -> &Value {
        &self.expected
    }

    pub fn actual(&self) -> &Value {
        &self.actual
    }

    pub fn expected_repr(&self) -> &str {
        &self.expected_repr
    }

    pub fn actual_repr(&self) -> &str {
        &self.actual_repr
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Unified diff of the two renderings; empty when neither side was rendered.
    pub fn diff(&self) -> String {
        if self.expected_repr.is_empty() && self.actual_repr.is_empty() {
            return String::new();
        }
        diff::diff(&self.expected_repr, &self.actual_repr)
    }
}

impl fmt::Display for ComparisonFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.message, self.diff())
    }
}

impl std::error::Error for ComparisonFailure {}

/// Outcome of a top-level comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonResult {
    pub equal: bool,
    pub expected_repr: String,
    pub actual_repr: String,
    pub message: String,
    pub diff: Option<String>,
}

impl From<Result<(), ComparisonFailure>> for ComparisonResult {
    fn from(outcome: Result<(), ComparisonFailure>) -> Self {
        match outcome {
            Ok(()) => ComparisonResult {
                equal: true,
                expected_repr: String::new(),
                actual_repr: String::new(),
                message: String::new(),
                diff: None,
            },
            Err(failure) => {
                let diff = failure.diff();
                ComparisonResult {
                    equal: false,
                    expected_repr: failure.expected_repr,
                    actual_repr: failure.actual_repr,
                    message: failure.message,
                    diff: (!diff.is_empty()).then_some(diff),
                }
            }
        }
    }
}

/// A variant-specific equality check.
pub trait Comparator: Send + Sync {
    /// Whether this comparator handles the pair.
    fn accepts(&self, expected: &Value, actual: &Value) -> bool;

    /// Compare the pair, recursing through `comparison` for nested values.
    fn assert_equals(
        &self,
        expected: &Value,
        actual: &Value,
        options: &EqualsOptions,
        comparison: &mut Comparison<'_>,
    ) -> Result<(), ComparisonFailure>;
}

/// State of one top-level comparison: the registry, the visited object
/// pairs, and the current nesting depth.
pub struct Comparison<'f> {
    factory: &'f ComparatorFactory,
    visited: HashSet<(usize, usize)>,
    depth: usize,
}

impl<'f> Comparison<'f> {
    pub fn new(factory: &'f ComparatorFactory) -> Self {
        Self {
            factory,
            visited: HashSet::new(),
            depth: 0,
        }
    }

    /// Dispatch a (possibly nested) pair to the matching comparator.
    pub fn compare(
        &mut self,
        expected: &Value,
        actual: &Value,
        options: &EqualsOptions,
    ) -> Result<(), ComparisonFailure> {
        let factory = self.factory;
        let comparator = factory.comparator_for(expected, actual);
        self.depth += 1;
        let outcome = comparator.assert_equals(expected, actual, options, self);
        self.depth -= 1;
        outcome
    }

    /// Nesting level of the comparator currently running (1 at the top).
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Record an (expected, actual) identity pair. Returns false when the
    /// pair was already seen during this comparison.
    pub fn visit(&mut self, expected: usize, actual: usize) -> bool {
        self.visited.insert((expected, actual))
    }
}

/// Registry of comparators, consulted newest first.
pub struct ComparatorFactory {
    comparators: Vec<Box<dyn Comparator>>,
}

impl Default for ComparatorFactory {
    fn default() -> Self {
        let mut factory = Self::empty();
        factory.register(Box::new(TypeComparator));
        factory.register(Box::new(ScalarComparator));
        factory.register(Box::new(NumericComparator));
        factory.register(Box::new(DoubleComparator));
        factory.register(Box::new(ArrayComparator));
        factory.register(Box::new(ResourceComparator));
        factory.register(Box::new(ObjectComparator));
        factory.register(Box::new(MarkupComparator));
        factory.register(Box::new(DateTimeComparator));
        factory
    }
}

impl ComparatorFactory {
    /// A registry with no comparators; everything falls back to type checks.
    pub fn empty() -> Self {
        Self {
            comparators: Vec::new(),
        }
    }

    /// Process-wide registry with the built-in comparators.
    pub fn shared() -> &'static ComparatorFactory {
        static SHARED: OnceLock<ComparatorFactory> = OnceLock::new();
        SHARED.get_or_init(ComparatorFactory::default)
    }

    /// Register a comparator; it takes precedence over earlier ones.
    pub fn register(&mut self, comparator: Box<dyn Comparator>) {
        self.comparators.push(comparator);
    }

    pub fn comparator_for(&self, expected: &Value, actual: &Value) -> &dyn Comparator {
        self.comparators
            .iter()
            .rev()
            .find(|c| c.accepts(expected, actual))
            .map(|c| &**c)
            .unwrap_or(&TypeComparator)
    }

    pub fn assert_equals(
        &self,
        expected: &Value,
        actual: &Value,
        options: &EqualsOptions,
    ) -> Result<(), ComparisonFailure> {
        tracing::trace!(
            expected = expected.type_name(),
            actual = actual.type_name(),
            "comparing values"
        );
        Comparison::new(self).compare(expected, actual, options)
    }

    pub fn compare(
        &self,
        expected: &Value,
        actual: &Value,
        options: &EqualsOptions,
    ) -> ComparisonResult {
        self.assert_equals(expected, actual, options).into()
    }
}

/// Compare two values with the shared registry.
pub fn compare(expected: &Value, actual: &Value, options: &EqualsOptions) -> ComparisonResult {
    ComparatorFactory::shared().compare(expected, actual, options)
}

/// `true` when the two values are equal under `options`.
pub fn equals(expected: &Value, actual: &Value, options: &EqualsOptions) -> bool {
    ComparatorFactory::shared()
        .assert_equals(expected, actual, options)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysEqual;

    impl Comparator for AlwaysEqual {
        fn accepts(&self, expected: &Value, _actual: &Value) -> bool {
            matches!(expected, Value::String(s) if s.as_ref() == "anything")
        }

        fn assert_equals(
            &self,
            _expected: &Value,
            _actual: &Value,
            _options: &EqualsOptions,
            _comparison: &mut Comparison<'_>,
        ) -> Result<(), ComparisonFailure> {
            Ok(())
        }
    }

    #[test]
    fn test_registered_comparator_takes_precedence() {
        let mut factory = ComparatorFactory::default();
        let options = EqualsOptions::default();
        assert!(!factory
            .compare(&Value::string("anything"), &Value::Int(3), &options)
            .equal);
        factory.register(Box::new(AlwaysEqual));
        assert!(factory
            .compare(&Value::string("anything"), &Value::Int(3), &options)
            .equal);
    }

    #[test]
    fn test_empty_factory_falls_back_to_type_check() {
        let factory = ComparatorFactory::empty();
        let options = EqualsOptions::default();
        assert!(factory.compare(&Value::Int(1), &Value::Int(2), &options).equal);
        let result = factory.compare(&Value::Int(1), &Value::string("1"), &options);
        assert!(!result.equal);
        assert_eq!(result.message, "'1' does not match expected type \"integer\".");
    }

    #[test]
    fn test_result_carries_diff_only_with_renderings() {
        let options = EqualsOptions::default();
        let scalar = compare(&Value::Int(1), &Value::Int(2), &options);
        assert_eq!(scalar.diff, None);
        let strings = compare(&Value::string("a"), &Value::string("b"), &options);
        assert_eq!(strings.expected_repr, "'a'");
        assert!(strings.diff.is_some());
    }
}
