//! Failures and errors raised while a test runs.

use crate::comparator::ComparisonFailure;
use thiserror::Error;

/// Intent tag of a failure; decides the outcome bucket it lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// An expectation did not hold
    Assertion,
    /// A strictness policy was violated
    Risky,
    /// The test marked itself incomplete
    Incomplete,
    /// The test marked itself skipped
    Skipped,
    /// The test printed output while output was forbidden
    Output,
}

/// A failed expectation or an intentional early exit.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AssertionFailure {
    kind: FailureKind,
    message: String,
    comparison: Option<ComparisonFailure>,
}

impl AssertionFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_kind(FailureKind::Assertion, message)
    }

    /// An assertion failure carrying both renderings for a diff.
    pub fn expectation(message: impl Into<String>, comparison: Option<ComparisonFailure>) -> Self {
        Self {
            kind: FailureKind::Assertion,
            message: message.into(),
            comparison,
        }
    }

    pub fn risky(message: impl Into<String>) -> Self {
        Self::with_kind(FailureKind::Risky, message)
    }

    pub fn incomplete(message: impl Into<String>) -> Self {
        Self::with_kind(FailureKind::Incomplete, message)
    }

    pub fn skipped(message: impl Into<String>) -> Self {
        Self::with_kind(FailureKind::Skipped, message)
    }

    pub fn output(message: impl Into<String>) -> Self {
        Self::with_kind(FailureKind::Output, message)
    }

    fn with_kind(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            comparison: None,
        }
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn comparison(&self) -> Option<&ComparisonFailure> {
        self.comparison.as_ref()
    }

    /// Message followed by the comparison diff, trimmed and newline-terminated.
    pub fn to_report_string(&self) -> String {
        let mut buffer = self.message.clone();
        if let Some(comparison) = &self.comparison {
            buffer.push_str(&comparison.diff());
        }
        let trimmed = buffer.trim();
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("{}\n", trimmed)
        }
    }
}

/// Everything a test body can end with besides success.
#[derive(Debug, Error)]
pub enum TestError {
    #[error(transparent)]
    Failure(#[from] AssertionFailure),

    /// Misuse of an assertion: an argument had the wrong shape.
    #[error("Argument #{argument} of {function}() must be a {expected}")]
    InvalidArgument {
        argument: usize,
        function: &'static str,
        expected: &'static str,
    },

    /// Any other error escaping the test body.
    #[error(transparent)]
    Uncaught(#[from] anyhow::Error),
}

impl TestError {
    pub fn invalid_argument(
        argument: usize,
        function: &'static str,
        expected: &'static str,
    ) -> Self {
        TestError::InvalidArgument {
            argument,
            function,
            expected,
        }
    }

    /// Tag of the underlying failure, if this is one.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            TestError::Failure(failure) => Some(failure.kind()),
            _ => None,
        }
    }

    pub fn as_failure(&self) -> Option<&AssertionFailure> {
        match self {
            TestError::Failure(failure) => Some(failure),
            _ => None,
        }
    }

    /// Rendering used in reports.
    pub fn to_report_string(&self) -> String {
        match self {
            TestError::Failure(failure) => failure.to_report_string(),
            TestError::InvalidArgument { .. } => format!("InvalidArgument: {}\n", self),
            TestError::Uncaught(error) => format!("Error: {:#}\n", error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparator::ComparisonFailure;
    use crate::value::Value;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_report_string_appends_diff() {
        let comparison = ComparisonFailure::new(
            &Value::string("a"),
            &Value::string("b"),
            "'a'",
            "'b'",
            "Failed asserting that two strings are equal.",
        );
        let failure = AssertionFailure::expectation(
            "custom message\nFailed asserting that two strings are equal.",
            Some(comparison),
        );
        assert_eq!(
            failure.to_report_string(),
            "custom message\nFailed asserting that two strings are equal.\n--- Expected\n+++ Actual\n@@ @@\n-'a'\n+'b'\n"
        );
    }

    #[test]
    fn test_invalid_argument_message() {
        let error = TestError::invalid_argument(2, "assert_count", "countable");
        assert_eq!(error.to_string(), "Argument #2 of assert_count() must be a countable");
        assert_eq!(error.failure_kind(), None);
    }

    #[test]
    fn test_uncaught_errors_convert() {
        let error: TestError = anyhow::anyhow!("disk full").into();
        assert_eq!(error.to_report_string(), "Error: disk full\n");
    }

    #[test]
    fn test_failure_kind_is_exposed() {
        let error: TestError = AssertionFailure::skipped("no database").into();
        assert_eq!(error.failure_kind(), Some(FailureKind::Skipped));
    }
}
