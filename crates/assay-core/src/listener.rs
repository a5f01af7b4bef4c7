//! Observers of a test run and the records they receive.

use crate::failure::{AssertionFailure, TestError};
use crate::test::{TestCase, TestSuite};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Callbacks fired by [`TestResult`](crate::result::TestResult) at each
/// lifecycle event. Every method defaults to doing nothing.
///
/// Implementations must not panic; the result does not guard against it.
pub trait TestListener {
    fn add_error(&mut self, _test: &TestCase, _error: &TestError, _time: Duration) {}

    fn add_failure(&mut self, _test: &TestCase, _failure: &AssertionFailure, _time: Duration) {}

    fn add_incomplete_test(&mut self, _test: &TestCase, _error: &TestError, _time: Duration) {}

    fn add_risky_test(&mut self, _test: &TestCase, _error: &TestError, _time: Duration) {}

    fn add_skipped_test(&mut self, _test: &TestCase, _error: &TestError, _time: Duration) {}

    fn start_test_suite(&mut self, _suite: &TestSuite) {}

    fn end_test_suite(&mut self, _suite: &TestSuite) {}

    fn start_test(&mut self, _test: &TestCase) {}

    fn end_test(&mut self, _test: &TestCase, _time: Duration) {}

    /// Write out anything buffered. Called once after the whole run.
    fn flush(&mut self) {}
}

/// A non-passing outcome: the test and what it ended with.
#[derive(Debug)]
pub struct TestFailure {
    test: Arc<TestCase>,
    error: TestError,
    time: Duration,
}

impl TestFailure {
    pub fn new(test: Arc<TestCase>, error: TestError, time: Duration) -> Self {
        Self { test, error, time }
    }

    pub fn failed_test(&self) -> &TestCase {
        &self.test
    }

    pub fn test_name(&self) -> &str {
        self.test.name()
    }

    pub fn thrown_error(&self) -> &TestError {
        &self.error
    }

    pub fn time(&self) -> Duration {
        self.time
    }

    pub fn error_message(&self) -> String {
        self.error.to_string()
    }

    /// True when the test ended on a failed expectation rather than an error.
    pub fn is_failure(&self) -> bool {
        self.error.as_failure().is_some()
    }

    /// Message plus diff, trimmed and newline-terminated.
    pub fn exception_to_string(&self) -> String {
        self.error.to_report_string()
    }
}

impl fmt::Display for TestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.test.name(), self.error)
    }
}
