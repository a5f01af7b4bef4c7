//! Test Result Aggregation
//!
//! [`TestResult`] collects the outcome of every test in a run. Each leaf
//! ends in exactly one bucket (passed, error, failure, risky, incomplete or
//! skipped), every event is fanned out to the registered listeners in
//! registration order, and the stop-on-X policies latch a stop flag that
//! suites and decorators check between children.

use crate::assert::TestContext;
use crate::failure::{AssertionFailure, FailureKind, TestError};
use crate::invoker::{Invoker, TimingInvoker};
use crate::listener::{TestFailure, TestListener};
use crate::metadata::{DeclaredMetadata, TestMetadata, TestSize};
use crate::test::{TestCase, TestSuite};
use assay_config::RunConfig;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Bookkeeping for one passing run of a test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassedTest {
    pub name: String,
    pub size: TestSize,
    pub time: Duration,
    pub assertions: usize,
}

/// Which bucket an outcome lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bucket {
    Error,
    Failure,
    Risky,
    Incomplete,
    Skipped,
}

/// Aggregated outcome of a test run.
pub struct TestResult {
    passed: Vec<PassedTest>,
    errors: Vec<TestFailure>,
    failures: Vec<TestFailure>,
    risky: Vec<TestFailure>,
    not_implemented: Vec<TestFailure>,
    skipped: Vec<TestFailure>,

    listeners: Vec<Weak<RefCell<dyn TestListener>>>,
    top_test_suite: Option<TestSuite>,

    run_tests: usize,
    time: Duration,
    assertions: usize,
    current_assertions: usize,
    last_test_failed: bool,
    stop: bool,

    stop_on_error: bool,
    stop_on_failure: bool,
    stop_on_risky: bool,
    stop_on_incomplete: bool,
    stop_on_skipped: bool,

    strict_about_tests_without_assertions: bool,
    strict_about_output_during_tests: bool,
    strict_about_todo_annotated_tests: bool,
    strict_about_resource_usage_during_small_tests: bool,
    enforce_time_limit: bool,

    timeout_for_small_tests: Duration,
    timeout_for_medium_tests: Duration,
    timeout_for_large_tests: Duration,

    metadata: Box<dyn TestMetadata>,
    invoker: Box<dyn Invoker>,
}

impl Default for TestResult {
    fn default() -> Self {
        Self::new()
    }
}

impl TestResult {
    pub fn new() -> Self {
        Self {
            passed: Vec::new(),
            errors: Vec::new(),
            failures: Vec::new(),
            risky: Vec::new(),
            not_implemented: Vec::new(),
            skipped: Vec::new(),
            listeners: Vec::new(),
            top_test_suite: None,
            run_tests: 0,
            time: Duration::ZERO,
            assertions: 0,
            current_assertions: 0,
            last_test_failed: false,
            stop: false,
            stop_on_error: false,
            stop_on_failure: false,
            stop_on_risky: false,
            stop_on_incomplete: false,
            stop_on_skipped: false,
            strict_about_tests_without_assertions: false,
            strict_about_output_during_tests: false,
            strict_about_todo_annotated_tests: false,
            strict_about_resource_usage_during_small_tests: false,
            enforce_time_limit: false,
            timeout_for_small_tests: Duration::from_secs(1),
            timeout_for_medium_tests: Duration::from_secs(10),
            timeout_for_large_tests: Duration::from_secs(60),
            metadata: Box::new(DeclaredMetadata),
            invoker: Box::new(TimingInvoker),
        }
    }

    /// Apply the policies of a loaded run configuration.
    pub fn configure(&mut self, config: &RunConfig) {
        self.stop_on_error = config.stop.on_error;
        self.stop_on_failure = config.stop.on_failure;
        self.stop_on_risky = config.stop.on_risky;
        self.stop_on_incomplete = config.stop.on_incomplete;
        self.stop_on_skipped = config.stop.on_skipped;

        self.strict_about_tests_without_assertions = config.strict.tests_without_assertions;
        self.strict_about_output_during_tests = config.strict.output_during_tests;
        self.strict_about_todo_annotated_tests = config.strict.todo_annotated_tests;
        self.strict_about_resource_usage_during_small_tests =
            config.strict.resource_usage_during_small_tests;

        self.enforce_time_limit = config.time_limit.enforce;
        self.timeout_for_small_tests = Duration::from_secs(config.time_limit.small);
        self.timeout_for_medium_tests = Duration::from_secs(config.time_limit.medium);
        self.timeout_for_large_tests = Duration::from_secs(config.time_limit.large);
    }

    pub fn with_metadata(mut self, metadata: impl TestMetadata + 'static) -> Self {
        self.metadata = Box::new(metadata);
        self
    }

    pub fn with_invoker(mut self, invoker: impl Invoker + 'static) -> Self {
        self.invoker = Box::new(invoker);
        self
    }

    // ========================================================================
    // Listeners
    // ========================================================================

    /// Register a listener. Only a weak handle is kept; the caller owns it.
    pub fn add_listener<L: TestListener + 'static>(&mut self, listener: &Rc<RefCell<L>>) {
        let listener: Rc<RefCell<dyn TestListener>> = listener.clone();
        self.listeners.push(Rc::downgrade(&listener));
    }

    pub fn remove_listener<L: TestListener + 'static>(&mut self, listener: &Rc<RefCell<L>>) {
        let target = Rc::as_ptr(listener) as *const ();
        self.listeners
            .retain(|registered| registered.as_ptr() as *const () != target);
    }

    /// Flush every registered listener.
    pub fn flush_listeners(&mut self) {
        self.notify(|listener| listener.flush());
    }

    fn notify(&mut self, mut event: impl FnMut(&mut dyn TestListener)) {
        let registered = self.listeners.len();
        self.listeners.retain(|listener| listener.strong_count() > 0);
        if self.listeners.len() < registered {
            warn!(
                dropped = registered - self.listeners.len(),
                "listener dropped before the run finished"
            );
        }

        let snapshot: Vec<Rc<RefCell<dyn TestListener>>> =
            self.listeners.iter().filter_map(Weak::upgrade).collect();
        for listener in snapshot {
            event(&mut *listener.borrow_mut());
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Record an error raised by `test`.
    ///
    /// Risky, incomplete and skipped markers go to their own buckets;
    /// anything else counts as an error.
    pub fn add_error(&mut self, test: &Arc<TestCase>, error: TestError, time: Duration) {
        let bucket = match error.failure_kind() {
            Some(FailureKind::Risky) => Bucket::Risky,
            Some(FailureKind::Incomplete) => Bucket::Incomplete,
            Some(FailureKind::Skipped) => Bucket::Skipped,
            _ => Bucket::Error,
        };
        self.record(test, error, time, bucket);
    }

    /// Record a failed expectation of `test`.
    ///
    /// Unexpected output counts as risky; an ordinary mismatch counts as a
    /// failure.
    pub fn add_failure(&mut self, test: &Arc<TestCase>, failure: AssertionFailure, time: Duration) {
        let bucket = match failure.kind() {
            FailureKind::Risky | FailureKind::Output => Bucket::Risky,
            FailureKind::Incomplete => Bucket::Incomplete,
            FailureKind::Skipped => Bucket::Skipped,
            FailureKind::Assertion => Bucket::Failure,
        };
        self.record(test, TestError::Failure(failure), time, bucket);
    }

    fn record(&mut self, test: &Arc<TestCase>, error: TestError, time: Duration, bucket: Bucket) {
        debug!(test = test.name(), outcome = ?bucket, "test outcome");

        let stop = match bucket {
            Bucket::Error => self.stop_on_error || self.stop_on_failure,
            Bucket::Failure => self.stop_on_failure,
            Bucket::Risky => self.stop_on_risky,
            Bucket::Incomplete => self.stop_on_incomplete,
            Bucket::Skipped => self.stop_on_skipped,
        };
        if stop {
            self.stop();
        }

        self.notify(|listener| match bucket {
            Bucket::Error => listener.add_error(test, &error, time),
            Bucket::Failure => {
                if let Some(failure) = error.as_failure() {
                    listener.add_failure(test, failure, time);
                }
            }
            Bucket::Risky => listener.add_risky_test(test, &error, time),
            Bucket::Incomplete => listener.add_incomplete_test(test, &error, time),
            Bucket::Skipped => listener.add_skipped_test(test, &error, time),
        });

        let record = TestFailure::new(Arc::clone(test), error, time);
        match bucket {
            Bucket::Error => self.errors.push(record),
            Bucket::Failure => self.failures.push(record),
            Bucket::Risky => self.risky.push(record),
            Bucket::Incomplete => self.not_implemented.push(record),
            Bucket::Skipped => self.skipped.push(record),
        }

        self.last_test_failed = true;
        self.time += time;
    }

    pub fn start_test_suite(&mut self, suite: &TestSuite) {
        if self.top_test_suite.is_none() {
            self.top_test_suite = Some(suite.clone());
        }
        self.notify(|listener| listener.start_test_suite(suite));
    }

    pub fn end_test_suite(&mut self, suite: &TestSuite) {
        self.notify(|listener| listener.end_test_suite(suite));
    }

    pub fn start_test(&mut self, test: &Arc<TestCase>) {
        debug!(test = test.name(), "start test");
        self.last_test_failed = false;
        self.current_assertions = 0;
        self.run_tests += test.count();
        self.notify(|listener| listener.start_test(test));
    }

    /// Close the cycle for `test`; a test with no recorded outcome passed.
    pub fn end_test(&mut self, test: &Arc<TestCase>, time: Duration) {
        self.notify(|listener| listener.end_test(test, time));

        if !self.last_test_failed {
            let size = self.metadata.size(test);
            self.passed.push(PassedTest {
                name: test.name().to_string(),
                size,
                time,
                assertions: self.current_assertions,
            });
            self.time += time;
        }
        debug!(test = test.name(), elapsed_ms = time.as_millis() as u64, "end test");
    }

    // ========================================================================
    // Running
    // ========================================================================

    /// Run one leaf: start, invoke under the configured budget, classify the
    /// outcome, apply the strictness policies, end.
    pub fn run(&mut self, test: &Arc<TestCase>) {
        let mut context = TestContext::new();
        self.start_test(test);

        let size = self.metadata.size(test);
        let start = Instant::now();
        let outcome = match self.time_limit_for(size) {
            Some(limit) => self.invoker.invoke(test, &mut context, limit),
            None => test.run_bare(&mut context),
        };
        let time = start.elapsed();

        self.current_assertions = context.assertion_count();
        self.assertions += context.assertion_count();

        match outcome {
            Err(TestError::Failure(failure)) => self.add_failure(test, failure, time),
            Err(error) => self.add_error(test, error, time),
            Ok(()) => {
                if let Some(violation) = self.policy_violation(test, size, &context) {
                    self.add_failure(test, violation, time);
                }
            }
        }

        self.end_test(test, time);
    }

    fn time_limit_for(&self, size: TestSize) -> Option<Duration> {
        if !self.enforce_time_limit {
            return None;
        }
        match size {
            TestSize::Small => Some(self.timeout_for_small_tests),
            TestSize::Medium => Some(self.timeout_for_medium_tests),
            TestSize::Large => Some(self.timeout_for_large_tests),
            TestSize::Unknown => None,
        }
    }

    /// First strictness policy a passing test violates, if any.
    fn policy_violation(
        &self,
        test: &TestCase,
        size: TestSize,
        context: &TestContext,
    ) -> Option<AssertionFailure> {
        if self.strict_about_tests_without_assertions && context.assertion_count() == 0 {
            return Some(AssertionFailure::risky("This test did not perform any assertions"));
        }
        if self.strict_about_output_during_tests && context.has_output() {
            return Some(AssertionFailure::output(format!(
                "This test printed output: {}",
                context.output()
            )));
        }
        if self.strict_about_todo_annotated_tests && self.metadata.is_todo(test) {
            return Some(AssertionFailure::risky("Test is marked as todo"));
        }
        if self.strict_about_resource_usage_during_small_tests
            && size == TestSize::Small
            && !context.resource_uses().is_empty()
        {
            return Some(AssertionFailure::risky(context.resource_uses().join("\n")));
        }
        None
    }

    // ========================================================================
    // Stop latch
    // ========================================================================

    pub fn should_stop(&self) -> bool {
        self.stop
    }

    /// Request the run to stop. Never reset.
    pub fn stop(&mut self) {
        if !self.stop {
            debug!("stop requested");
        }
        self.stop = true;
    }

    // ========================================================================
    // Policy setters
    // ========================================================================

    pub fn stop_on_error(&mut self, flag: bool) {
        self.stop_on_error = flag;
    }

    pub fn stop_on_failure(&mut self, flag: bool) {
        self.stop_on_failure = flag;
    }

    pub fn stop_on_risky(&mut self, flag: bool) {
        self.stop_on_risky = flag;
    }

    pub fn stop_on_incomplete(&mut self, flag: bool) {
        self.stop_on_incomplete = flag;
    }

    pub fn stop_on_skipped(&mut self, flag: bool) {
        self.stop_on_skipped = flag;
    }

    pub fn be_strict_about_tests_without_assertions(&mut self, flag: bool) {
        self.strict_about_tests_without_assertions = flag;
    }

    pub fn be_strict_about_output_during_tests(&mut self, flag: bool) {
        self.strict_about_output_during_tests = flag;
    }

    pub fn be_strict_about_todo_annotated_tests(&mut self, flag: bool) {
        self.strict_about_todo_annotated_tests = flag;
    }

    pub fn be_strict_about_resource_usage_during_small_tests(&mut self, flag: bool) {
        self.strict_about_resource_usage_during_small_tests = flag;
    }

    pub fn enforce_time_limit(&mut self, flag: bool) {
        self.enforce_time_limit = flag;
    }

    pub fn set_timeout_for_small_tests(&mut self, timeout: Duration) {
        self.timeout_for_small_tests = timeout;
    }

    pub fn set_timeout_for_medium_tests(&mut self, timeout: Duration) {
        self.timeout_for_medium_tests = timeout;
    }

    pub fn set_timeout_for_large_tests(&mut self, timeout: Duration) {
        self.timeout_for_large_tests = timeout;
    }

    pub fn timeout_for_small_tests(&self) -> Duration {
        self.timeout_for_small_tests
    }

    pub fn timeout_for_medium_tests(&self) -> Duration {
        self.timeout_for_medium_tests
    }

    pub fn timeout_for_large_tests(&self) -> Duration {
        self.timeout_for_large_tests
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Number of tests started.
    pub fn count(&self) -> usize {
        self.run_tests
    }

    pub fn time(&self) -> Duration {
        self.time
    }

    /// Assertions performed across every test run so far.
    pub fn assertion_count(&self) -> usize {
        self.assertions
    }

    /// One entry per passing run, in run order.
    pub fn passed(&self) -> &[PassedTest] {
        &self.passed
    }

    pub fn passed_count(&self) -> usize {
        self.passed.len()
    }

    /// Entries across every bucket. Equals [`count`](Self::count) once each
    /// started test has ended.
    pub fn recorded_count(&self) -> usize {
        self.passed.len()
            + self.errors.len()
            + self.failures.len()
            + self.risky.len()
            + self.not_implemented.len()
            + self.skipped.len()
    }

    /// True when some passing run of a test named `name` was recorded.
    pub fn has_passed(&self, name: &str) -> bool {
        self.passed.iter().any(|passed| passed.name == name)
    }

    pub fn errors(&self) -> &[TestFailure] {
        &self.errors
    }

    pub fn failures(&self) -> &[TestFailure] {
        &self.failures
    }

    pub fn risky(&self) -> &[TestFailure] {
        &self.risky
    }

    pub fn not_implemented(&self) -> &[TestFailure] {
        &self.not_implemented
    }

    pub fn skipped(&self) -> &[TestFailure] {
        &self.skipped
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn risky_count(&self) -> usize {
        self.risky.len()
    }

    pub fn not_implemented_count(&self) -> usize {
        self.not_implemented.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn top_test_suite(&self) -> Option<&TestSuite> {
        self.top_test_suite.as_ref()
    }

    /// No errors and no failures.
    pub fn was_successful(&self) -> bool {
        self.errors.is_empty() && self.failures.is_empty()
    }

    pub fn all_harmless(&self) -> bool {
        self.risky.is_empty()
    }

    pub fn all_completely_implemented(&self) -> bool {
        self.not_implemented.is_empty()
    }

    pub fn none_skipped(&self) -> bool {
        self.skipped.is_empty()
    }
}
