//! Test Result - Integration Tests
//!
//! Tests for:
//! - Outcome classification and run counts across suites
//! - Stop-on-X latching between siblings
//! - Repetition and group filtering
//! - Listener ordering, removal and dropped listeners
//! - Configuration loaded from a TOML file

use assay_config::{ConfigLoader, CONFIG_FILE_NAME};
use assay_core::{
    AssertionFailure, DeclaredMetadata, GroupTestSuite, RepeatedTest, ResultPrinter, TestCase,
    TestError, TestListener, TestResult, TestSuite,
};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Helpers
// ============================================================================

type Events = Rc<RefCell<Vec<String>>>;

/// Listener appending `"<label>:<event>:<test>"` to a shared log.
struct Recorder {
    label: &'static str,
    events: Events,
}

impl Recorder {
    fn new(label: &'static str, events: &Events) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            label,
            events: Rc::clone(events),
        }))
    }

    fn log(&self, event: &str, name: &str) {
        self.events
            .borrow_mut()
            .push(format!("{}:{}:{}", self.label, event, name));
    }
}

impl TestListener for Recorder {
    fn add_failure(&mut self, test: &TestCase, _failure: &AssertionFailure, _time: Duration) {
        self.log("failure", test.name());
    }

    fn add_error(&mut self, test: &TestCase, _error: &TestError, _time: Duration) {
        self.log("error", test.name());
    }

    fn start_test_suite(&mut self, suite: &TestSuite) {
        self.log("start_suite", suite.name());
    }

    fn end_test_suite(&mut self, suite: &TestSuite) {
        self.log("end_suite", suite.name());
    }

    fn start_test(&mut self, test: &TestCase) {
        self.log("start", test.name());
    }

    fn end_test(&mut self, test: &TestCase, _time: Duration) {
        self.log("end", test.name());
    }
}

fn passing(name: &str) -> TestCase {
    TestCase::new(name, |ctx| ctx.assert_true(true))
}

fn failing(name: &str) -> TestCase {
    TestCase::new(name, |ctx| ctx.assert_equals(1, 2))
}

fn counting(name: &str, runs: &Arc<AtomicUsize>) -> TestCase {
    let runs = Arc::clone(runs);
    TestCase::new(name, move |ctx| {
        runs.fetch_add(1, Ordering::SeqCst);
        ctx.assert_true(true)
    })
}

// ============================================================================
// Classification
// ============================================================================

#[test]
fn test_mixed_suite_classification() {
    let suite = TestSuite::new("Mixed")
        .with_test(passing("ok"))
        .with_test(failing("mismatch"))
        .with_test(TestCase::new("boom", |_| Err(anyhow::anyhow!("boom").into())))
        .with_test(TestSuite::new("Nested").with_test(passing("inner")));

    let mut result = TestResult::new();
    suite.run(&mut result);

    assert_eq!(result.count(), 4);
    let passed: Vec<&str> = result.passed().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(passed, vec!["ok", "inner"]);
    assert_eq!(result.failure_count(), 1);
    assert_eq!(result.error_count(), 1);
    assert_eq!(result.assertion_count(), 3);
    assert!(!result.was_successful());
    assert_eq!(result.top_test_suite().map(TestSuite::name), Some("Mixed"));
}

#[test]
fn test_zero_assertion_test_is_risky_when_strict() {
    let suite = TestSuite::new("S").with_test(TestCase::new("idle", |_| Ok(())));

    let mut lenient = TestResult::new();
    suite.run(&mut lenient);
    assert!(lenient.has_passed("idle"));

    let mut strict = TestResult::new();
    strict.be_strict_about_tests_without_assertions(true);
    suite.run(&mut strict);
    assert_eq!(strict.risky_count(), 1);
    assert!(strict.was_successful());
    assert!(!strict.all_harmless());
}

#[test]
fn test_failed_set_up_skips_body() {
    let runs = Arc::new(AtomicUsize::new(0));
    let test = counting("guarded", &runs)
        .with_set_up(|ctx| Err(ctx.mark_skipped("database unavailable")));

    let mut result = TestResult::new();
    TestSuite::new("S").with_test(test).run(&mut result);

    assert_eq!(runs.load(Ordering::SeqCst), 0);
    assert_eq!(result.skipped_count(), 1);
    assert_eq!(result.skipped()[0].error_message(), "database unavailable");
}

// ============================================================================
// Stop latch
// ============================================================================

#[test]
fn test_stop_on_failure_skips_remaining_siblings() {
    let runs = Arc::new(AtomicUsize::new(0));
    let suite = TestSuite::new("S")
        .with_test(counting("first", &runs))
        .with_test(failing("second"))
        .with_test(counting("third", &runs))
        .with_test(TestSuite::new("Nested").with_test(counting("fourth", &runs)));

    let mut result = TestResult::new();
    result.stop_on_failure(true);
    suite.run(&mut result);

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(result.count(), 2);
    assert!(result.should_stop());
}

#[test]
fn test_stop_on_risky_ignores_failures() {
    let suite = TestSuite::new("S")
        .with_test(failing("a"))
        .with_test(TestCase::new("b", |_| Ok(())))
        .with_test(passing("c"));

    let mut result = TestResult::new();
    result.stop_on_risky(true);
    result.be_strict_about_tests_without_assertions(true);
    suite.run(&mut result);

    assert_eq!(result.count(), 2);
    assert_eq!(result.failure_count(), 1);
    assert_eq!(result.risky_count(), 1);
}

// ============================================================================
// Decorators
// ============================================================================

#[test]
fn test_repeated_test_runs_exactly_n_times() {
    let runs = Arc::new(AtomicUsize::new(0));
    let repeated = RepeatedTest::new(counting("again", &runs), 3).unwrap();
    let suite = TestSuite::new("S").with_test(repeated);

    let mut result = TestResult::new();
    suite.run(&mut result);

    assert_eq!(suite.count(), 3);
    assert_eq!(runs.load(Ordering::SeqCst), 3);
    assert_eq!(result.count(), 3);
    assert_eq!(result.passed_count(), 3);
    assert_eq!(result.recorded_count(), result.count());
    assert_eq!(result.assertion_count(), 3);
}

#[test]
fn test_repeated_test_honours_stop() {
    let repeated = RepeatedTest::new(failing("flaky"), 5).unwrap();
    let mut result = TestResult::new();
    result.stop_on_failure(true);
    TestSuite::new("S").with_test(repeated).run(&mut result);
    assert_eq!(result.count(), 1);
}

#[test]
fn test_group_suite_runs_leaf_once_per_matching_group() {
    let runs = Arc::new(AtomicUsize::new(0));
    let suite = TestSuite::new("Calc")
        .with_test(counting("add", &runs).with_groups(["fast", "math"]))
        .with_test(counting("io", &runs).with_groups(["slow"]));

    let grouped = GroupTestSuite::include(&suite, &["fast", "math"], &DeclaredMetadata);
    let mut result = TestResult::new();
    grouped.run(&mut result);

    assert_eq!(runs.load(Ordering::SeqCst), 2);
    assert_eq!(result.count(), 2);
    assert_eq!(result.passed_count(), 2);
    assert_eq!(result.recorded_count(), result.count());
}

#[test]
fn test_excluding_groups_keeps_repeated_tests_running() {
    let runs = Arc::new(AtomicUsize::new(0));
    let suite = TestSuite::new("S")
        .with_test(RepeatedTest::new(counting("kept", &runs), 2).unwrap())
        .with_test(counting("other", &runs))
        .with_test(counting("slow", &runs).with_groups(["slow"]));

    let filtered = GroupTestSuite::exclude(&suite, &["slow"], &DeclaredMetadata);
    let mut result = TestResult::new();
    filtered.run(&mut result);

    assert_eq!(filtered.count(), 3);
    assert_eq!(runs.load(Ordering::SeqCst), 3);
    assert_eq!(result.count(), 3);
    assert_eq!(result.recorded_count(), result.count());
}

#[test]
fn test_including_groups_counts_repeated_runs() {
    let runs = Arc::new(AtomicUsize::new(0));
    let suite = TestSuite::new("S").with_test(
        TestSuite::new("Nested")
            .with_test(RepeatedTest::new(counting("again", &runs).with_groups(["math"]), 2).unwrap()),
    );

    let grouped = GroupTestSuite::include(&suite, &["math"], &DeclaredMetadata);
    let events: Events = Rc::new(RefCell::new(Vec::new()));
    let recorder = Recorder::new("L", &events);
    let mut result = TestResult::new();
    result.add_listener(&recorder);
    grouped.run(&mut result);

    assert_eq!(runs.load(Ordering::SeqCst), 2);
    assert_eq!(result.passed_count(), 2);
    assert_eq!(result.recorded_count(), result.count());
    assert!(events.borrow().contains(&"L:start_suite:Nested".to_string()));
    assert!(events.borrow().contains(&"L:end_suite:Nested".to_string()));
}

// ============================================================================
// Listeners
// ============================================================================

#[test]
fn test_listeners_are_notified_in_registration_order() {
    let events: Events = Rc::new(RefCell::new(Vec::new()));
    let first = Recorder::new("L1", &events);
    let second = Recorder::new("L2", &events);

    let mut result = TestResult::new();
    result.add_listener(&first);
    result.add_listener(&second);
    TestSuite::new("S")
        .with_test(failing("t"))
        .run(&mut result);

    assert_eq!(
        *events.borrow(),
        vec![
            "L1:start_suite:S",
            "L2:start_suite:S",
            "L1:start:t",
            "L2:start:t",
            "L1:failure:t",
            "L2:failure:t",
            "L1:end:t",
            "L2:end:t",
            "L1:end_suite:S",
            "L2:end_suite:S",
        ]
    );
}

#[test]
fn test_removed_listener_stops_receiving_events() {
    let events: Events = Rc::new(RefCell::new(Vec::new()));
    let kept = Recorder::new("kept", &events);
    let removed = Recorder::new("removed", &events);

    let mut result = TestResult::new();
    result.add_listener(&kept);
    result.add_listener(&removed);
    result.remove_listener(&removed);
    result.run(&Arc::new(passing("t")));

    assert!(events.borrow().iter().all(|e| e.starts_with("kept:")));
    assert_eq!(events.borrow().len(), 2);
}

#[test]
fn test_dropped_listener_is_skipped() {
    let events: Events = Rc::new(RefCell::new(Vec::new()));
    let kept = Recorder::new("kept", &events);
    let dropped = Recorder::new("dropped", &events);

    let mut result = TestResult::new();
    result.add_listener(&kept);
    result.add_listener(&dropped);
    drop(dropped);
    result.run(&Arc::new(failing("t")));

    assert_eq!(
        *events.borrow(),
        vec!["kept:start:t", "kept:failure:t", "kept:end:t"]
    );
}

#[test]
fn test_printer_reports_whole_run() {
    let printer = Rc::new(RefCell::new(ResultPrinter::new(Vec::new())));
    let suite = TestSuite::new("S")
        .with_test(passing("a"))
        .with_test(TestCase::new("b", |_| Err(anyhow::anyhow!("socket closed").into())));

    let mut result = TestResult::new();
    result.add_listener(&printer);
    suite.run(&mut result);
    printer.borrow_mut().print_result(&result);
    result.flush_listeners();

    let output = String::from_utf8(printer.borrow().writer().clone()).unwrap();
    assert!(output.starts_with(".E"), "{}", output);
    assert!(output.contains("There was 1 error:\n\n1) b\nError: socket closed\n"));
    assert!(output.ends_with("FAILURES!\nTests: 2, Assertions: 1, Errors: 1.\n"));
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_policies_loaded_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("tests").join("unit");
    std::fs::create_dir_all(&nested).unwrap();
    std::fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        "[stop]\non-failure = true\n\n[strict]\ntests-without-assertions = true\n",
    )
    .unwrap();

    let config = ConfigLoader::new()
        .without_env()
        .load_from_directory(&nested)
        .unwrap();
    assert_eq!(config.project_root.as_deref(), Some(dir.path()));

    let suite = TestSuite::new("S")
        .with_test(TestCase::new("idle", |_| Ok(())))
        .with_test(failing("broken"))
        .with_test(passing("never"));

    let mut result = TestResult::new();
    result.configure(&config.run);
    suite.run(&mut result);

    assert_eq!(result.risky_count(), 1);
    assert_eq!(result.failure_count(), 1);
    assert_eq!(result.count(), 2);
}
