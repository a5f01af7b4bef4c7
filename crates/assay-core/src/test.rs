//! Runnable test units: leaf cases, suites and the [`Test`] tree.

use crate::assert::TestContext;
use crate::decorator::RepeatedTest;
use crate::failure::TestError;
use crate::metadata::TestSize;
use crate::result::TestResult;
use std::fmt;
use std::sync::Arc;

type Body = Arc<dyn Fn(&mut TestContext) -> Result<(), TestError> + Send + Sync>;

/// A single test: a body plus optional fixture hooks and declared metadata.
#[derive(Clone)]
pub struct TestCase {
    name: String,
    body: Body,
    set_up: Option<Body>,
    tear_down: Option<Body>,
    groups: Vec<String>,
    size: TestSize,
    todo: bool,
}

impl TestCase {
    pub fn new(
        name: impl Into<String>,
        body: impl Fn(&mut TestContext) -> Result<(), TestError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            body: Arc::new(body),
            set_up: None,
            tear_down: None,
            groups: Vec::new(),
            size: TestSize::Unknown,
            todo: false,
        }
    }

    /// Hook run before the body; the body is skipped when it fails.
    pub fn with_set_up(
        mut self,
        hook: impl Fn(&mut TestContext) -> Result<(), TestError> + Send + Sync + 'static,
    ) -> Self {
        self.set_up = Some(Arc::new(hook));
        self
    }

    /// Hook run after the body, whatever the body's outcome.
    pub fn with_tear_down(
        mut self,
        hook: impl Fn(&mut TestContext) -> Result<(), TestError> + Send + Sync + 'static,
    ) -> Self {
        self.tear_down = Some(Arc::new(hook));
        self
    }

    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_size(mut self, size: TestSize) -> Self {
        self.size = size;
        self
    }

    /// Mark the test as not finished yet.
    pub fn todo(mut self) -> Self {
        self.todo = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// A leaf always stands for a single run.
    pub fn count(&self) -> usize {
        1
    }

    pub fn declared_groups(&self) -> &[String] {
        &self.groups
    }

    pub fn declared_size(&self) -> TestSize {
        self.size
    }

    pub fn declared_todo(&self) -> bool {
        self.todo
    }

    /// Run set-up, body and tear-down against `context`.
    ///
    /// Tear-down always runs; the first error raised wins.
    pub fn run_bare(&self, context: &mut TestContext) -> Result<(), TestError> {
        let outcome = match &self.set_up {
            Some(set_up) => set_up(context).and_then(|()| (self.body)(context)),
            None => (self.body)(context),
        };
        let teardown = match &self.tear_down {
            Some(tear_down) => tear_down(context),
            None => Ok(()),
        };
        outcome.and(teardown)
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .field("groups", &self.groups)
            .field("size", &self.size)
            .field("todo", &self.todo)
            .finish_non_exhaustive()
    }
}

/// Named, ordered collection of tests.
#[derive(Debug, Clone, Default)]
pub struct TestSuite {
    name: String,
    tests: Vec<Test>,
}

impl TestSuite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tests: Vec::new(),
        }
    }

    pub fn add_test(&mut self, test: impl Into<Test>) {
        self.tests.push(test.into());
    }

    pub fn with_test(mut self, test: impl Into<Test>) -> Self {
        self.add_test(test);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tests(&self) -> &[Test] {
        &self.tests
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Sum of the children's counts.
    pub fn count(&self) -> usize {
        self.tests
            .iter()
            .fold(0, |total: usize, test| total.saturating_add(test.count()))
    }

    /// Run children in insertion order until the result asks to stop.
    pub fn run(&self, result: &mut TestResult) {
        result.start_test_suite(self);
        for test in &self.tests {
            if result.should_stop() {
                break;
            }
            test.run(result);
        }
        result.end_test_suite(self);
    }

    /// Leaf runs reachable through nested suites and repetitions, depth
    /// first. A repeated leaf appears once per repetition, so the length
    /// matches [`count`](Self::count).
    pub fn leaves(&self) -> Vec<Arc<TestCase>> {
        let mut leaves = Vec::new();
        for test in &self.tests {
            test.collect_leaves(&mut leaves);
        }
        leaves
    }
}

/// Anything that can be counted and run against a [`TestResult`].
#[derive(Debug, Clone)]
pub enum Test {
    Case(Arc<TestCase>),
    Suite(TestSuite),
    Repeated(RepeatedTest),
}

impl Test {
    pub fn name(&self) -> &str {
        match self {
            Test::Case(case) => case.name(),
            Test::Suite(suite) => suite.name(),
            Test::Repeated(repeated) => repeated.test().name(),
        }
    }

    /// Number of leaf runs this test stands for.
    pub fn count(&self) -> usize {
        match self {
            Test::Case(case) => case.count(),
            Test::Suite(suite) => suite.count(),
            Test::Repeated(repeated) => repeated.count(),
        }
    }

    fn collect_leaves(&self, leaves: &mut Vec<Arc<TestCase>>) {
        match self {
            Test::Case(case) => leaves.push(Arc::clone(case)),
            Test::Suite(suite) => {
                for test in suite.tests() {
                    test.collect_leaves(leaves);
                }
            }
            Test::Repeated(repeated) => {
                for _ in 0..repeated.times() {
                    repeated.test().collect_leaves(leaves);
                }
            }
        }
    }

    pub fn run(&self, result: &mut TestResult) {
        match self {
            Test::Case(case) => result.run(case),
            Test::Suite(suite) => suite.run(result),
            Test::Repeated(repeated) => repeated.run(result),
        }
    }
}

impl From<TestCase> for Test {
    fn from(case: TestCase) -> Self {
        Test::Case(Arc::new(case))
    }
}

impl From<Arc<TestCase>> for Test {
    fn from(case: Arc<TestCase>) -> Self {
        Test::Case(case)
    }
}

impl From<TestSuite> for Test {
    fn from(suite: TestSuite) -> Self {
        Test::Suite(suite)
    }
}

impl From<RepeatedTest> for Test {
    fn from(repeated: RepeatedTest) -> Self {
        Test::Repeated(repeated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failure::AssertionFailure;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    type Log = Arc<Mutex<Vec<&'static str>>>;

    fn recording(
        log: &Log,
        step: &'static str,
        fail: bool,
    ) -> impl Fn(&mut TestContext) -> Result<(), TestError> + Send + Sync + 'static {
        let log = Arc::clone(log);
        move |_ctx| {
            log.lock().unwrap().push(step);
            if fail {
                Err(AssertionFailure::new(step).into())
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_tear_down_runs_after_failing_body() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let case = TestCase::new("t", recording(&log, "body", true))
            .with_set_up(recording(&log, "set_up", false))
            .with_tear_down(recording(&log, "tear_down", false));

        let error = case.run_bare(&mut TestContext::new()).unwrap_err();
        assert_eq!(error.to_string(), "body");
        assert_eq!(*log.lock().unwrap(), vec!["set_up", "body", "tear_down"]);
    }

    #[test]
    fn test_failing_set_up_skips_body() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let case = TestCase::new("t", recording(&log, "body", false))
            .with_set_up(recording(&log, "set_up", true))
            .with_tear_down(recording(&log, "tear_down", true));

        let error = case.run_bare(&mut TestContext::new()).unwrap_err();
        assert_eq!(error.to_string(), "set_up");
        assert_eq!(*log.lock().unwrap(), vec!["set_up", "tear_down"]);
    }

    #[test]
    fn test_suite_count_sums_children() {
        let inner = TestSuite::new("inner")
            .with_test(TestCase::new("a", |_| Ok(())))
            .with_test(TestCase::new("b", |_| Ok(())));
        let outer = TestSuite::new("outer")
            .with_test(inner)
            .with_test(TestCase::new("c", |_| Ok(())));
        assert_eq!(outer.count(), 3);
        let names: Vec<String> = outer.leaves().iter().map(|t| t.name().to_string()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_leaves_expand_repetitions() {
        let repeated = RepeatedTest::new(TestCase::new("again", |_| Ok(())), 2).unwrap();
        let suite = TestSuite::new("S")
            .with_test(repeated)
            .with_test(TestCase::new("once", |_| Ok(())));
        let names: Vec<String> = suite.leaves().iter().map(|t| t.name().to_string()).collect();
        assert_eq!(names, vec!["again", "again", "once"]);
        assert_eq!(suite.leaves().len(), suite.count());
    }
}
