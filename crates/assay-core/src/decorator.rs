//! Decorators reshaping how tests run: repetition and group filtering.

use crate::failure::TestError;
use crate::metadata::TestMetadata;
use crate::result::TestResult;
use crate::test::{Test, TestCase, TestSuite};
use std::sync::Arc;

/// Runs the wrapped test a fixed number of times.
#[derive(Debug, Clone)]
pub struct RepeatedTest {
    test: Box<Test>,
    times: usize,
}

impl RepeatedTest {
    /// `times` must be a non-negative integer.
    pub fn new(test: impl Into<Test>, times: i64) -> Result<Self, TestError> {
        let times = usize::try_from(times).map_err(|_| {
            TestError::invalid_argument(2, "RepeatedTest::new", "non-negative integer")
        })?;
        Ok(Self {
            test: Box::new(test.into()),
            times,
        })
    }

    pub fn test(&self) -> &Test {
        &self.test
    }

    pub fn times(&self) -> usize {
        self.times
    }

    pub fn count(&self) -> usize {
        self.times.saturating_mul(self.test.count())
    }

    pub fn run(&self, result: &mut TestResult) {
        for _ in 0..self.times {
            if result.should_stop() {
                break;
            }
            self.test.run(result);
        }
    }
}

/// Builders regrouping a suite by group.
///
/// Both keep the shape of the tree: nested suites stay nested and repeated
/// tests stay repeated. Nested suites left without any test are pruned.
pub struct GroupTestSuite;

impl GroupTestSuite {
    /// One sub-suite per requested group, named `"<suite> - <group>"`.
    ///
    /// A leaf tagged with several requested groups lands in each of their
    /// sub-suites and therefore runs once per matching group.
    pub fn include<S: AsRef<str>>(
        suite: &TestSuite,
        groups: &[S],
        metadata: &dyn TestMetadata,
    ) -> TestSuite {
        groups
            .iter()
            .map(|group| {
                let group = group.as_ref();
                let tagged = |leaf: &TestCase| {
                    let hit = metadata.groups(leaf).iter().any(|tag| tag == group);
                    if hit {
                        tracing::trace!(test = leaf.name(), group, "grouped");
                    }
                    hit
                };
                retain_children(suite, format!("{} - {}", suite.name(), group), &tagged)
            })
            .fold(TestSuite::new(suite.name()), |outer, group_suite| {
                outer.with_test(group_suite)
            })
    }

    /// The suite minus every leaf tagged with any excluded group.
    pub fn exclude<S: AsRef<str>>(
        suite: &TestSuite,
        groups: &[S],
        metadata: &dyn TestMetadata,
    ) -> TestSuite {
        let untagged = |leaf: &TestCase| {
            !metadata
                .groups(leaf)
                .iter()
                .any(|tag| groups.iter().any(|group| group.as_ref() == tag.as_str()))
        };
        retain_children(suite, suite.name().to_string(), &untagged)
    }
}

/// Copy of `suite`'s children, renamed, keeping only leaves accepted by `keep`.
fn retain_children(suite: &TestSuite, name: String, keep: &dyn Fn(&TestCase) -> bool) -> TestSuite {
    suite
        .tests()
        .iter()
        .filter_map(|test| retain(test, keep))
        .fold(TestSuite::new(name), |filtered, test| filtered.with_test(test))
}

fn retain(test: &Test, keep: &dyn Fn(&TestCase) -> bool) -> Option<Test> {
    match test {
        Test::Case(case) => keep(case).then(|| Test::Case(Arc::clone(case))),
        Test::Suite(suite) => {
            let filtered = retain_children(suite, suite.name().to_string(), keep);
            (!filtered.is_empty()).then_some(Test::Suite(filtered))
        }
        Test::Repeated(repeated) => retain(repeated.test(), keep).map(|inner| {
            Test::Repeated(RepeatedTest {
                test: Box::new(inner),
                times: repeated.times,
            })
        }),
    }
}
