//! Per-test metadata lookups: groups, size and the todo marker.

use crate::test::TestCase;
use std::fmt;

/// Group assigned to tests that declare none.
pub const DEFAULT_GROUP: &str = "default";

/// Size class of a test, deciding its time budget and resource policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TestSize {
    Small,
    Medium,
    Large,
    #[default]
    Unknown,
}

impl fmt::Display for TestSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TestSize::Small => "small",
            TestSize::Medium => "medium",
            TestSize::Large => "large",
            TestSize::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Source of metadata about leaf tests.
///
/// The core never parses annotations itself; it asks this lookup.
pub trait TestMetadata {
    fn groups(&self, test: &TestCase) -> Vec<String>;

    fn size(&self, test: &TestCase) -> TestSize;

    fn is_todo(&self, test: &TestCase) -> bool;
}

/// Reads what the [`TestCase`] builder declared.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredMetadata;

impl TestMetadata for DeclaredMetadata {
    fn groups(&self, test: &TestCase) -> Vec<String> {
        if test.declared_groups().is_empty() {
            vec![DEFAULT_GROUP.to_string()]
        } else {
            test.declared_groups().to_vec()
        }
    }

    fn size(&self, test: &TestCase) -> TestSize {
        test.declared_size()
    }

    fn is_todo(&self, test: &TestCase) -> bool {
        test.declared_todo()
    }
}
