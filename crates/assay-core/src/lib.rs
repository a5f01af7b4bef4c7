//! Assay Core - unit testing engine
//!
//! This library provides the building blocks of an xUnit-style test run:
//! - Deep, cycle-safe value comparison with diffs (`comparator`, `diff`)
//! - Composable, self-describing constraints (`constraint`)
//! - The assertion facade handed to test bodies (`assert`)
//! - Test cases, suites and decorators (`test`, `decorator`)
//! - Result aggregation, listeners and the progress printer (`result`,
//!   `listener`, `printer`)
//!
//! # Example
//!
//! ```
//! use assay_core::{TestCase, TestResult, TestSuite};
//!
//! let suite = TestSuite::new("arithmetic")
//!     .with_test(TestCase::new("adds", |ctx| ctx.assert_equals(4, 2 + 2)));
//!
//! let mut result = TestResult::new();
//! suite.run(&mut result);
//! assert!(result.was_successful());
//! assert_eq!(result.assertion_count(), 1);
//! ```

/// Assay core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod assert;
pub mod comparator;
pub mod constraint;
pub mod decorator;
pub mod diff;
pub mod exporter;
pub mod failure;
pub mod invoker;
pub mod listener;
pub mod markup;
pub mod metadata;
pub mod printer;
pub mod result;
pub mod test;
pub mod value;

pub use assert::TestContext;
pub use comparator::{
    compare, equals, Comparator, ComparatorFactory, Comparison, ComparisonFailure,
    ComparisonResult, EqualsOptions,
};
pub use constraint::{Constraint, NativeType};
pub use decorator::{GroupTestSuite, RepeatedTest};
pub use exporter::{export, shortened_export};
pub use failure::{AssertionFailure, FailureKind, TestError};
pub use invoker::{Invoker, TimingInvoker};
pub use listener::{TestFailure, TestListener};
pub use metadata::{DeclaredMetadata, TestMetadata, TestSize};
pub use printer::ResultPrinter;
pub use result::{PassedTest, TestResult};
pub use test::{Test, TestCase, TestSuite};
pub use value::{ArrayKey, ObjectRef, ResourceRef, Value, ValueArray, Visibility};
