//! Running a test body under a time budget.

use crate::assert::TestContext;
use crate::failure::{AssertionFailure, TestError};
use crate::test::TestCase;
use std::time::{Duration, Instant};

/// Executes a test body with a time limit.
pub trait Invoker {
    fn invoke(
        &self,
        test: &TestCase,
        context: &mut TestContext,
        timeout: Duration,
    ) -> Result<(), TestError>;
}

/// Runs the body to completion and reports an overrun afterwards.
///
/// The body is never preempted; a test that outlives its budget is
/// reported as risky once it returns, replacing whatever it returned.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimingInvoker;

impl Invoker for TimingInvoker {
    fn invoke(
        &self,
        test: &TestCase,
        context: &mut TestContext,
        timeout: Duration,
    ) -> Result<(), TestError> {
        let start = Instant::now();
        let outcome = test.run_bare(context);
        let elapsed = start.elapsed();

        if elapsed > timeout {
            tracing::debug!(
                test = test.name(),
                elapsed_ms = elapsed.as_millis() as u64,
                timeout_ms = timeout.as_millis() as u64,
                "time limit exceeded"
            );
            return Err(AssertionFailure::risky(aborted_message(timeout)).into());
        }
        outcome
    }
}

fn aborted_message(timeout: Duration) -> String {
    let seconds = timeout.as_secs();
    let unit = if seconds == 1 { "second" } else { "seconds" };
    format!("Execution aborted after {} {}", seconds, unit)
}
