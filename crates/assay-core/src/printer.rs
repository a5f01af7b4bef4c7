//! Progress and summary printer.

use crate::failure::{AssertionFailure, TestError};
use crate::listener::{TestFailure, TestListener};
use crate::result::TestResult;
use crate::test::{TestCase, TestSuite};
use colored::{Color, Colorize};
use std::io::{self, Write};
use std::time::Duration;

/// Default width of the progress line before the counter is printed.
const MAX_COLUMN: usize = 63;

/// Buffered listener printing one character per test (`.`, `F`, `E`, `R`,
/// `I`, `S`), then defect details and a summary line.
///
/// Nothing reaches the writer until [`TestListener::flush`] is called.
pub struct ResultPrinter<W: Write = io::Stdout> {
    writer: W,
    buffer: String,
    colors: bool,
    max_column: usize,
    column: usize,
    num_tests: usize,
    num_tests_run: usize,
    last_test_failed: bool,
}

impl ResultPrinter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ResultPrinter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            buffer: String::new(),
            colors: false,
            max_column: MAX_COLUMN,
            column: 0,
            num_tests: 0,
            num_tests_run: 0,
            last_test_failed: false,
        }
    }

    /// Enable colored output
    pub fn with_colors(mut self, colors: bool) -> Self {
        self.colors = colors;
        self
    }

    pub fn with_max_column(mut self, max_column: usize) -> Self {
        self.max_column = max_column.max(1);
        self
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    /// Append defect details and the summary for `result`.
    pub fn print_result(&mut self, result: &TestResult) {
        self.buffer
            .push_str(&format!("\n\nTime: {:.2?}\n\n", result.time()));

        self.print_defects(result.errors(), "error");
        self.print_defects(result.failures(), "failure");
        self.print_defects(result.risky(), "risky test");
        self.print_defects(result.not_implemented(), "incomplete test");
        self.print_defects(result.skipped(), "skipped test");

        self.print_footer(result);
    }

    fn print_defects(&mut self, defects: &[TestFailure], kind: &str) {
        if defects.is_empty() {
            return;
        }
        let header = if defects.len() == 1 {
            format!("There was 1 {}:\n", kind)
        } else {
            format!("There were {} {}s:\n", defects.len(), kind)
        };
        self.buffer.push_str(&header);

        for (i, defect) in defects.iter().enumerate() {
            self.buffer
                .push_str(&format!("\n{}) {}\n", i + 1, defect.test_name()));
            self.buffer.push_str(&defect.exception_to_string());
        }
        self.buffer.push_str("\n--\n\n");
    }

    fn print_footer(&mut self, result: &TestResult) {
        let tests = result.count();
        let assertions = result.assertion_count();

        if result.was_successful()
            && result.all_harmless()
            && result.all_completely_implemented()
            && result.none_skipped()
        {
            let line = format!(
                "OK ({} test{}, {} assertion{})",
                tests,
                plural(tests),
                assertions,
                plural(assertions)
            );
            let line = self.paint(&line, Color::Green);
            self.buffer.push_str(&line);
            self.buffer.push('\n');
            return;
        }

        let (headline, color) = if result.was_successful() {
            ("OK, but incomplete, skipped, or risky tests!", Color::Yellow)
        } else {
            ("FAILURES!", Color::Red)
        };
        let mut counts = format!("Tests: {}, Assertions: {}", tests, assertions);
        let parts = [
            ("Errors", result.error_count()),
            ("Failures", result.failure_count()),
            ("Skipped", result.skipped_count()),
            ("Incomplete", result.not_implemented_count()),
            ("Risky", result.risky_count()),
        ];
        for (label, count) in parts {
            if count > 0 {
                counts.push_str(&format!(", {}: {}", label, count));
            }
        }
        counts.push('.');

        let headline = self.paint(headline, color);
        let counts = self.paint(&counts, color);
        self.buffer.push_str(&format!("{}\n{}\n", headline, counts));
    }

    fn write_progress(&mut self, progress: &str, color: Option<Color>) {
        let progress = match color {
            Some(color) => self.paint(progress, color),
            None => progress.to_string(),
        };
        self.buffer.push_str(&progress);
        self.column += 1;
        self.num_tests_run += 1;

        if self.num_tests == 0 {
            return;
        }
        let finished = self.num_tests_run >= self.num_tests;
        if self.column == self.max_column || finished {
            if finished {
                let padding = self.max_column.saturating_sub(self.column);
                self.buffer.push_str(&" ".repeat(padding));
            }
            let width = self.num_tests.to_string().len();
            self.buffer.push_str(&format!(
                " {:>width$} / {:>width$} ({:>3}%)",
                self.num_tests_run,
                self.num_tests,
                self.num_tests_run * 100 / self.num_tests,
                width = width
            ));
            if !finished {
                self.buffer.push('\n');
            }
            self.column = 0;
        }
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.colors {
            text.color(color).bold().to_string()
        } else {
            text.to_string()
        }
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

impl<W: Write> TestListener for ResultPrinter<W> {
    fn add_error(&mut self, _test: &TestCase, _error: &TestError, _time: Duration) {
        self.write_progress("E", Some(Color::Red));
        self.last_test_failed = true;
    }

    fn add_failure(&mut self, _test: &TestCase, _failure: &AssertionFailure, _time: Duration) {
        self.write_progress("F", Some(Color::Red));
        self.last_test_failed = true;
    }

    fn add_incomplete_test(&mut self, _test: &TestCase, _error: &TestError, _time: Duration) {
        self.write_progress("I", Some(Color::Yellow));
        self.last_test_failed = true;
    }

    fn add_risky_test(&mut self, _test: &TestCase, _error: &TestError, _time: Duration) {
        self.write_progress("R", Some(Color::Yellow));
        self.last_test_failed = true;
    }

    fn add_skipped_test(&mut self, _test: &TestCase, _error: &TestError, _time: Duration) {
        self.write_progress("S", Some(Color::Cyan));
        self.last_test_failed = true;
    }

    fn start_test_suite(&mut self, suite: &TestSuite) {
        if self.num_tests == 0 {
            self.num_tests = suite.count();
        }
    }

    fn start_test(&mut self, _test: &TestCase) {
        self.last_test_failed = false;
    }

    fn end_test(&mut self, _test: &TestCase, _time: Duration) {
        if !self.last_test_failed {
            self.write_progress(".", None);
        }
    }

    fn flush(&mut self) {
        let buffer = std::mem::take(&mut self.buffer);
        if let Err(e) = self
            .writer
            .write_all(buffer.as_bytes())
            .and_then(|()| self.writer.flush())
        {
            tracing::warn!(error = %e, "failed to write test report");
        }
    }
}
