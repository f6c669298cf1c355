//! RM-032: Test session bookkeeping and the final report.

use super::expect::Diagnostic;
use crate::notice::Notices;
use std::path::PathBuf;
use termcolor::{Color, WriteColor};

/// Expected vs. generated output of an emit test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    /// What was emitted, e.g. "IR".
    pub what: &'static str,
    pub expected: String,
    pub generated: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedTest {
    pub path: PathBuf,
    pub message: Option<String>,
    pub unexpected: Vec<Diagnostic>,
    pub missing: Vec<Diagnostic>,
    pub output: Option<String>,
    pub mismatch: Option<Mismatch>,
}

impl FailedTest {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            message: None,
            unexpected: Vec::new(),
            missing: Vec::new(),
            output: None,
            mismatch: None,
        }
    }

    pub fn message(mut self, msg: impl Into<String>) -> Self {
        self.message = Some(msg.into());
        self
    }

    pub fn output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }
}

#[derive(Debug, Default)]
pub struct Session {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub failures: Vec<FailedTest>,
}

impl Session {
    pub fn start<W: WriteColor>(&self, notices: &mut Notices<W>, name: &str) {
        notices.plain_inline(&format!("Testing {} ... ", name));
    }

    pub fn success<W: WriteColor>(&mut self, notices: &mut Notices<W>) {
        notices.done("ok");
        self.passed += 1;
    }

    pub fn failure<W: WriteColor>(&mut self, notices: &mut Notices<W>, failure: FailedTest) {
        notices.failure("failed");
        self.failures.push(failure);
        self.failed += 1;
    }

    pub fn skip<W: WriteColor>(&mut self, notices: &mut Notices<W>) {
        notices.skipped("skipped");
        self.skipped += 1;
    }

    /// Summary line, then details for every failure.
    pub fn report<W: WriteColor>(&self, notices: &mut Notices<W>) {
        notices.plain("");

        if self.failed > 0 {
            notices.colored(Color::Red, &format!("{} failed; ", pluralize(self.failed)), false);
        }
        if self.skipped > 0 {
            notices.colored(
                Color::Yellow,
                &format!("{} skipped; ", pluralize(self.skipped)),
                false,
            );
        }
        notices.colored(Color::Green, &format!("{} passed", pluralize(self.passed)), true);

        for failure in &self.failures {
            report_failure(notices, failure);
        }
    }
}

fn report_failure<W: WriteColor>(notices: &mut Notices<W>, failure: &FailedTest) {
    notices.plain("");
    notices.plain(&format!(
        "--- Test {}: {}",
        failure.path.display(),
        failure.message.as_deref().unwrap_or("")
    ));

    if !failure.unexpected.is_empty() {
        notices.plain("Unexpected errors:");
        for e in &failure.unexpected {
            notices.plain(&format!("   {}", e));
        }
    }

    if !failure.missing.is_empty() {
        notices.plain("Missing errors:");
        for e in &failure.missing {
            notices.plain(&format!("   {}", e));
        }
    }

    if let Some(ref m) = failure.mismatch {
        notices.colored(Color::Cyan, &format!("   Expected {}:", m.what), true);
        notices.plain(&m.expected);
        notices.plain("");
        notices.colored(Color::Cyan, &format!("   Generated {}:", m.what), true);
        notices.plain(&m.generated);
    }

    if let Some(ref output) = failure.output {
        if !output.trim().is_empty() {
            notices.plain("Compiler output:");
            for line in output.lines() {
                notices.plain(&format!("   {}", line));
            }
        }
    }
}

/// "1 test", "2 tests"
pub fn pluralize(n: usize) -> String {
    if n == 1 {
        format!("{} test", n)
    } else {
        format!("{} tests", n)
    }
}
