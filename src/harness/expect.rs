//! RM-031: Expected-error comments and compiler error output.
//!
//! Test sources declare expectations with `//! ERROR(<line>:<col>): <msg>`
//! or `//! ERROR: <msg>`, and opt out with a `//! SKIP` line. The compiler
//! reports errors as `Error in line <line>:<col>: <msg>` or `Error: <msg>`.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static OUTPUT_LOCATED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Error in line (?P<line>\d+):(?P<col>\d+): ?(?P<error>.*)").expect("valid regex")
});
static OUTPUT_PLAIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Error: (?P<error>.*)").expect("valid regex"));
static EXPECT_LOCATED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^.*//! ERROR\((?P<line>\d+):(?P<col>\d+)\): ?(?P<error>.*)").expect("valid regex")
});
static EXPECT_PLAIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.*//! ERROR: (?P<error>.*)").expect("valid regex"));

/// A compiler error, either reported or expected. Compared by all fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Diagnostic {
    pub line: Option<u32>,
    pub col: Option<u32>,
    pub message: String,
}

impl Diagnostic {
    pub fn located(line: u32, col: u32, message: impl Into<String>) -> Self {
        Self {
            line: Some(line),
            col: Some(col),
            message: message.into(),
        }
    }

    pub fn plain(message: impl Into<String>) -> Self {
        Self {
            line: None,
            col: None,
            message: message.into(),
        }
    }

    fn from_captures(caps: &regex::Captures<'_>) -> Self {
        Self {
            line: caps.name("line").and_then(|m| m.as_str().parse().ok()),
            col: caps.name("col").and_then(|m| m.as_str().parse().ok()),
            message: caps
                .name("error")
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.col) {
            (Some(line), Some(col)) => write!(f, "Error in line {}:{}: {}", line, col, self.message),
            _ => write!(f, "Error: {}", self.message),
        }
    }
}

/// Split compiler output into reported errors and everything else.
pub fn parse_output(output: &str) -> (Vec<Diagnostic>, Vec<String>) {
    let mut errors = Vec::new();
    let mut rest = Vec::new();

    for line in output.lines() {
        if let Some(caps) = OUTPUT_LOCATED.captures(line) {
            errors.push(Diagnostic::from_captures(&caps));
        } else if let Some(caps) = OUTPUT_PLAIN.captures(line) {
            errors.push(Diagnostic::from_captures(&caps));
        } else {
            rest.push(line.to_string());
        }
    }

    (errors, rest)
}

/// Expected errors declared in a test source.
pub fn parse_expectations(source: &str) -> Vec<Diagnostic> {
    source
        .lines()
        .filter_map(|line| {
            EXPECT_LOCATED
                .captures(line)
                .or_else(|| EXPECT_PLAIN.captures(line))
                .map(|caps| Diagnostic::from_captures(&caps))
        })
        .collect()
}

/// A line consisting of exactly `//! SKIP` (ignoring surrounding whitespace).
pub fn is_skipped(source: &str) -> bool {
    source.lines().any(|line| line.trim() == "//! SKIP")
}
