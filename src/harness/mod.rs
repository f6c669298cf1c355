//! RM-030: Test runner for the compiler.
//!
//! Layout under the tests directory:
//!
//! ```text
//! compile-fail/<category>/<test>.rs   must fail with exactly the expected errors
//! run-pass/<category>/<test>.rs       must compile cleanly
//! ir/<test>.rs + ir/<test>.ir         `--target ir` output must match
//! asm/<test>.rs + asm/<test>.s        `--target asm` output must match
//! ```

pub mod expect;
pub mod session;
pub mod suites;

use crate::core::error::MakeError;
use crate::core::types::{Profile, Project};
use crate::notice::Notices;
use crate::process::Runner;
use std::fmt;
use std::str::FromStr;
use termcolor::WriteColor;

pub use session::Session;
pub use suites::SuiteRunner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suite {
    /// The compiler's own unit tests, through the toolchain.
    Internal,
    CompileFail,
    RunPass,
    Ir,
    Asm,
}

impl Suite {
    pub const ALL: [Suite; 5] = [
        Suite::Internal,
        Suite::CompileFail,
        Suite::RunPass,
        Suite::Ir,
        Suite::Asm,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Internal => "internal",
            Self::CompileFail => "compile-fail",
            Self::RunPass => "run-pass",
            Self::Ir => "ir",
            Self::Asm => "asm",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Internal => "compiler unit tests",
            Self::CompileFail => "compile-fail tests",
            Self::RunPass => "run-pass tests",
            Self::Ir => "IR tests",
            Self::Asm => "ASM tests",
        }
    }
}

impl fmt::Display for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Suite {
    type Err = MakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Suite::ALL
            .into_iter()
            .find(|suite| suite.as_str() == s)
            .ok_or_else(|| MakeError::UnknownSuite(s.to_string()))
    }
}

/// `None` selects every suite; otherwise a non-empty comma-separated list.
pub fn parse_suites(selection: Option<&str>) -> Result<Vec<Suite>, MakeError> {
    let Some(list) = selection else {
        return Ok(Suite::ALL.to_vec());
    };
    let suites = list
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse::<Suite>)
        .collect::<Result<Vec<_>, _>>()?;
    if suites.is_empty() {
        return Err(MakeError::UnknownSuite(list.to_string()));
    }
    Ok(suites)
}

/// Run `suites` in order against the compiler built for `profile`, then
/// print the summary. Fails if any test failed.
pub fn run_suites<R: Runner, W: WriteColor>(
    project: &Project,
    profile: Profile,
    runner: &mut R,
    notices: &mut Notices<W>,
    suites: &[Suite],
) -> Result<(), MakeError> {
    let mut suite_runner = SuiteRunner::new(project, profile, runner, notices);
    for &suite in suites {
        suite_runner.run(suite)?;
    }
    let session = suite_runner.finish();
    session.report(notices);

    if session.failed > 0 {
        return Err(MakeError::TestsFailed {
            failed: session.failed,
        });
    }
    Ok(())
}
