//! RM-033: Suite execution: discover tests, compile them, judge the output.

use super::expect::{self, Diagnostic};
use super::session::{FailedTest, Mismatch, Session};
use super::Suite;
use crate::core::error::{MakeError, Stage};
use crate::core::types::{Profile, Project};
use crate::notice::Notices;
use crate::process::{CommandLine, ExecOutput, Runner};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use termcolor::WriteColor;

/// Exit status of a panicking compiler.
const PANIC_EXIT: i32 = 101;

pub struct SuiteRunner<'a, R, W> {
    project: &'a Project,
    compiler: PathBuf,
    tests_dir: PathBuf,
    runner: &'a mut R,
    notices: &'a mut Notices<W>,
    session: Session,
}

impl<'a, R: Runner, W: WriteColor> SuiteRunner<'a, R, W> {
    pub fn new(
        project: &'a Project,
        profile: Profile,
        runner: &'a mut R,
        notices: &'a mut Notices<W>,
    ) -> Self {
        Self {
            project,
            compiler: project.compiler_path(profile),
            tests_dir: project.tests_dir(),
            runner,
            notices,
            session: Session::default(),
        }
    }

    pub fn run(&mut self, suite: Suite) -> Result<(), MakeError> {
        self.notices.stage(&format!("Running {}...", suite.title()));
        match suite {
            Suite::Internal => self.internal(),
            Suite::CompileFail => self.compile_fail(),
            Suite::RunPass => self.run_pass(),
            Suite::Ir => self.emit("ir", "ir", "IR"),
            Suite::Asm => self.emit("asm", "s", "ASM"),
        }
    }

    pub fn finish(self) -> Session {
        self.session
    }

    /// Toolchain unit tests. A failure here ends the whole run.
    fn internal(&mut self) -> Result<(), MakeError> {
        let cmd = self.project.unit_test_command();
        let status = self.runner.status(&cmd).map_err(|source| MakeError::Spawn {
            stage: Stage::Toolchain,
            program: cmd.program_lossy(),
            source,
        })?;
        if status != 0 {
            self.notices.failure("Compiler unit tests failed!");
            return Err(MakeError::Toolchain { status });
        }
        Ok(())
    }

    fn compile_fail(&mut self) -> Result<(), MakeError> {
        for (name, test) in collect_categorized(&self.tests_dir.join("compile-fail"))? {
            let Some(source) = self.begin(&name, &test)? else {
                continue;
            };
            let expected: BTreeSet<Diagnostic> =
                expect::parse_expectations(&source).into_iter().collect();
            let result = self.compile(&test, &[])?;
            let output = result.combined();

            if result.exit_code == 0 {
                let failure = FailedTest::new(&test)
                    .message("compiling succeeded")
                    .output(output);
                self.session.failure(self.notices, failure);
                continue;
            }
            if result.exit_code == PANIC_EXIT {
                let failure = FailedTest::new(&test)
                    .message("compiler panicked")
                    .output(output);
                self.session.failure(self.notices, failure);
                continue;
            }

            let (errors, rest) = expect::parse_output(&output);
            let reported: BTreeSet<Diagnostic> = errors.into_iter().collect();
            let unexpected: Vec<_> = reported.difference(&expected).cloned().collect();
            let missing: Vec<_> = expected.difference(&reported).cloned().collect();

            if unexpected.is_empty() && missing.is_empty() {
                self.session.success(self.notices);
            } else {
                let mut failure = FailedTest::new(&test).output(rest.join("\n"));
                failure.unexpected = unexpected;
                failure.missing = missing;
                self.session.failure(self.notices, failure);
            }
        }
        Ok(())
    }

    fn run_pass(&mut self) -> Result<(), MakeError> {
        for (name, test) in collect_categorized(&self.tests_dir.join("run-pass"))? {
            if self.begin(&name, &test)?.is_none() {
                continue;
            }
            let result = self.compile(&test, &[])?;
            let (errors, rest) = expect::parse_output(&result.combined());

            if errors.is_empty() && result.success() {
                self.session.success(self.notices);
            } else {
                let mut failure = FailedTest::new(&test).output(rest.join("\n"));
                failure.unexpected = errors;
                self.session.failure(self.notices, failure);
            }
        }
        Ok(())
    }

    /// Compile with `--target <target>` and compare against `<stem>.<ext>`.
    fn emit(&mut self, target: &str, ext: &str, what: &'static str) -> Result<(), MakeError> {
        let dir = self.tests_dir.join(target);
        for test in collect_sources(&dir)? {
            let name = file_name(&test);
            if self.begin(&name, &test)?.is_none() {
                continue;
            }
            let result = self.compile(&test, &["--target", target])?;
            if !result.success() {
                let failure = FailedTest::new(&test)
                    .message("compiling failed")
                    .output(result.combined());
                self.session.failure(self.notices, failure);
                continue;
            }

            let expected_path = test.with_extension(ext);
            let expected = match std::fs::read_to_string(&expected_path) {
                Ok(text) => text,
                Err(e) => {
                    let failure = FailedTest::new(&test).message(format!(
                        "cannot read {}: {}",
                        expected_path.display(),
                        e
                    ));
                    self.session.failure(self.notices, failure);
                    continue;
                }
            };

            let generated = result.combined();
            if generated.trim() == expected.trim() {
                self.session.success(self.notices);
            } else {
                let mut failure = FailedTest::new(&test);
                failure.mismatch = Some(Mismatch {
                    what,
                    expected: expected.trim().to_string(),
                    generated: generated.trim().to_string(),
                });
                self.session.failure(self.notices, failure);
            }
        }
        Ok(())
    }

    /// Print the progress prefix and read the test. `None` means skipped.
    fn begin(&mut self, name: &str, test: &Path) -> Result<Option<String>, MakeError> {
        self.session.start(self.notices, name);
        let source = std::fs::read_to_string(test).map_err(|e| MakeError::io(test, e))?;
        if expect::is_skipped(&source) {
            self.session.skip(self.notices);
            return Ok(None);
        }
        Ok(Some(source))
    }

    /// `<compiler> [extra...] <test>` from the tests directory, colors off.
    fn compile(&mut self, test: &Path, extra: &[&str]) -> Result<ExecOutput, MakeError> {
        let cmd = CommandLine::new(&self.compiler)
            .args(extra)
            .arg(test)
            .current_dir(&self.tests_dir)
            .env("COLORED_OUTPUT", "off");
        self.runner.capture(&cmd).map_err(|source| MakeError::Spawn {
            stage: Stage::Process,
            program: cmd.program_lossy(),
            source,
        })
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn glob_files(pattern: &str) -> Result<Vec<PathBuf>, MakeError> {
    let paths = glob::glob(pattern)
        .map_err(|e| MakeError::Config(format!("bad test pattern {}: {}", pattern, e)))?;
    let mut files: Vec<PathBuf> = paths
        .filter_map(Result::ok)
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    Ok(files)
}

fn pattern_in(dir: &Path, rest: &str) -> String {
    format!("{}/{}", glob::Pattern::escape(&dir.to_string_lossy()), rest)
}

/// `<dir>/<category>/<test>` pairs as ("category/test", path), sorted.
pub fn collect_categorized(dir: &Path) -> Result<Vec<(String, PathBuf)>, MakeError> {
    if !dir.is_dir() {
        log::warn!("test directory {} does not exist", dir.display());
        return Ok(Vec::new());
    }
    let files = glob_files(&pattern_in(dir, "*/*"))?;
    Ok(files
        .into_iter()
        .map(|path| {
            let category = path.parent().map(file_name).unwrap_or_default();
            (format!("{}/{}", category, file_name(&path)), path)
        })
        .collect())
}

/// `<dir>/*.rs`, sorted.
pub fn collect_sources(dir: &Path) -> Result<Vec<PathBuf>, MakeError> {
    if !dir.is_dir() {
        log::warn!("test directory {} does not exist", dir.display());
        return Ok(Vec::new());
    }
    glob_files(&pattern_in(dir, "*.rs"))
}
