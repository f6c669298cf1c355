//! RM-006: Mode dispatcher. Sequences rule generation, toolchain, and
//! execution stages.
//!
//! rules → [check | compile → (run | debug | test)]
//!
//! Each stage runs only if every earlier one succeeded. The first failure
//! gets a red notice naming the stage and is returned as a [`MakeError`]
//! carrying the exit status the process should terminate with.

use super::error::{MakeError, Stage};
use super::freshness::Staleness;
use super::types::{Invocation, Mode, Profile, Project};
use crate::harness;
use crate::notice::Notices;
use crate::process::{CommandLine, Runner};
use termcolor::WriteColor;

pub struct Dispatcher<'a, R, W> {
    project: &'a Project,
    runner: &'a mut R,
    notices: &'a mut Notices<W>,
}

impl<'a, R: Runner, W: WriteColor> Dispatcher<'a, R, W> {
    pub fn new(project: &'a Project, runner: &'a mut R, notices: &'a mut Notices<W>) -> Self {
        Self {
            project,
            runner,
            notices,
        }
    }

    /// Execute an invocation. `Ok(())` means every stage exited 0.
    pub fn dispatch(&mut self, inv: &Invocation) -> Result<(), MakeError> {
        log::info!(
            "mode={} profile={} tail={:?}",
            inv.mode,
            inv.profile.dir_name(),
            inv.tail
        );

        // Validate the suite list before anything is built.
        let suites = match inv.mode {
            Mode::Test => {
                if inv.tail.len() > 1 {
                    log::debug!("test ignores trailing arguments {:?}", &inv.tail[1..]);
                }
                Some(harness::parse_suites(inv.tail.first().map(String::as_str))?)
            }
            _ => None,
        };

        self.build_rules(inv.mode == Mode::Rules)?;

        match inv.mode {
            Mode::Rules => Ok(()),
            Mode::Check => {
                let cmd = self.project.check_command(&inv.tail);
                self.notices.running(&cmd);
                let status = self.spawn(Stage::Toolchain, &cmd)?;
                self.finish(Stage::Toolchain, status)
            }
            Mode::Build => {
                if !inv.tail.is_empty() {
                    log::debug!("build ignores trailing arguments {:?}", inv.tail);
                }
                self.build_compiler(inv.profile)
            }
            Mode::Run => {
                self.build_compiler(inv.profile)?;
                let cmd = self.project.run_command(inv.profile, &inv.tail);
                self.execute(&cmd)
            }
            Mode::Debug => {
                self.build_compiler(inv.profile)?;
                let cmd = self.project.debug_command(inv.profile, &inv.tail);
                self.execute(&cmd)
            }
            Mode::Test => {
                self.build_compiler(inv.profile)?;
                let suites = suites.unwrap_or_default();
                harness::run_suites(self.project, inv.profile, self.runner, self.notices, &suites)
            }
        }
    }

    /// Rule table freshness check and, if needed, regeneration.
    fn build_rules(&mut self, force: bool) -> Result<(), MakeError> {
        self.notices
            .stage_inline("Building instruction selection rules...");
        let rules = self.project.rules();
        let generator = self.project.generator_command();

        match rules.ensure_fresh(force, &mut *self.runner, &generator) {
            Ok(Staleness::Fresh) => {
                self.notices.done("Done");
                Ok(())
            }
            Ok(staleness) => {
                log::info!("regenerated {} ({:?})", rules.target.display(), staleness);
                Ok(())
            }
            Err(e) => {
                self.notices.failure("Building rules failed");
                Err(e)
            }
        }
    }

    /// Full compile form of the toolchain.
    fn build_compiler(&mut self, profile: Profile) -> Result<(), MakeError> {
        self.notices.stage("Building compiler...");
        let cmd = self.project.compile_command(profile);
        let status = self.spawn(Stage::Toolchain, &cmd)?;
        self.finish(Stage::Toolchain, status)
    }

    /// Launch the compiled binary (or the debugger around it).
    fn execute(&mut self, cmd: &CommandLine) -> Result<(), MakeError> {
        self.notices.running(cmd);
        let status = self.spawn(Stage::Process, cmd)?;
        self.finish(Stage::Process, status)
    }

    fn spawn(&mut self, stage: Stage, cmd: &CommandLine) -> Result<i32, MakeError> {
        log::debug!("{}: {}", stage, cmd);
        self.runner.status(cmd).map_err(|source| {
            self.notices
                .failure(&format!("Cannot launch '{}': {}", cmd.program_lossy(), source));
            MakeError::Spawn {
                stage,
                program: cmd.program_lossy(),
                source,
            }
        })
    }

    fn finish(&mut self, stage: Stage, status: i32) -> Result<(), MakeError> {
        if status == 0 {
            return Ok(());
        }
        let err = match stage {
            Stage::Rules => MakeError::Generation { status },
            Stage::Toolchain => MakeError::Toolchain { status },
            Stage::Process => MakeError::Execution { status },
        };
        self.notices
            .failure(&format!("Error: {} exited with status {}", stage, status));
        Err(err)
    }
}
