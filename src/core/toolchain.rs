//! RM-004: Command lines for the external collaborators.
//!
//! Builds, but never launches, the toolchain, generator, compiler and
//! debugger invocations. Launching is the dispatcher's job.

use super::types::{Profile, Project};
use crate::process::CommandLine;

impl Project {
    fn toolchain(&self) -> CommandLine {
        CommandLine::new(&self.config.toolchain).current_dir(&self.root)
    }

    /// Typecheck form: `<toolchain> check <tail...>`.
    pub fn check_command(&self, tail: &[String]) -> CommandLine {
        self.toolchain().arg("check").args(tail)
    }

    /// Full compile form: `<toolchain> build [--release]`.
    pub fn compile_command(&self, profile: Profile) -> CommandLine {
        let cmd = self.toolchain().arg("build");
        if profile.is_release() {
            cmd.arg("--release")
        } else {
            cmd
        }
    }

    /// Compiler unit tests: `<toolchain> test`.
    pub fn unit_test_command(&self) -> CommandLine {
        self.toolchain().arg("test")
    }

    /// `<toolchain> run --bin <generator> --`. The artifact appends its own
    /// `-o <target> <source>` when it runs the generator. The generator is
    /// built by the same toolchain, hence the bootstrap placeholder.
    pub fn generator_command(&self) -> CommandLine {
        self.toolchain()
            .args(["run", "--bin", self.config.generator.as_str(), "--"])
    }

    /// The compiled compiler with the forwarded tail.
    pub fn run_command(&self, profile: Profile, tail: &[String]) -> CommandLine {
        CommandLine::new(self.compiler_path(profile)).args(tail)
    }

    /// `<debugger> --args <compiler> -- <tail...>`
    pub fn debug_command(&self, profile: Profile, tail: &[String]) -> CommandLine {
        CommandLine::new(&self.config.debugger)
            .arg("--args")
            .arg(self.compiler_path(profile))
            .arg("--")
            .args(tail)
    }
}
