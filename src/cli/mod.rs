//! RM-040: Command-line surface: leading options, then mode and tail.
//!
//! clap owns only the options that may precede the mode token. The mode
//! token and everything after it are captured raw and handed to
//! [`Invocation::from_args`], so the tail reaches the toolchain or the
//! compiler exactly as typed.

use crate::core::dispatcher::Dispatcher;
use crate::core::error::MakeError;
use crate::core::parser;
use crate::core::types::Invocation;
use crate::notice::Notices;
use crate::process::SystemRunner;
use clap::Parser;
use std::path::PathBuf;
use termcolor::WriteColor;

#[derive(Parser, Debug)]
#[command(
    name = "rustiny-make",
    version,
    about = "Build orchestrator for the RusTiny compiler",
    after_help = "MODES:\n  rules   Regenerate the instruction selection rules\n  check   Typecheck, forwarding ARGS to the toolchain\n  build   Build the compiler (default)\n  run     Build, then run the compiler with ARGS\n  debug   Build, then run the compiler with ARGS under the debugger\n  test    Build, then run test suites (ARGS: internal,compile-fail,run-pass,ir,asm)"
)]
pub struct Cli {
    /// Build with the release profile
    #[arg(long)]
    pub release: bool,

    /// Project root (default: current directory)
    #[arg(long, env = "RUSTINY_ROOT", value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Project config file (default: <root>/rustiny-make.yaml, if present)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Mode, followed by arguments forwarded verbatim
    #[arg(
        value_name = "MODE [ARGS]...",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,
}

impl Cli {
    pub fn invocation(&self) -> Result<Invocation, MakeError> {
        Invocation::from_args(self.release, self.command.iter().cloned())
    }

    fn project_root(&self) -> Result<PathBuf, MakeError> {
        match self.root {
            Some(ref root) => Ok(root.clone()),
            None => std::env::current_dir().map_err(|e| MakeError::io(".", e)),
        }
    }
}

/// Parse the mode, load the project, and run every stage.
pub fn dispatch<W: WriteColor>(cli: &Cli, notices: &mut Notices<W>) -> Result<(), MakeError> {
    let invocation = cli.invocation().inspect_err(|e| {
        if let MakeError::UnknownMode(mode) = e {
            notices.failure(&format!("Unexpected mode: {}", mode));
        }
    })?;
    let root = cli.project_root()?;
    let project = parser::load_project(&root, cli.config.as_deref())?;

    let mut runner = SystemRunner;
    Dispatcher::new(&project, &mut runner, notices).dispatch(&invocation)
}
