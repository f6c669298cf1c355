//! RM-002: Error taxonomy and exit-status mapping.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Exit status used when a stage's process cannot be launched at all.
pub const SPAWN_FAILURE_EXIT: i32 = 127;

/// Exit status for command-line usage errors.
pub const USAGE_EXIT: i32 = 2;

/// The pipeline step a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Rules,
    Toolchain,
    Process,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rules => write!(f, "rule generation"),
            Self::Toolchain => write!(f, "toolchain invocation"),
            Self::Process => write!(f, "spawned process"),
        }
    }
}

#[derive(Debug, Error)]
pub enum MakeError {
    #[error("rule generation failed with exit status {status}")]
    Generation { status: i32 },

    #[error("toolchain failed with exit status {status}")]
    Toolchain { status: i32 },

    #[error("process exited with status {status}")]
    Execution { status: i32 },

    #[error("cannot launch `{program}` ({stage}): {source}")]
    Spawn {
        stage: Stage,
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error("unknown mode '{0}' (expected one of: rules, check, build, run, debug, test)")]
    UnknownMode(String),

    #[error("unknown test suite '{0}' (expected one of: internal, compile-fail, run-pass, ir, asm)")]
    UnknownSuite(String),

    #[error("{failed} test(s) failed")]
    TestsFailed { failed: usize },
}

impl MakeError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Status the whole invocation terminates with.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Generation { status }
            | Self::Toolchain { status }
            | Self::Execution { status } => *status,
            Self::Spawn { .. } => SPAWN_FAILURE_EXIT,
            Self::UnknownMode(_) | Self::UnknownSuite(_) => USAGE_EXIT,
            Self::Io { .. } | Self::Config(_) | Self::TestsFailed { .. } => 1,
        }
    }

    /// The stage this error is attributed to, if it came from one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Generation { .. } => Some(Stage::Rules),
            Self::Toolchain { .. } => Some(Stage::Toolchain),
            Self::Execution { .. } => Some(Stage::Process),
            Self::Spawn { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
