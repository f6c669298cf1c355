//! RM-001: Core types: modes, build profiles, invocations, project layout.
//!
//! Defines the YAML schema for `rustiny-make.yaml` and the in-process types
//! the dispatcher works with. Nothing here touches the filesystem.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::error::MakeError;

// ============================================================================
// Modes
// ============================================================================

/// Operator-facing mode selected by the first token after the leading options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Force regeneration of the rule table, nothing else.
    Rules,
    /// Typecheck through the toolchain with the forwarded tail.
    Check,
    /// Full compile.
    Build,
    /// Full compile, then run the compiler binary with the tail.
    Run,
    /// Full compile, then run the compiler binary under the debugger.
    Debug,
    /// Full compile, then run the test suites.
    Test,
}

impl Mode {
    pub const ALL: [Mode; 6] = [
        Mode::Rules,
        Mode::Check,
        Mode::Build,
        Mode::Run,
        Mode::Debug,
        Mode::Test,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rules => "rules",
            Self::Check => "check",
            Self::Build => "build",
            Self::Run => "run",
            Self::Debug => "debug",
            Self::Test => "test",
        }
    }

    /// Whether this mode needs a full compile of the compiler binary.
    pub fn compiles(self) -> bool {
        matches!(self, Self::Build | Self::Run | Self::Debug | Self::Test)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = MakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| MakeError::UnknownMode(s.to_string()))
    }
}

// ============================================================================
// Build profile
// ============================================================================

/// Toolchain build profile. Only affects target paths and compile flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    #[default]
    Debug,
    Release,
}

impl Profile {
    pub fn from_release(release: bool) -> Self {
        if release {
            Self::Release
        } else {
            Self::Debug
        }
    }

    pub fn is_release(self) -> bool {
        self == Self::Release
    }

    /// Directory name under `target/`.
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }
}

// ============================================================================
// Invocation
// ============================================================================

/// A fully parsed request: what to do, with which profile, and the opaque tail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub mode: Mode,
    pub profile: Profile,
    /// Forwarded verbatim; never inspected except by `test` for its suite list.
    pub tail: Vec<String>,
}

impl Invocation {
    /// Second parsing stage: the leading options are already consumed, `args`
    /// starts at the mode token. No mode token means `build` with an empty tail.
    pub fn from_args<I>(release: bool, args: I) -> Result<Self, MakeError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let mode = match args.next() {
            Some(token) => token.parse()?,
            None => Mode::Build,
        };
        Ok(Self {
            mode,
            profile: Profile::from_release(release),
            tail: args.collect(),
        })
    }
}

impl Default for Invocation {
    fn default() -> Self {
        Self {
            mode: Mode::Build,
            profile: Profile::Debug,
            tail: Vec::new(),
        }
    }
}

// ============================================================================
// rustiny-make.yaml
// ============================================================================

/// Project layout and external program names. Every field has a default, so
/// an absent or empty file describes the stock RusTiny layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Build toolchain program
    #[serde(default = "default_toolchain")]
    pub toolchain: String,

    /// Compiler binary name (without host suffix)
    #[serde(default = "default_compiler")]
    pub compiler: String,

    /// Rule generator binary, built and run through the toolchain
    #[serde(default = "default_generator")]
    pub generator: String,

    /// Debugger wrapping the compiler in `debug` mode
    #[serde(default = "default_debugger")]
    pub debugger: String,

    /// Instruction selection rule files
    #[serde(default)]
    pub rules: RulesConfig,

    /// Test suite root
    #[serde(default = "default_tests_dir")]
    pub tests_dir: PathBuf,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            toolchain: default_toolchain(),
            compiler: default_compiler(),
            generator: default_generator(),
            debugger: default_debugger(),
            rules: RulesConfig::default(),
            tests_dir: default_tests_dir(),
        }
    }
}

/// Paths of the hand-written rules, the bootstrap placeholder and the
/// generated table, relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RulesConfig {
    #[serde(default = "default_rules_source")]
    pub source: PathBuf,
    #[serde(default = "default_rules_placeholder")]
    pub placeholder: PathBuf,
    #[serde(default = "default_rules_target")]
    pub target: PathBuf,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            source: default_rules_source(),
            placeholder: default_rules_placeholder(),
            target: default_rules_target(),
        }
    }
}

fn default_toolchain() -> String {
    "cargo".to_string()
}

fn default_compiler() -> String {
    "rustiny".to_string()
}

fn default_generator() -> String {
    "rustiny-rulecomp".to_string()
}

fn default_debugger() -> String {
    "gdb".to_string()
}

fn default_rules_source() -> PathBuf {
    PathBuf::from("src/back/instsel/rules.ins.rs")
}

fn default_rules_placeholder() -> PathBuf {
    PathBuf::from("src/back/instsel/rules.dummy.rs")
}

fn default_rules_target() -> PathBuf {
    PathBuf::from("src/back/instsel/rules.rs")
}

fn default_tests_dir() -> PathBuf {
    PathBuf::from("tests")
}

// ============================================================================
// Resolved project
// ============================================================================

/// The generated rule table and the two files it is derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifact {
    /// Hand-written rule definitions
    pub source: PathBuf,
    /// Minimal valid stand-in for `target`
    pub placeholder: PathBuf,
    /// File the toolchain compiles
    pub target: PathBuf,
}

/// A project root plus its configuration, with all paths resolved.
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub config: ProjectConfig,
}

impl Project {
    pub fn new(root: impl Into<PathBuf>, config: ProjectConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    pub fn rules(&self) -> GeneratedArtifact {
        GeneratedArtifact {
            source: self.resolve(&self.config.rules.source),
            placeholder: self.resolve(&self.config.rules.placeholder),
            target: self.resolve(&self.config.rules.target),
        }
    }

    /// Location of the compiled compiler binary. Pure in `profile`.
    pub fn compiler_path(&self, profile: Profile) -> PathBuf {
        compiled_binary_path(&self.root, profile, &self.config.compiler)
    }

    pub fn tests_dir(&self) -> PathBuf {
        self.resolve(&self.config.tests_dir)
    }
}

/// `<root>/target/<profile>/<name><EXE_SUFFIX>`
pub fn compiled_binary_path(root: &Path, profile: Profile, name: &str) -> PathBuf {
    root.join("target")
        .join(profile.dir_name())
        .join(format!("{}{}", name, std::env::consts::EXE_SUFFIX))
}
