//! RM-003: rustiny-make.yaml parsing and validation.
//!
//! The config file is optional. Validation checks structural constraints:
//! - Program names must not be empty
//! - The three rule paths must be pairwise distinct

use super::error::MakeError;
use super::types::*;
use std::path::Path;

/// Default config file name, looked up in the project root.
pub const CONFIG_FILE: &str = "rustiny-make.yaml";

/// Validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Parse a config file from disk.
pub fn parse_config_file(path: &Path) -> Result<ProjectConfig, MakeError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| MakeError::Config(format!("failed to read {}: {}", path.display(), e)))?;
    parse_config(&content)
}

/// Parse a config from a string. An empty document yields the defaults.
pub fn parse_config(yaml: &str) -> Result<ProjectConfig, MakeError> {
    if yaml.trim().is_empty() {
        return Ok(ProjectConfig::default());
    }
    serde_yaml_ng::from_str(yaml).map_err(|e| MakeError::Config(format!("YAML parse error: {}", e)))
}

/// Validate a parsed config. Returns a list of errors (empty = valid).
pub fn validate_config(config: &ProjectConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for (field, value) in [
        ("toolchain", &config.toolchain),
        ("compiler", &config.compiler),
        ("generator", &config.generator),
        ("debugger", &config.debugger),
    ] {
        if value.trim().is_empty() {
            errors.push(ValidationError {
                message: format!("{} must not be empty", field),
            });
        }
    }

    let rules = &config.rules;
    for (a, pa, b, pb) in [
        ("source", &rules.source, "target", &rules.target),
        ("placeholder", &rules.placeholder, "target", &rules.target),
        ("source", &rules.source, "placeholder", &rules.placeholder),
    ] {
        if pa == pb {
            errors.push(ValidationError {
                message: format!(
                    "rules.{} and rules.{} must differ (both are {})",
                    a,
                    b,
                    pa.display()
                ),
            });
        }
    }

    errors
}

/// Load the project at `root`. An explicit `config` path must exist; the
/// default `rustiny-make.yaml` is used only if present.
pub fn load_project(root: &Path, config: Option<&Path>) -> Result<Project, MakeError> {
    let parsed = match config {
        Some(path) => {
            log::debug!("loading config {}", path.display());
            parse_config_file(path)?
        }
        None => {
            let default = root.join(CONFIG_FILE);
            if default.is_file() {
                log::debug!("loading config {}", default.display());
                parse_config_file(&default)?
            } else {
                log::debug!("no {} in {}, using defaults", CONFIG_FILE, root.display());
                ProjectConfig::default()
            }
        }
    };

    let errors = validate_config(&parsed);
    if !errors.is_empty() {
        let joined = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(MakeError::Config(joined));
    }

    Ok(Project::new(root, parsed))
}
