//! Validation and path resolution for the pipeline command.

use std::path::{Component, Path, PathBuf};

use jobboard_core::PipelineConfig;

use crate::error::{PipelineError, Result};

/// The three pipeline settings, all known to be present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    pub executable: String,
    pub script_path: String,
    pub working_directory: String,
}

/// A fully resolved invocation: `program script` run inside `working_dir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCommand {
    pub program: PathBuf,
    pub script: PathBuf,
    pub working_dir: PathBuf,
}

impl PipelineSettings {
    /// Take the settings out of `config`, failing with the names of every
    /// key that is absent or blank.
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let mut missing = Vec::new();
        let mut take = |name: &str, value: &Option<String>| match value {
            Some(v) if !v.trim().is_empty() => v.clone(),
            _ => {
                missing.push(name.to_string());
                String::new()
            }
        };

        let executable = take("executable", &config.executable);
        let script_path = take("script_path", &config.script_path);
        let working_directory = take("working_directory", &config.working_directory);

        if !missing.is_empty() {
            return Err(PipelineError::MissingSettings { missing });
        }
        Ok(Self {
            executable,
            script_path,
            working_directory,
        })
    }

    /// Resolve against the gateway's current directory.
    pub fn resolve(&self) -> Result<ResolvedCommand> {
        let cwd = std::env::current_dir().map_err(PipelineError::CurrentDir)?;
        Ok(self.resolve_in(&cwd))
    }

    /// Resolve against `base`.
    ///
    /// The working directory is made absolute first; executable and script
    /// are joined onto it, so absolute values pass through unchanged. No
    /// filesystem access happens here.
    pub fn resolve_in(&self, base: &Path) -> ResolvedCommand {
        let working_dir = normalize(&base.join(&self.working_directory));
        ResolvedCommand {
            program: normalize(&working_dir.join(&self.executable)),
            script: normalize(&working_dir.join(&self.script_path)),
            working_dir,
        }
    }
}

/// Lexically remove `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
