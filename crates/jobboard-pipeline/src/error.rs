//! Error types for the jobboard-pipeline crate.

use thiserror::Error;

/// Everything that can end a pipeline run early.
///
/// None of these reach the HTTP caller that triggered the run; they are
/// logged and recorded in the run's outcome.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// One or more of the required settings is absent or blank.
    #[error("pipeline settings missing: {}", missing.join(", "))]
    MissingSettings { missing: Vec<String> },

    /// The gateway's own working directory could not be determined.
    #[error("cannot determine current directory: {0}")]
    CurrentDir(#[source] std::io::Error),

    /// Spawning the child process failed.
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting for the child process to exit failed.
    #[error("failed waiting for pipeline process: {0}")]
    Wait(#[source] std::io::Error),
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, PipelineError>;
