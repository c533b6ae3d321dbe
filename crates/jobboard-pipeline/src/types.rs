//! Shared data types for jobboard-pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// Opaque identifier for one pipeline run.
///
/// A thin wrapper around a UUID string, attached to every log line the run
/// produces so interleaved output can be correlated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    /// Generate a fresh random run ID (UUIDv4).
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// TriggerOutcome
// ---------------------------------------------------------------------------

/// Synchronous answer to a trigger request.
///
/// Only says whether the run was accepted to start; how it ends is visible
/// through [`RunStatus`] and the logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// The lock was free; the run is now in flight.
    Accepted { run_id: RunId },
    /// Another run holds the lock. Nothing was started.
    Conflict,
}

impl TriggerOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, TriggerOutcome::Accepted { .. })
    }
}

// ---------------------------------------------------------------------------
// RunState / RunOutcome / RunRecord / RunStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Running,
}

/// How a finished run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RunOutcome {
    /// The process ran and exited. `exit_code` is absent when it was
    /// terminated by a signal.
    Exited {
        exit_code: Option<i32>,
        stdout_lines: u64,
        stderr_lines: u64,
    },

    /// One or more settings were missing; no process was started.
    ConfigMissing { missing: Vec<String> },

    /// The process could not be spawned.
    LaunchFailed { error: String },

    /// Waiting on the process failed after it was spawned.
    WaitFailed { error: String },

    /// The background task ended without recording an outcome (panic).
    Aborted,
}

/// One pipeline run, from acceptance to release of the lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    /// Set when the lock is released.
    pub finished_at: Option<DateTime<Utc>>,
    /// Set when the lock is released.
    pub outcome: Option<RunOutcome>,
}

impl RunRecord {
    pub(crate) fn start(run_id: RunId) -> Self {
        Self {
            run_id,
            started_at: Utc::now(),
            finished_at: None,
            outcome: None,
        }
    }
}

/// Observable snapshot of the trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatus {
    pub state: RunState,
    /// The in-flight run, while `state` is `Running`.
    pub current: Option<RunRecord>,
    /// The most recently finished run.
    pub last: Option<RunRecord>,
}

impl Default for RunStatus {
    fn default() -> Self {
        Self {
            state: RunState::Idle,
            current: None,
            last: None,
        }
    }
}
