//! `PipelineRunner`: the single-slot guard around pipeline runs.
//!
//! The lock is a one-permit [`Semaphore`]. `trigger` takes the permit with
//! `try_acquire_owned`, so a busy runner answers `Conflict` without waiting,
//! and moves the permit into the detached task that performs the run. The
//! permit lives inside a [`RunGuard`] whose `Drop` releases it, which covers
//! early returns, errors, and panics alike.

use std::sync::Arc;

use chrono::Utc;
use jobboard_core::PipelineConfig;
use tokio::sync::{watch, OwnedSemaphorePermit, Semaphore};
use tracing::{error, info, warn};

use crate::process;
use crate::settings::PipelineSettings;
use crate::types::{RunId, RunOutcome, RunRecord, RunState, RunStatus, TriggerOutcome};

/// Serializes pipeline runs: at most one in flight per runner.
///
/// Construct one per process and share it behind an `Arc`.
pub struct PipelineRunner {
    config: PipelineConfig,
    lock: Arc<Semaphore>,
    status: Arc<watch::Sender<RunStatus>>,
}

impl PipelineRunner {
    pub fn new(config: PipelineConfig) -> Self {
        let (status, _) = watch::channel(RunStatus::default());
        Self {
            config,
            lock: Arc::new(Semaphore::new(1)),
            status: Arc::new(status),
        }
    }

    /// Start a run unless one is already in flight.
    ///
    /// Returns as soon as the lock decision is made; the run itself happens
    /// on a spawned task that this call never awaits. Must be called from
    /// within a Tokio runtime.
    pub fn trigger(&self) -> TriggerOutcome {
        let Some(guard) = self.begin_run() else {
            warn!("pipeline is already running, another run cannot be started");
            return TriggerOutcome::Conflict;
        };

        let run_id = guard.record.run_id.clone();
        info!(run_id = %run_id, "acquired pipeline lock, starting background run");
        tokio::spawn(execute(guard, self.config.clone()));

        TriggerOutcome::Accepted { run_id }
    }

    /// Take the lock and publish a fresh running record, or `None` if busy.
    fn begin_run(&self) -> Option<RunGuard> {
        let permit = Arc::clone(&self.lock).try_acquire_owned().ok()?;

        let record = RunRecord::start(RunId::new());
        self.status.send_modify(|s| {
            s.state = RunState::Running;
            s.current = Some(record.clone());
        });

        Some(RunGuard {
            permit: Some(permit),
            status: Arc::clone(&self.status),
            record,
        })
    }

    /// Snapshot of the current state and the last finished run.
    pub fn status(&self) -> RunStatus {
        RunStatus::clone(&self.status.borrow())
    }

    /// Receiver that observes every status transition.
    pub fn subscribe(&self) -> watch::Receiver<RunStatus> {
        self.status.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.lock.available_permits() == 0
    }
}

/// Body of one run. Never returns an error: every failure is logged and
/// stored as the run's outcome.
async fn execute(mut guard: RunGuard, config: PipelineConfig) {
    let run_id = guard.record.run_id.clone();

    let settings = match PipelineSettings::from_config(&config) {
        Ok(s) => s,
        Err(crate::PipelineError::MissingSettings { missing }) => {
            error!(
                run_id = %run_id,
                missing = %missing.join(", "),
                "pipeline settings are missing, cannot start pipeline"
            );
            guard.finish(RunOutcome::ConfigMissing { missing });
            return;
        }
        Err(e) => {
            error!(run_id = %run_id, error = %e, "invalid pipeline settings");
            guard.finish(RunOutcome::LaunchFailed {
                error: e.to_string(),
            });
            return;
        }
    };

    let cmd = match settings.resolve() {
        Ok(cmd) => cmd,
        Err(e) => {
            error!(run_id = %run_id, error = %e, "cannot resolve pipeline paths");
            guard.finish(RunOutcome::LaunchFailed {
                error: e.to_string(),
            });
            return;
        }
    };

    match process::run_to_exit(&run_id, &cmd).await {
        Ok(outcome) => guard.finish(outcome),
        Err(e @ crate::PipelineError::Wait(_)) => {
            error!(run_id = %run_id, error = %e, "pipeline execution failed");
            guard.finish(RunOutcome::WaitFailed {
                error: e.to_string(),
            });
        }
        Err(e) => {
            error!(run_id = %run_id, error = %e, "pipeline execution failed");
            guard.finish(RunOutcome::LaunchFailed {
                error: e.to_string(),
            });
        }
    }
}

/// Owns the lock for the duration of one run.
struct RunGuard {
    permit: Option<OwnedSemaphorePermit>,
    status: Arc<watch::Sender<RunStatus>>,
    record: RunRecord,
}

impl RunGuard {
    fn finish(&mut self, outcome: RunOutcome) {
        self.record.outcome = Some(outcome);
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        let mut record = self.record.clone();
        record.finished_at = Some(Utc::now());
        if record.outcome.is_none() {
            record.outcome = Some(RunOutcome::Aborted);
        }
        let run_id = record.run_id.clone();

        // Permit first: anyone who sees Idle must be able to acquire.
        drop(self.permit.take());

        self.status.send_modify(|s| {
            // A newer run may already hold the lock; leave it in place.
            if s.current.as_ref().map(|c| &c.run_id) == Some(&run_id) {
                s.state = RunState::Idle;
                s.current = None;
            }
            // A newer run may also have finished in between.
            if s
                .last
                .as_ref()
                .map_or(true, |l| l.finished_at <= record.finished_at)
            {
                s.last = Some(record);
            }
        });
        info!(run_id = %run_id, "pipeline lock released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wait_idle(runner: &PipelineRunner) -> impl std::future::Future<Output = RunStatus> {
        let mut rx = runner.subscribe();
        async move {
            let status = tokio::time::timeout(
                std::time::Duration::from_secs(10),
                rx.wait_for(|s| s.state == RunState::Idle),
            )
            .await
            .expect("run did not finish in time")
            .expect("status channel closed");
            RunStatus::clone(&status)
        }
    }

    #[tokio::test]
    async fn missing_settings_still_accepts_then_releases() {
        let runner = PipelineRunner::new(PipelineConfig {
            executable: Some("python".to_string()),
            script_path: Some("run.py".to_string()),
            working_directory: None,
        });

        assert!(runner.trigger().is_accepted());
        let status = wait_idle(&runner).await;

        let last = status.last.expect("finished run recorded");
        assert_eq!(
            last.outcome,
            Some(RunOutcome::ConfigMissing {
                missing: vec!["working_directory".to_string()]
            })
        );
        assert!(last.finished_at.is_some());
        assert!(!runner.is_running());
        assert!(runner.trigger().is_accepted());
        wait_idle(&runner).await;
    }

    #[tokio::test]
    async fn empty_config_reports_every_missing_key() {
        let runner = PipelineRunner::new(PipelineConfig::default());
        runner.trigger();
        let status = wait_idle(&runner).await;
        match status.last.and_then(|r| r.outcome) {
            Some(RunOutcome::ConfigMissing { missing }) => assert_eq!(missing.len(), 3),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn launch_failure_releases_lock() {
        let dir = tempfile::tempdir().unwrap();
        let runner = PipelineRunner::new(PipelineConfig {
            executable: Some("definitely-not-here".to_string()),
            script_path: Some("run.py".to_string()),
            working_directory: dir.path().to_str().map(String::from),
        });

        assert!(runner.trigger().is_accepted());
        let status = wait_idle(&runner).await;
        assert!(matches!(
            status.last.and_then(|r| r.outcome),
            Some(RunOutcome::LaunchFailed { .. })
        ));
        assert!(runner.trigger().is_accepted());
        wait_idle(&runner).await;
    }

    #[test]
    fn dropped_guard_without_outcome_is_aborted() {
        let runner = PipelineRunner::new(PipelineConfig::default());
        let guard = runner.begin_run().expect("idle runner hands out the lock");
        let run_id = guard.record.run_id.clone();
        assert_eq!(runner.lock.available_permits(), 0);
        assert!(runner.begin_run().is_none());

        drop(guard);

        assert_eq!(runner.lock.available_permits(), 1);
        let status = runner.status();
        assert_eq!(status.state, RunState::Idle);
        assert!(status.current.is_none());
        let last = status.last.expect("aborted run recorded");
        assert_eq!(last.run_id, run_id);
        assert_eq!(last.outcome, Some(RunOutcome::Aborted));
        assert!(last.finished_at.is_some());
    }

    #[tokio::test]
    async fn panicking_run_still_releases_lock() {
        let runner = PipelineRunner::new(PipelineConfig::default());
        let guard = runner.begin_run().expect("idle runner hands out the lock");

        let handle = tokio::spawn(async move {
            let _guard = guard;
            panic!("pipeline task blew up");
        });
        assert!(handle.await.unwrap_err().is_panic());

        assert!(!runner.is_running());
        let status = runner.status();
        assert_eq!(status.state, RunState::Idle);
        assert_eq!(
            status.last.and_then(|r| r.outcome),
            Some(RunOutcome::Aborted)
        );
        assert!(runner.trigger().is_accepted());
        wait_idle(&runner).await;
    }

    #[test]
    fn late_release_does_not_replace_newer_last_run() {
        let runner = PipelineRunner::new(PipelineConfig::default());
        let stale = runner.begin_run().expect("idle runner hands out the lock");

        let mut newer = RunRecord::start(RunId::new());
        newer.finished_at = Some(Utc::now() + chrono::Duration::seconds(60));
        newer.outcome = Some(RunOutcome::Exited {
            exit_code: Some(0),
            stdout_lines: 0,
            stderr_lines: 0,
        });
        runner.status.send_modify(|s| s.last = Some(newer.clone()));

        drop(stale);

        let status = runner.status();
        assert_eq!(status.state, RunState::Idle);
        assert_eq!(status.last, Some(newer));
    }

    #[test]
    fn new_runner_is_idle() {
        let runner = PipelineRunner::new(PipelineConfig::default());
        assert!(!runner.is_running());
        assert_eq!(runner.status(), RunStatus::default());
    }
}
