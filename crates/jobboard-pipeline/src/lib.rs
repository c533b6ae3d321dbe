//! jobboard-pipeline: guarded, fire-and-forget runs of the external
//! ingestion script.
//!
//! One [`PipelineRunner`] per process owns a single-slot lock. A trigger
//! either starts a run in the background and returns `Accepted`, or returns
//! `Conflict` immediately because a run is already in flight. Run results
//! only reach the log and [`RunStatus`].
//!
//! # Quick start
//!
//! ```rust,no_run
//! use jobboard_core::PipelineConfig;
//! use jobboard_pipeline::{PipelineRunner, TriggerOutcome};
//!
//! #[tokio::main]
//! async fn main() {
//!     let runner = PipelineRunner::new(PipelineConfig {
//!         executable: Some("venv/bin/python".into()),
//!         script_path: Some("run_pipeline.py".into()),
//!         working_directory: Some("../pipeline".into()),
//!     });
//!
//!     match runner.trigger() {
//!         TriggerOutcome::Accepted { run_id } => println!("started {run_id}"),
//!         TriggerOutcome::Conflict => println!("busy"),
//!     }
//! }
//! ```

pub mod error;
pub mod process;
pub mod runner;
pub mod settings;
pub mod types;

pub use error::{PipelineError, Result};
pub use runner::PipelineRunner;
pub use settings::{PipelineSettings, ResolvedCommand};
pub use types::{RunId, RunOutcome, RunRecord, RunState, RunStatus, TriggerOutcome};
