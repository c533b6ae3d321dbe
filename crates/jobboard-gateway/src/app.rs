use axum::{
    routing::{get, post},
    Router,
};
use jobboard_core::PipelineConfig;
use jobboard_pipeline::PipelineRunner;
use jobboard_postings::PostingStore;
use std::sync::Arc;

/// Central shared state, passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub postings: PostingStore,
    /// Owns the process-wide pipeline lock.
    pub pipeline: PipelineRunner,
}

impl AppState {
    pub fn new(pipeline: PipelineConfig, postings: PostingStore) -> Self {
        Self {
            postings,
            pipeline: PipelineRunner::new(pipeline),
        }
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route("/jobs", get(crate::http::jobs::list_jobs))
        .route("/jobs/{province}", get(crate::http::jobs::jobs_by_province))
        .route("/pipeline/run", post(crate::http::pipeline::run_pipeline))
        .route("/pipeline/status", get(crate::http::pipeline::pipeline_status))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
