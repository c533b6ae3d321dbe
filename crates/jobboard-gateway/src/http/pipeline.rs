//! Pipeline trigger endpoint: POST /pipeline/run, plus a read-only
//! GET /pipeline/status for observing how the last run ended.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use jobboard_pipeline::{RunStatus, TriggerOutcome};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::app::AppState;

/// POST /pipeline/run
///
/// 202 when the run was started in the background, 409 when one is already
/// in flight. The caller never learns how the run ends from this endpoint.
pub async fn run_pipeline(State(state): State<Arc<AppState>>) -> Response {
    info!("received request to run the ingestion pipeline");

    match state.pipeline.trigger() {
        TriggerOutcome::Accepted { .. } => (
            StatusCode::ACCEPTED,
            Json(json!({"message": "Pipeline run initiated."})),
        )
            .into_response(),
        TriggerOutcome::Conflict => (
            StatusCode::CONFLICT,
            "Pipeline is already running. Please try again later.",
        )
            .into_response(),
    }
}

/// GET /pipeline/status
pub async fn pipeline_status(State(state): State<Arc<AppState>>) -> Json<RunStatus> {
    Json(state.pipeline.status())
}
