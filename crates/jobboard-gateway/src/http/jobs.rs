//! Read-only job posting endpoints: GET /jobs and GET /jobs/{province}.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use jobboard_postings::{JobPosting, PostingError};
use std::sync::Arc;
use tracing::{info, warn};

use crate::app::AppState;

/// Error responses carry a plain-text message.
type ApiError = (StatusCode, String);

/// GET /jobs: every stored posting, possibly none.
pub async fn list_jobs(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<JobPosting>>, ApiError> {
    let postings = state.postings.list_all().map_err(posting_error)?;
    Ok(Json(postings))
}

/// GET /jobs/{province}
///
/// Returns 200 with the postings whose province matches ignoring case, or
/// 404 with a message naming the province when nothing matches.
pub async fn jobs_by_province(
    State(state): State<Arc<AppState>>,
    Path(province): Path<String>,
) -> Result<Json<Vec<JobPosting>>, ApiError> {
    let postings = state
        .postings
        .list_by_province(&province)
        .map_err(posting_error)?;
    info!(province = %province, count = postings.len(), "province lookup");
    Ok(Json(postings))
}

fn posting_error(e: PostingError) -> ApiError {
    match e {
        PostingError::ProvinceNotFound { .. } => (StatusCode::NOT_FOUND, e.to_string()),
        other => {
            warn!(error = %other, "job posting query failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "Job postings are temporarily unavailable.".to_string(),
            )
        }
    }
}
