//! HTTP Handlers
//!
//! Thin adapters from axum extractors to the core services.

use crate::error::ApiError;
use crate::types::{CandidatesResponse, HealthResponse, UploadResponse};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use hireflow_core::application::{
    CandidateMatcher, JobStatusView, MatchRequest, QueueStats, SearchRequest, SubmissionService,
};
use hireflow_core::domain::{JobId, JobStatus};
use hireflow_core::port::UploadedFile;
use std::sync::Arc;
use tracing::debug;

/// Multipart field carrying resumes (repeatable)
pub const UPLOAD_FIELD: &str = "files";

/// Shared state injected into all handlers
#[derive(Clone)]
pub struct AppState {
    pub submissions: Arc<SubmissionService>,
    pub matcher: Arc<CandidateMatcher>,
}

impl AppState {
    pub fn new(submissions: Arc<SubmissionService>, matcher: Arc<CandidateMatcher>) -> Self {
        Self {
            submissions,
            matcher,
        }
    }
}

/// POST /api/candidates/upload
pub async fn upload_candidates(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let original_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await?;

        debug!(original_name = %original_name, content_type = %content_type, bytes = bytes.len(), "Received upload");
        files.push(UploadedFile::new(original_name, content_type, bytes.to_vec()));
    }

    let job_ids = state.submissions.submit(files).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(UploadResponse {
            job_ids,
            status: JobStatus::Pending,
        }),
    ))
}

/// GET /api/candidates/jobs/:id
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<JobStatusView>, ApiError> {
    let id: JobId = raw_id
        .parse()
        .map_err(|_| ApiError::Validation(format!("Invalid job id: {}", raw_id)))?;

    Ok(Json(state.submissions.get_status(id).await?))
}

/// GET /api/jobs/stats
pub async fn queue_stats(State(state): State<AppState>) -> Result<Json<QueueStats>, ApiError> {
    Ok(Json(state.submissions.stats().await?))
}

/// POST /api/job_listings/match
pub async fn match_job_listing(
    State(state): State<AppState>,
    payload: Result<Json<MatchRequest>, JsonRejection>,
) -> Result<Json<CandidatesResponse>, ApiError> {
    let Json(request) = payload?;
    let candidates = state.matcher.match_job_listing(&request).await?;
    Ok(Json(CandidatesResponse { candidates }))
}

/// POST /api/search
pub async fn search_candidates(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<CandidatesResponse>, ApiError> {
    let Json(request) = payload?;
    let candidates = state.matcher.search(&request).await?;
    Ok(Json(CandidatesResponse { candidates }))
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: hireflow_core::VERSION,
    })
}
