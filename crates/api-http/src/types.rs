//! Request/Response Types
//!
//! Request bodies for ranking (`MatchRequest`, `SearchRequest`) and status
//! views (`JobStatusView`, `QueueStats`) live in core and serialize as-is.

use hireflow_core::domain::{JobId, JobStatus, RankedCandidate};
use serde::Serialize;

/// POST /api/candidates/upload
#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    pub job_ids: Vec<JobId>,
    pub status: JobStatus,
}

/// POST /api/job_listings/match, POST /api/search
#[derive(Debug, Clone, Serialize)]
pub struct CandidatesResponse {
    pub candidates: Vec<RankedCandidate>,
}

/// GET /health
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}
