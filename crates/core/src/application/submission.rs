// Submission and status use cases

use super::runner::QueueRunner;
use crate::domain::{JobId, JobPayload, JobResult, JobStatus};
use crate::error::{AppError, Result};
use crate::port::{JobRepository, UploadStore, UploadedFile};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// What a polling client sees for one job
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobStatusView {
    pub id: JobId,
    pub status: JobStatus,
    pub result: Option<JobResult>,
    pub retry_after: Option<i64>,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub pending: i64,
    pub completed: i64,
    pub failed: i64,
    pub active_job: Option<JobId>,
}

pub struct SubmissionService {
    job_repo: Arc<dyn JobRepository>,
    uploads: Arc<dyn UploadStore>,
    runner: Arc<QueueRunner>,
}

impl SubmissionService {
    pub fn new(
        job_repo: Arc<dyn JobRepository>,
        uploads: Arc<dyn UploadStore>,
        runner: Arc<QueueRunner>,
    ) -> Self {
        Self {
            job_repo,
            uploads,
            runner,
        }
    }

    /// Store the files and enqueue one job per file, in input order.
    ///
    /// The whole request is rejected if any file is not a PDF.
    pub async fn submit(&self, files: Vec<UploadedFile>) -> Result<Vec<JobId>> {
        if files.is_empty() {
            return Err(AppError::Validation("No files uploaded.".to_string()));
        }
        if files.iter().any(|f| f.content_type != PDF_CONTENT_TYPE) {
            return Err(AppError::Validation(
                "Only PDF files are allowed.".to_string(),
            ));
        }

        let mut stored = Vec::with_capacity(files.len());
        let mut payloads = Vec::with_capacity(files.len());
        for file in &files {
            let path = match self.uploads.save(file).await {
                Ok(path) => path,
                Err(e) => {
                    self.discard(&stored).await;
                    return Err(e);
                }
            };
            payloads.push(JobPayload::resume_upload(
                path.clone(),
                file.original_name.clone(),
                file.content_type.clone(),
            ));
            stored.push(path);
        }

        let job_ids = match self.job_repo.enqueue_batch(&payloads).await {
            Ok(ids) => ids,
            Err(e) => {
                self.discard(&stored).await;
                return Err(e);
            }
        };
        info!(count = job_ids.len(), job_ids = ?job_ids, "Resumes queued");

        self.runner.start();
        Ok(job_ids)
    }

    /// Remove files stored by a submission that produced no jobs
    async fn discard(&self, paths: &[String]) {
        for path in paths {
            if let Err(e) = self.uploads.remove(path).await {
                warn!(path = %path, error = %e, "Failed to remove orphaned upload");
            }
        }
    }

    pub async fn get_status(&self, id: JobId) -> Result<JobStatusView> {
        let job = self.job_repo.find_by_id(id).await?;
        let status = if self.runner.active_job() == Some(id) {
            JobStatus::Active
        } else {
            job.status
        };

        Ok(JobStatusView {
            id: job.id,
            status,
            result: job.result,
            retry_after: job.retry_after,
            created_at: job.created_at,
        })
    }

    pub async fn stats(&self) -> Result<QueueStats> {
        Ok(QueueStats {
            pending: self.job_repo.count_by_status(JobStatus::Pending).await?,
            completed: self.job_repo.count_by_status(JobStatus::Completed).await?,
            failed: self.job_repo.count_by_status(JobStatus::Failed).await?,
            active_job: self.runner.active_job(),
        })
    }
}
