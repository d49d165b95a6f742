// Job Domain Model

use super::candidate::CandidateProfile;
use super::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Job ID (assigned by the store, strictly increasing, never reused)
pub type JobId = i64;

/// Current payload schema version. Bump when `JobPayload` changes shape.
pub const PAYLOAD_SCHEMA_VERSION: u32 = 1;

/// Epoch seconds `delay` after `now_millis`, saturating instead of overflowing
pub fn retry_after_from(now_millis: i64, delay: Duration) -> i64 {
    let delay_secs = i64::try_from(delay.as_secs()).unwrap_or(i64::MAX);
    now_millis.div_euclid(1000).saturating_add(delay_secs)
}

/// Job status as seen by clients.
///
/// `Active` is never persisted: the processing loop holds it in memory for the
/// job it is currently working on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Active,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Active => "active",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "active" => Ok(JobStatus::Active),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(DomainError::ValidationError(format!(
                "unknown job status: {}",
                other
            ))),
        }
    }
}

/// Input of a job. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobInput {
    /// A resume stored in the upload directory
    ResumeUpload {
        file_path: String,
        original_name: String,
        content_type: String,
    },
}

/// Versioned job payload as persisted in the `payload` column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPayload {
    pub schema_version: u32,
    #[serde(flatten)]
    pub input: JobInput,
}

impl JobPayload {
    pub fn new(input: JobInput) -> Self {
        Self {
            schema_version: PAYLOAD_SCHEMA_VERSION,
            input,
        }
    }

    pub fn resume_upload(
        file_path: impl Into<String>,
        original_name: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self::new(JobInput::ResumeUpload {
            file_path: file_path.into(),
            original_name: original_name.into(),
            content_type: content_type.into(),
        })
    }

    /// Parse a stored payload, rejecting schema versions this build does not know
    pub fn from_json(raw: &str) -> std::result::Result<Self, crate::error::AppError> {
        let payload: JobPayload = serde_json::from_str(raw)?;
        if payload.schema_version != PAYLOAD_SCHEMA_VERSION {
            return Err(DomainError::UnsupportedSchemaVersion(payload.schema_version).into());
        }
        Ok(payload)
    }
}

/// Output of a job: a success payload XOR a failure description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobResult {
    Candidate { candidate: CandidateProfile },
    Error { message: String },
}

impl JobResult {
    pub fn error(message: impl Into<String>) -> Self {
        JobResult::Error {
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, JobResult::Error { .. })
    }
}

/// Job Entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub payload: JobPayload,
    pub status: JobStatus,
    pub result: Option<JobResult>,

    /// Epoch seconds before which a failed job must not be picked up again.
    /// `None` on a failed job means the failure is permanent.
    pub retry_after: Option<i64>,

    /// Number of transitions recorded so far. Doubles as a fencing token:
    /// a `mark_*` call only applies if it was made against the current value.
    pub attempts: i64,

    pub created_at: i64, // epoch ms
    pub updated_at: Option<i64>,
}

impl Job {
    /// Create a new pending job
    ///
    /// # Arguments
    ///
    /// * `id` - Store-assigned id
    /// * `created_at` - Creation timestamp in epoch ms (injected, not system time)
    /// * `payload` - Job payload
    pub fn new(id: JobId, created_at: i64, payload: JobPayload) -> Self {
        Self {
            id,
            payload,
            status: JobStatus::Pending,
            result: None,
            retry_after: None,
            attempts: 0,
            created_at,
            updated_at: None,
        }
    }

    /// Whether the processing loop may pick this job up at `now_secs`
    pub fn is_ready(&self, now_secs: i64) -> bool {
        match self.status {
            JobStatus::Pending => true,
            JobStatus::Failed => matches!(self.retry_after, Some(at) if at <= now_secs),
            JobStatus::Active | JobStatus::Completed => false,
        }
    }

    /// Completed, or failed without a resume time
    pub fn is_terminal(&self) -> bool {
        match self.status {
            JobStatus::Completed => true,
            JobStatus::Failed => self.retry_after.is_none(),
            JobStatus::Pending | JobStatus::Active => false,
        }
    }

    fn ensure_pickable(&self, to: JobStatus) -> Result<()> {
        match self.status {
            JobStatus::Pending | JobStatus::Active => Ok(()),
            JobStatus::Failed if self.retry_after.is_some() => Ok(()),
            _ => Err(DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            }),
        }
    }

    /// Transition to `completed` with explicit timestamp
    pub fn complete(&mut self, result: CandidateProfile, now_millis: i64) -> Result<()> {
        self.ensure_pickable(JobStatus::Completed)?;
        self.status = JobStatus::Completed;
        self.result = Some(JobResult::Candidate { candidate: result });
        self.retry_after = None;
        self.attempts += 1;
        self.updated_at = Some(now_millis);
        Ok(())
    }

    /// Transition to `failed` with explicit timestamp
    pub fn fail(
        &mut self,
        message: impl Into<String>,
        retry_after: Option<i64>,
        now_millis: i64,
    ) -> Result<()> {
        self.ensure_pickable(JobStatus::Failed)?;
        if let Some(at) = retry_after {
            if at <= now_millis.div_euclid(1000) {
                return Err(DomainError::ValidationError(format!(
                    "retry_after {} is not in the future",
                    at
                )));
            }
        }
        self.status = JobStatus::Failed;
        self.result = Some(JobResult::error(message));
        self.retry_after = retry_after;
        self.attempts += 1;
        self.updated_at = Some(now_millis);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candidate::CandidateProfile;

    fn job() -> Job {
        Job::new(
            1,
            1_000,
            JobPayload::resume_upload("/tmp/a.pdf", "a.pdf", "application/pdf"),
        )
    }

    #[test]
    fn test_payload_json_shape() {
        let payload = JobPayload::resume_upload("/u/1-a.pdf", "a.pdf", "application/pdf");
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["schema_version"], 1);
        assert_eq!(value["kind"], "resume_upload");
        assert_eq!(value["file_path"], "/u/1-a.pdf");

        let parsed = JobPayload::from_json(&value.to_string()).unwrap();
        assert_eq!(parsed, payload);
    }

    #[test]
    fn test_payload_rejects_unknown_schema_version() {
        let raw = r#"{"schema_version": 9, "kind": "resume_upload", "file_path": "x", "original_name": "x", "content_type": "application/pdf"}"#;
        let err = JobPayload::from_json(raw).unwrap_err();
        assert!(err.to_string().contains("schema version"));
    }

    #[test]
    fn test_readiness() {
        let mut j = job();
        assert!(j.is_ready(0));

        j.fail("rate limited", Some(10), 5_000).unwrap();
        assert!(!j.is_ready(9));
        assert!(j.is_ready(10));
        assert!(!j.is_terminal());

        j.fail("bad pdf", None, 11_000).unwrap();
        assert!(!j.is_ready(i64::MAX));
        assert!(j.is_terminal());
    }

    #[test]
    fn test_complete_clears_retry_after() {
        let mut j = job();
        j.fail("rate limited", Some(10), 5_000).unwrap();
        j.complete(CandidateProfile::sample("a@example.com"), 10_000)
            .unwrap();
        assert_eq!(j.status, JobStatus::Completed);
        assert_eq!(j.retry_after, None);
        assert_eq!(j.attempts, 2);
        assert!(matches!(j.result, Some(JobResult::Candidate { .. })));
    }

    #[test]
    fn test_terminal_jobs_reject_transitions() {
        let mut j = job();
        j.complete(CandidateProfile::sample("a@example.com"), 2_000)
            .unwrap();
        let err = j.fail("late", None, 3_000).unwrap_err();
        assert!(matches!(err, DomainError::InvalidStateTransition { .. }));
    }

    #[test]
    fn test_retry_after_must_be_in_future() {
        let mut j = job();
        assert!(j.fail("rate limited", Some(5), 5_000).is_err());
        assert_eq!(j.status, JobStatus::Pending);
    }

    #[test]
    fn test_huge_retry_after_does_not_overflow() {
        let mut j = job();
        j.fail("rate limited", Some(i64::MAX), i64::MAX - 1).unwrap();
        assert_eq!(j.retry_after, Some(i64::MAX));
    }

    #[test]
    fn test_retry_after_from() {
        assert_eq!(retry_after_from(1_700_000_000_999, Duration::from_secs(5)), 1_700_000_005);
        assert_eq!(retry_after_from(1_000, Duration::ZERO), 1);
        assert_eq!(retry_after_from(i64::MAX, Duration::from_secs(u64::MAX)), i64::MAX);
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [JobStatus::Pending, JobStatus::Completed, JobStatus::Failed] {
            assert_eq!(status.as_str().parse::<JobStatus>().unwrap(), status);
        }
        assert!("RUNNING".parse::<JobStatus>().is_err());
    }
}
