// Job Repository Port (Interface)

use crate::domain::{
    retry_after_from, CandidateProfile, Job, JobId, JobPayload, JobResult, JobStatus,
};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Repository interface for Job persistence
///
/// Single-row operations must be atomic and isolated; concurrent `enqueue` and
/// `find_by_id` calls from request handlers are expected.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Insert a new `pending` job and return its id
    async fn enqueue(&self, payload: &JobPayload) -> Result<JobId>;

    /// Insert several jobs atomically; ids come back in input order
    async fn enqueue_batch(&self, payloads: &[JobPayload]) -> Result<Vec<JobId>>;

    /// Find job by ID (`DomainError::JobNotFound` when absent)
    async fn find_by_id(&self, id: JobId) -> Result<Job>;

    /// Lowest-id ready job at `now_secs`, without mutating it
    async fn fetch_next_ready(&self, now_secs: i64) -> Result<Option<Job>>;

    /// Record success for a job fetched as `job`.
    ///
    /// Returns `true` if this call applied the transition, `false` if the job
    /// already holds exactly this outcome. Fails with `AppError::Conflict` when
    /// the job was transitioned by another attempt in the meantime.
    async fn mark_completed(&self, job: &Job, candidate: &CandidateProfile) -> Result<bool>;

    /// Record failure for a job fetched as `job` (same contract as `mark_completed`).
    ///
    /// `retry_in` makes the failure resumable: the stored `retry_after` (epoch secs)
    /// is computed from the same clock read that timestamps the failure.
    async fn mark_failed(&self, job: &Job, message: &str, retry_in: Option<Duration>)
        -> Result<bool>;

    /// Count persisted jobs by status
    async fn count_by_status(&self, status: JobStatus) -> Result<i64>;
}

/// Outcome a `mark_*` call wants to record
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Completed(CandidateProfile),
    Failed {
        message: String,
        retry_after: Option<i64>,
    },
}

impl Transition {
    /// Failure stamped at `now_millis`
    pub fn failed(message: &str, retry_in: Option<Duration>, now_millis: i64) -> Self {
        Transition::Failed {
            message: message.to_string(),
            retry_after: retry_in.map(|delay| retry_after_from(now_millis, delay)),
        }
    }

    pub fn status(&self) -> JobStatus {
        match self {
            Transition::Completed(_) => JobStatus::Completed,
            Transition::Failed { .. } => JobStatus::Failed,
        }
    }

    pub fn result(&self) -> JobResult {
        match self {
            Transition::Completed(candidate) => JobResult::Candidate {
                candidate: candidate.clone(),
            },
            Transition::Failed { message, .. } => JobResult::error(message.clone()),
        }
    }

    pub fn retry_after(&self) -> Option<i64> {
        match self {
            Transition::Completed(_) => None,
            Transition::Failed { retry_after, .. } => *retry_after,
        }
    }

    /// Whether `job` already holds exactly this outcome
    pub fn is_recorded_on(&self, job: &Job) -> bool {
        job.status == self.status()
            && job.retry_after == self.retry_after()
            && job.result.as_ref() == Some(&self.result())
    }
}

/// Decide what a rejected conditional update means, given the row as it is now.
///
/// Shared by all adapters so idempotency and conflict detection behave the same.
pub fn settle_rejected_transition(
    id: JobId,
    current: Option<Job>,
    wanted: &Transition,
) -> Result<bool> {
    match current {
        None => Err(AppError::job_not_found(id)),
        Some(job) if wanted.is_recorded_on(&job) => Ok(false),
        Some(job) => Err(AppError::Conflict(format!(
            "job {} was already transitioned to {} (attempt {})",
            id, job.status, job.attempts
        ))),
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::port::TimeProvider;
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    /// In-memory job store with the same semantics as the SQLite adapter
    pub struct InMemoryJobRepository {
        jobs: Mutex<BTreeMap<JobId, Job>>,
        time_provider: Arc<dyn TimeProvider>,
        fail_storage: Mutex<bool>,
    }

    impl InMemoryJobRepository {
        pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
            Self {
                jobs: Mutex::new(BTreeMap::new()),
                time_provider,
                fail_storage: Mutex::new(false),
            }
        }

        /// Make every subsequent call fail as if the database were unavailable
        pub fn set_unavailable(&self, unavailable: bool) {
            *self.fail_storage.lock().unwrap() = unavailable;
        }

        fn check_available(&self) -> Result<()> {
            if *self.fail_storage.lock().unwrap() {
                return Err(AppError::Database("database is unavailable".to_string()));
            }
            Ok(())
        }

        fn apply(&self, fetched: &Job, wanted: Transition, now: i64) -> Result<bool> {
            self.check_available()?;
            let mut jobs = self.jobs.lock().unwrap();
            let current = jobs.get(&fetched.id).cloned();

            match jobs.get_mut(&fetched.id) {
                Some(stored) if stored.attempts == fetched.attempts => {
                    let applied = match wanted {
                        Transition::Completed(candidate) => stored.complete(candidate, now),
                        Transition::Failed {
                            message,
                            retry_after,
                        } => stored.fail(message, retry_after, now),
                    };
                    applied.map_err(AppError::from)?;
                    Ok(true)
                }
                _ => settle_rejected_transition(fetched.id, current, &wanted),
            }
        }
    }

    #[async_trait]
    impl JobRepository for InMemoryJobRepository {
        async fn enqueue(&self, payload: &JobPayload) -> Result<JobId> {
            let ids = self.enqueue_batch(std::slice::from_ref(payload)).await?;
            Ok(ids[0])
        }

        async fn enqueue_batch(&self, payloads: &[JobPayload]) -> Result<Vec<JobId>> {
            self.check_available()?;
            let now = self.time_provider.now_millis();
            let mut jobs = self.jobs.lock().unwrap();
            let mut next_id = jobs.keys().next_back().copied().unwrap_or(0) + 1;

            let mut ids = Vec::with_capacity(payloads.len());
            for payload in payloads {
                jobs.insert(next_id, Job::new(next_id, now, payload.clone()));
                ids.push(next_id);
                next_id += 1;
            }
            Ok(ids)
        }

        async fn find_by_id(&self, id: JobId) -> Result<Job> {
            self.check_available()?;
            self.jobs
                .lock()
                .unwrap()
                .get(&id)
                .cloned()
                .ok_or_else(|| AppError::job_not_found(id))
        }

        async fn fetch_next_ready(&self, now_secs: i64) -> Result<Option<Job>> {
            self.check_available()?;
            let jobs = self.jobs.lock().unwrap();
            Ok(jobs.values().find(|j| j.is_ready(now_secs)).cloned())
        }

        async fn mark_completed(&self, job: &Job, candidate: &CandidateProfile) -> Result<bool> {
            let now = self.time_provider.now_millis();
            self.apply(job, Transition::Completed(candidate.clone()), now)
        }

        async fn mark_failed(
            &self,
            job: &Job,
            message: &str,
            retry_in: Option<Duration>,
        ) -> Result<bool> {
            let now = self.time_provider.now_millis();
            self.apply(job, Transition::failed(message, retry_in, now), now)
        }

        async fn count_by_status(&self, status: JobStatus) -> Result<i64> {
            self.check_available()?;
            let jobs = self.jobs.lock().unwrap();
            Ok(jobs.values().filter(|j| j.status == status).count() as i64)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::port::time_provider::mocks::ManualTimeProvider;

        fn payload(name: &str) -> JobPayload {
            JobPayload::resume_upload(format!("/uploads/{}", name), name, "application/pdf")
        }

        fn repo() -> (InMemoryJobRepository, Arc<ManualTimeProvider>) {
            let clock = Arc::new(ManualTimeProvider::new(1_000_000));
            (InMemoryJobRepository::new(clock.clone()), clock)
        }

        #[tokio::test]
        async fn test_second_mark_for_same_fetch_is_rejected() {
            let (repo, _clock) = repo();
            repo.enqueue(&payload("a.pdf")).await.unwrap();
            let fetched = repo.fetch_next_ready(1_000).await.unwrap().unwrap();

            let candidate = CandidateProfile::sample("a@example.com");
            assert!(repo.mark_completed(&fetched, &candidate).await.unwrap());

            // Replaying the same outcome is a no-op
            assert!(!repo.mark_completed(&fetched, &candidate).await.unwrap());

            // A different outcome from the same stale fetch conflicts
            let err = repo.mark_failed(&fetched, "boom", None).await.unwrap_err();
            assert!(matches!(err, AppError::Conflict(_)));
        }

        #[tokio::test]
        async fn test_retry_after_is_computed_from_failure_time() {
            let (repo, clock) = repo();
            let id = repo.enqueue(&payload("a.pdf")).await.unwrap();
            let fetched = repo.fetch_next_ready(1_000).await.unwrap().unwrap();

            // Last millisecond of a second; the minimum delay still lands ahead of it
            clock.advance(Duration::from_millis(999));
            assert!(repo
                .mark_failed(&fetched, "rate limited", Some(Duration::from_secs(1)))
                .await
                .unwrap());
            assert_eq!(repo.find_by_id(id).await.unwrap().retry_after, Some(1_001));
        }

        #[tokio::test]
        async fn test_unavailable_store_surfaces_database_error() {
            let (repo, _clock) = repo();
            repo.set_unavailable(true);
            let err = repo.enqueue(&payload("a.pdf")).await.unwrap_err();
            assert!(matches!(err, AppError::Database(_)));
        }
    }
}
