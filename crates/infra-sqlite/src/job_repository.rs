// SQLite JobRepository Implementation

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use hireflow_core::domain::{CandidateProfile, Job, JobId, JobPayload, JobResult, JobStatus};
use hireflow_core::error::{AppError, Result};
use hireflow_core::port::job_repository::{settle_rejected_transition, Transition};
use hireflow_core::port::{JobRepository, TimeProvider};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub struct SqliteJobRepository {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteJobRepository {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            time_provider,
        }
    }

    async fn find_optional(&self, id: JobId) -> Result<Option<Job>> {
        let row = sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(JobRow::into_job).transpose()
    }

    /// Conditional update fenced on the `attempts` value the caller fetched
    async fn apply(&self, fetched: &Job, wanted: Transition, now: i64) -> Result<bool> {

        // Run the domain transition on the fetched copy to validate it
        let mut next = fetched.clone();
        match &wanted {
            Transition::Completed(candidate) => next.complete(candidate.clone(), now)?,
            Transition::Failed {
                message,
                retry_after,
            } => next.fail(message.clone(), *retry_after, now)?,
        }
        let result_json = serde_json::to_string(&wanted.result())?;

        let rows = sqlx::query(
            r#"
            UPDATE jobs
            SET status = ?, result = ?, retry_after = ?, attempts = attempts + 1, updated_at = ?
            WHERE id = ? AND attempts = ?
              AND (status = 'pending' OR (status = 'failed' AND retry_after IS NOT NULL))
            "#,
        )
        .bind(next.status.as_str())
        .bind(&result_json)
        .bind(next.retry_after)
        .bind(now)
        .bind(fetched.id)
        .bind(fetched.attempts)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .rows_affected();

        if rows == 1 {
            debug!(job_id = fetched.id, status = %next.status, "Job transitioned");
            return Ok(true);
        }

        let current = self.find_optional(fetched.id).await?;
        settle_rejected_transition(fetched.id, current, &wanted)
    }
}

#[async_trait]
impl JobRepository for SqliteJobRepository {
    async fn enqueue(&self, payload: &JobPayload) -> Result<JobId> {
        let now = self.time_provider.now_millis();
        let id = sqlx::query("INSERT INTO jobs (payload, status, created_at) VALUES (?, 'pending', ?)")
            .bind(serde_json::to_string(payload)?)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?
            .last_insert_rowid();

        Ok(id)
    }

    async fn enqueue_batch(&self, payloads: &[JobPayload]) -> Result<Vec<JobId>> {
        let now = self.time_provider.now_millis();
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let mut ids = Vec::with_capacity(payloads.len());
        for payload in payloads {
            let id = sqlx::query(
                "INSERT INTO jobs (payload, status, created_at) VALUES (?, 'pending', ?)",
            )
            .bind(serde_json::to_string(payload)?)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .last_insert_rowid();
            ids.push(id);
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(ids)
    }

    async fn find_by_id(&self, id: JobId) -> Result<Job> {
        self.find_optional(id)
            .await?
            .ok_or_else(|| AppError::job_not_found(id))
    }

    async fn fetch_next_ready(&self, now_secs: i64) -> Result<Option<Job>> {
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            SELECT * FROM jobs
            WHERE status = 'pending'
               OR (status = 'failed' AND retry_after IS NOT NULL AND retry_after <= ?)
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .bind(now_secs)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(JobRow::into_job).transpose()
    }

    async fn mark_completed(&self, job: &Job, candidate: &CandidateProfile) -> Result<bool> {
        let now = self.time_provider.now_millis();
        self.apply(job, Transition::Completed(candidate.clone()), now)
            .await
    }

    async fn mark_failed(
        &self,
        job: &Job,
        message: &str,
        retry_in: Option<Duration>,
    ) -> Result<bool> {
        let now = self.time_provider.now_millis();
        self.apply(job, Transition::failed(message, retry_in, now), now)
            .await
    }

    async fn count_by_status(&self, status: JobStatus) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM jobs WHERE status = ?")
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(count)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct JobRow {
    id: i64,
    payload: String,
    status: String,
    result: Option<String>,
    retry_after: Option<i64>,
    attempts: i64,
    created_at: i64,
    updated_at: Option<i64>,
}

impl JobRow {
    fn into_job(self) -> Result<Job> {
        let status: JobStatus = self.status.parse()?;
        let payload = JobPayload::from_json(&self.payload)?;
        let result = self
            .result
            .as_deref()
            .map(serde_json::from_str::<JobResult>)
            .transpose()?;

        Ok(Job {
            id: self.id,
            payload,
            status,
            result,
            retry_after: self.retry_after,
            attempts: self.attempts,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
