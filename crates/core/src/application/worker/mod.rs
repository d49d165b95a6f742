// Worker - Job processing loop

pub mod constants;
mod panic_guard;
mod shutdown;

use constants::*;
pub use panic_guard::describe_join_error;
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};

use crate::domain::{CandidateProfile, Job, JobId};
use crate::error::Result;
use crate::port::{JobRepository, ProcessError, ResumeProcessor, TimeProvider};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{error, info, warn};

/// Loop tuning knobs
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Wait between polls when nothing is ready
    pub idle_poll_interval: Duration,
    /// Wait after a store error
    pub error_backoff: Duration,
    /// Deadline for a single processor call
    pub processor_timeout: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            idle_poll_interval: IDLE_POLL_INTERVAL,
            error_backoff: ERROR_RECOVERY_SLEEP_DURATION,
            processor_timeout: DEFAULT_PROCESSOR_TIMEOUT,
        }
    }
}

/// What one iteration of the loop did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopStep {
    /// No job was ready
    Idle,
    Completed(JobId),
    /// The job was throttled; the whole loop must pause for `pause`
    RateLimited { job_id: JobId, pause: Duration },
    /// Permanent failure
    Failed(JobId),
    /// Another attempt had already recorded this outcome
    Duplicate(JobId),
}

/// The in-memory `active` marker, shared with the status surface
#[derive(Clone, Default)]
pub struct ActiveJob(Arc<Mutex<Option<JobId>>>);

impl ActiveJob {
    pub fn get(&self) -> Option<JobId> {
        *self.0.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn hold(&self, id: JobId) -> ActiveGuard {
        *self.0.lock().unwrap_or_else(|p| p.into_inner()) = Some(id);
        ActiveGuard(self.clone())
    }
}

struct ActiveGuard(ActiveJob);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        *self.0 .0.lock().unwrap_or_else(|p| p.into_inner()) = None;
    }
}

/// Clamp the processor's requested delay to at least one second and at most a day
pub fn rate_limit_pause(requested_secs: u64) -> Duration {
    Duration::from_secs(
        requested_secs.clamp(MIN_RATE_LIMIT_PAUSE_SECS, MAX_RATE_LIMIT_PAUSE_SECS),
    )
}

/// Single-consumer loop driving jobs from ready to a recorded outcome
pub struct ProcessingLoop {
    job_repo: Arc<dyn JobRepository>,
    processor: Arc<dyn ResumeProcessor>,
    time_provider: Arc<dyn TimeProvider>,
    config: LoopConfig,
    active: ActiveJob,
}

impl ProcessingLoop {
    pub fn new(
        job_repo: Arc<dyn JobRepository>,
        processor: Arc<dyn ResumeProcessor>,
        time_provider: Arc<dyn TimeProvider>,
        config: LoopConfig,
    ) -> Self {
        Self {
            job_repo,
            processor,
            time_provider,
            config,
            active: ActiveJob::default(),
        }
    }

    /// Handle on the job currently being processed
    pub fn active_job(&self) -> ActiveJob {
        self.active.clone()
    }

    /// Run the loop until `shutdown` fires
    pub async fn run(&self, mut shutdown: ShutdownToken) {
        info!("Processing loop started");
        loop {
            if shutdown.is_shutdown() {
                break;
            }

            let pause = match self.process_next_job().await {
                Ok(LoopStep::Idle) => Some(self.config.idle_poll_interval),
                Ok(LoopStep::RateLimited { pause, .. }) => {
                    info!(pause_secs = pause.as_secs(), "Pausing queue after rate limit");
                    Some(pause)
                }
                Ok(_) => {
                    // Drain successes as fast as the processor allows, but let
                    // request handlers run in between.
                    tokio::task::yield_now().await;
                    None
                }
                Err(e) => {
                    error!(error = %e, "Processing loop error");
                    Some(self.config.error_backoff)
                }
            };

            if let Some(duration) = pause {
                if !shutdown.sleep(duration).await {
                    break;
                }
            }
        }
        info!("Processing loop stopped");
    }

    /// Process the next ready job, if any
    pub async fn process_next_job(&self) -> Result<LoopStep> {
        let now_secs = self.time_provider.now_secs();
        let job = match self.job_repo.fetch_next_ready(now_secs).await? {
            Some(j) => j,
            None => return Ok(LoopStep::Idle),
        };

        let _active = self.active.hold(job.id);
        info!(job_id = job.id, attempts = job.attempts, "Processing job");

        match self.invoke_processor(&job).await {
            Ok(candidate) => self.record_success(&job, &candidate).await,
            Err(ProcessError::RateLimited { retry_after_secs }) => {
                let pause = rate_limit_pause(retry_after_secs);
                let applied = self
                    .job_repo
                    .mark_failed(&job, RATE_LIMITED_MESSAGE, Some(pause))
                    .await?;
                warn!(
                    job_id = job.id,
                    requested_secs = retry_after_secs,
                    pause_secs = pause.as_secs(),
                    "Job rate limited"
                );
                if !applied {
                    return Ok(LoopStep::Duplicate(job.id));
                }
                Ok(LoopStep::RateLimited {
                    job_id: job.id,
                    pause,
                })
            }
            Err(ProcessError::Failed(message)) => {
                let applied = self.job_repo.mark_failed(&job, &message, None).await?;
                error!(job_id = job.id, error = %message, "Job failed permanently");
                if !applied {
                    return Ok(LoopStep::Duplicate(job.id));
                }
                Ok(LoopStep::Failed(job.id))
            }
        }
    }

    async fn record_success(&self, job: &Job, candidate: &CandidateProfile) -> Result<LoopStep> {
        if !self.job_repo.mark_completed(job, candidate).await? {
            warn!(job_id = job.id, "Outcome already recorded by another attempt");
            return Ok(LoopStep::Duplicate(job.id));
        }
        info!(job_id = job.id, email = %candidate.email, "Job completed");
        Ok(LoopStep::Completed(job.id))
    }

    /// Run the processor in its own task so a panic or a hang only costs this job
    async fn invoke_processor(&self, job: &Job) -> std::result::Result<CandidateProfile, ProcessError> {
        let processor = Arc::clone(&self.processor);
        let payload = job.payload.clone();
        let mut handle = tokio::task::spawn(async move { processor.process(&payload).await });

        match tokio::time::timeout(self.config.processor_timeout, &mut handle).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(join_err)) => Err(ProcessError::Failed(describe_join_error(join_err))),
            Err(_) => {
                handle.abort();
                Err(ProcessError::Failed(format!(
                    "processor timed out after {}s",
                    self.config.processor_timeout.as_secs()
                )))
            }
        }
    }
}
