// Resume Processor Port
// The external collaborator the processing loop hands each job to

use crate::domain::{CandidateProfile, JobPayload};
use async_trait::async_trait;
use thiserror::Error;

/// Failure outcomes of processing one job.
///
/// The loop must be able to tell throttling apart from everything else, so the
/// delay travels as a number and is never parsed back out of a message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessError {
    /// The external service throttled us; nothing should be attempted for this long
    #[error("Rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Anything else. Stored verbatim as the job's failure description.
    #[error("{0}")]
    Failed(String),
}

impl ProcessError {
    pub fn failed(message: impl Into<String>) -> Self {
        ProcessError::Failed(message.into())
    }
}

/// Turns a job payload into a stored candidate
#[async_trait]
pub trait ResumeProcessor: Send + Sync {
    async fn process(&self, payload: &JobPayload) -> Result<CandidateProfile, ProcessError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::domain::JobInput;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Mock processor behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Succeed with a sample candidate derived from the file name
        Success,
        /// Report throttling
        RateLimited(u64),
        /// Fail permanently with message
        Fail(String),
        /// Panic with message (for panic isolation testing)
        Panic(String),
        /// Never return within the given time
        Hang(Duration),
    }

    /// Processor whose outcome is scripted per uploaded file name.
    ///
    /// Each file name has a queue of behaviors; once it is drained the default
    /// behavior applies.
    pub struct ScriptedProcessor {
        default: MockBehavior,
        scripts: Mutex<HashMap<String, VecDeque<MockBehavior>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedProcessor {
        pub fn new(default: MockBehavior) -> Self {
            Self {
                default,
                scripts: Mutex::new(HashMap::new()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn new_success() -> Self {
            Self::new(MockBehavior::Success)
        }

        /// Queue `behavior` for the next call concerning `original_name`
        pub fn script(&self, original_name: &str, behavior: MockBehavior) -> &Self {
            self.scripts
                .lock()
                .unwrap()
                .entry(original_name.to_string())
                .or_default()
                .push_back(behavior);
            self
        }

        /// File names processed so far, in call order
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ResumeProcessor for ScriptedProcessor {
        async fn process(&self, payload: &JobPayload) -> Result<CandidateProfile, ProcessError> {
            let JobInput::ResumeUpload { original_name, .. } = &payload.input;
            self.calls.lock().unwrap().push(original_name.clone());

            let behavior = self
                .scripts
                .lock()
                .unwrap()
                .get_mut(original_name)
                .and_then(|queue| queue.pop_front())
                .unwrap_or_else(|| self.default.clone());

            match behavior {
                MockBehavior::Success => Ok(CandidateProfile::sample(&format!(
                    "{}@example.com",
                    original_name.trim_end_matches(".pdf")
                ))),
                MockBehavior::RateLimited(secs) => Err(ProcessError::RateLimited {
                    retry_after_secs: secs,
                }),
                MockBehavior::Fail(msg) => Err(ProcessError::Failed(msg)),
                MockBehavior::Panic(msg) => {
                    panic!("{}", msg); // Actually panic for panic isolation testing
                }
                MockBehavior::Hang(duration) => {
                    tokio::time::sleep(duration).await;
                    Err(ProcessError::failed("woke up after hanging"))
                }
            }
        }
    }
}
