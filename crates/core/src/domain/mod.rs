// Domain Layer - Pure business logic and entities

pub mod candidate;
pub mod error;
pub mod job;

// Re-exports
pub use candidate::{
    CandidateGrade, CandidateProfile, ExtractedCandidate, RankedCandidate, SearchFilters,
};
pub use error::DomainError;
pub use job::{
    retry_after_from, Job, JobId, JobInput, JobPayload, JobResult, JobStatus, PAYLOAD_SCHEMA_VERSION,
};
