// Application Layer - Use Cases and Business Logic

pub mod ingest;
pub mod matching;
pub mod prompts;
pub mod runner;
pub mod submission;
pub mod worker;

// Re-exports
pub use ingest::ResumeIngestor;
pub use matching::{CandidateMatcher, MatchRequest, SearchRequest};
pub use runner::QueueRunner;
pub use submission::{JobStatusView, QueueStats, SubmissionService, PDF_CONTENT_TYPE};
pub use worker::{
    shutdown_channel, LoopConfig, LoopStep, ProcessingLoop, ShutdownSender, ShutdownToken,
};
