// Port Layer - Interfaces for external dependencies

pub mod candidate_store;
pub mod job_repository;
pub mod language_model;
pub mod processor;
pub mod text_extractor;
pub mod time_provider;
pub mod upload_store;

// Re-exports
pub use candidate_store::CandidateStore;
pub use job_repository::JobRepository;
pub use language_model::{LanguageModel, LlmError};
pub use processor::{ProcessError, ResumeProcessor};
pub use text_extractor::{ExtractError, TextExtractor};
pub use time_provider::TimeProvider;
pub use upload_store::{UploadStore, UploadedFile};
