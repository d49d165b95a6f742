// HireFlow Infrastructure - SQLite Adapter
// Implements: JobRepository, CandidateStore

mod candidate_store;
mod connection;
mod error;
mod job_repository;
mod migration;

pub use candidate_store::SqliteCandidateStore;
pub use connection::{create_pool, database_url};
pub use job_repository::SqliteJobRepository;
pub use migration::run_migrations;
