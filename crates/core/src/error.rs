// Central Error Type for the Application

use crate::domain::JobId;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The language model asked us to back off
    #[error("Rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Shorthand for the not-found case, which callers must be able to tell apart
    /// from storage failures.
    pub fn job_not_found(id: JobId) -> Self {
        AppError::Domain(crate::domain::DomainError::JobNotFound(id))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AppError::Domain(crate::domain::DomainError::JobNotFound(_))
        )
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

impl From<crate::port::LlmError> for AppError {
    fn from(err: crate::port::LlmError) -> Self {
        match err {
            crate::port::LlmError::RateLimited { retry_after_secs } => {
                AppError::RateLimited { retry_after_secs }
            }
            other => AppError::Llm(other.to_string()),
        }
    }
}

// Note: sqlx::Error conversion is handled in infra-sqlite crate
// by converting to AppError::Database(String)

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::LlmError;

    #[test]
    fn test_not_found_is_distinct_from_database_error() {
        assert!(AppError::job_not_found(7).is_not_found());
        assert!(!AppError::Database("disk I/O error".to_string()).is_not_found());
    }

    #[test]
    fn test_llm_rate_limit_keeps_structured_delay() {
        let err: AppError = LlmError::RateLimited {
            retry_after_secs: 12,
        }
        .into();
        assert!(matches!(
            err,
            AppError::RateLimited {
                retry_after_secs: 12
            }
        ));
    }
}
