//! HTTP Error Mapping
//!
//! Maps application errors to status codes and stable error codes. Storage and
//! LLM detail is logged server-side and never sent to clients.

use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use hireflow_core::domain::DomainError;
use hireflow_core::error::AppError;
use serde_json::json;

/// Stable error codes in the response body
pub mod code {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const CONFLICT: &str = "CONFLICT";
    pub const RATE_LIMITED: &str = "RATE_LIMITED";
    pub const PAYLOAD_TOO_LARGE: &str = "PAYLOAD_TOO_LARGE";
    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
    pub const LLM_ERROR: &str = "LLM_ERROR";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

#[derive(Debug)]
pub enum ApiError {
    App(AppError),
    Upload(MultipartError),
    Validation(String),
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError::App(err)
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::Upload(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, code::VALIDATION_ERROR, msg),
            ApiError::Upload(e) => {
                let status = e.status();
                let code = if status == StatusCode::PAYLOAD_TOO_LARGE {
                    code::PAYLOAD_TOO_LARGE
                } else {
                    code::VALIDATION_ERROR
                };
                (status, code, e.body_text())
            }
            ApiError::App(AppError::RateLimited { retry_after_secs }) => {
                return rate_limited(retry_after_secs)
            }
            ApiError::App(err) => app_error_parts(err),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

fn app_error_parts(err: AppError) -> (StatusCode, &'static str, String) {
    match err {
        AppError::Domain(DomainError::JobNotFound(id)) => (
            StatusCode::NOT_FOUND,
            code::NOT_FOUND,
            format!("Job {} not found", id),
        ),
        AppError::Validation(msg) | AppError::Domain(DomainError::ValidationError(msg)) => {
            (StatusCode::BAD_REQUEST, code::VALIDATION_ERROR, msg)
        }
        AppError::Conflict(msg) => (StatusCode::CONFLICT, code::CONFLICT, msg),
        err @ AppError::Domain(DomainError::InvalidStateTransition { .. }) => {
            (StatusCode::CONFLICT, code::CONFLICT, err.to_string())
        }
        AppError::Database(msg) => {
            tracing::error!(error = %msg, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                code::DATABASE_ERROR,
                "A database error occurred".to_string(),
            )
        }
        AppError::Llm(msg) => {
            tracing::error!(error = %msg, "LLM error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                code::LLM_ERROR,
                "An AI processing error occurred".to_string(),
            )
        }
        other => {
            tracing::error!(error = ?other, "Internal error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                code::INTERNAL_ERROR,
                "An internal server error occurred".to_string(),
            )
        }
    }
}

fn rate_limited(retry_after_secs: u64) -> Response {
    let body = Json(json!({
        "error": {
            "code": code::RATE_LIMITED,
            "message": "Rate limit reached",
            "retry_after": retry_after_secs
        }
    }));

    let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
    response
}
