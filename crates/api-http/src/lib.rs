//! HTTP API Layer
//!
//! Axum routes for resume submission, job status polling, queue stats and
//! candidate ranking. Errors are rendered as `{"error": {"code", "message"}}`.

pub mod error;
pub mod handler;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use handler::AppState;
pub use server::{build_router, HttpServer, HttpServerConfig};
