// Text Extractor Port (PDF -> plain text)

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse PDF: {0}")]
    Parse(String),

    #[error("Document contains no extractable text")]
    Empty,
}

#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(&self, path: &Path) -> Result<String, ExtractError>;
}

pub mod mocks {
    use super::*;

    /// Returns the same text for every file
    pub struct FixedTextExtractor(pub String);

    #[async_trait]
    impl TextExtractor for FixedTextExtractor {
        async fn extract_text(&self, _path: &Path) -> Result<String, ExtractError> {
            if self.0.trim().is_empty() {
                return Err(ExtractError::Empty);
            }
            Ok(self.0.clone())
        }
    }
}
