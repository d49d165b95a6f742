// PDF text extraction
// reason: pdf-extract is synchronous and CPU bound, so it runs on the blocking pool

use async_trait::async_trait;
use hireflow_core::port::{ExtractError, TextExtractor};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract_text(&self, path: &Path) -> Result<String, ExtractError> {
        let bytes = tokio::fs::read(path).await?;
        let size = bytes.len();

        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
            .await
            .map_err(|e| ExtractError::Parse(format!("extractor crashed: {}", e)))?
            .map_err(|e| ExtractError::Parse(e.to_string()))?;

        if text.trim().is_empty() {
            return Err(ExtractError::Empty);
        }

        debug!(path = %path.display(), bytes = size, chars = text.len(), "PDF text extracted");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let err = PdfTextExtractor::new()
            .extract_text(Path::new("/definitely/not/here.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::Io(_)));
    }

    #[tokio::test]
    async fn test_garbage_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        tokio::fs::write(&path, b"this is not a pdf").await.unwrap();

        let err = PdfTextExtractor::new().extract_text(&path).await.unwrap_err();
        assert!(matches!(err, ExtractError::Parse(_)));
    }
}
