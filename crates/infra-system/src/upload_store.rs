// Upload storage on the local filesystem

use async_trait::async_trait;
use hireflow_core::error::Result;
use hireflow_core::port::{UploadStore, UploadedFile};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Writes each upload to `<dir>/<millis>-<uuid>-<sanitized name>`
pub struct LocalUploadStore {
    dir: PathBuf,
}

impl LocalUploadStore {
    /// Create the store, creating `dir` if needed
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl UploadStore for LocalUploadStore {
    async fn save(&self, file: &UploadedFile) -> Result<String> {
        let file_name = format!(
            "{}-{}-{}",
            chrono::Utc::now().timestamp_millis(),
            uuid::Uuid::new_v4().simple(),
            sanitize_file_name(&file.original_name)
        );
        let path = self.dir.join(file_name);

        tokio::fs::write(&path, &file.bytes).await?;
        info!(
            original_name = %file.original_name,
            path = %path.display(),
            bytes = file.bytes.len(),
            "Upload stored"
        );
        Ok(path.to_string_lossy().into_owned())
    }

    async fn remove(&self, path: &str) -> Result<()> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                info!(path = %path, "Upload removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path, "Upload already gone");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Keep the last path component and replace anything outside `[A-Za-z0-9._-]`
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(|c| c == '/' || c == '\\').next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        "upload.pdf".to_string()
    } else {
        cleaned.to_string()
    }
}
