// Upload Store Port
// Persists submitted files so jobs can reference them by path

use crate::error::Result;
use async_trait::async_trait;

/// A file received by the submission surface
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(
        original_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            original_name: original_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }
}

#[async_trait]
pub trait UploadStore: Send + Sync {
    /// Store the file and return the path later handed to the processor
    async fn save(&self, file: &UploadedFile) -> Result<String>;

    /// Delete a file returned by `save`
    async fn remove(&self, path: &str) -> Result<()>;
}

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct State {
        next: usize,
        files: Vec<(String, UploadedFile)>,
        fail_on: Option<String>,
    }

    /// Keeps files in memory and hands out fake paths
    #[derive(Default)]
    pub struct InMemoryUploadStore {
        state: Mutex<State>,
    }

    impl InMemoryUploadStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make `save` fail for files with this original name
        pub fn fail_on(&self, original_name: &str) {
            self.state.lock().unwrap().fail_on = Some(original_name.to_string());
        }

        /// Original names of the files currently stored
        pub fn saved(&self) -> Vec<String> {
            self.state
                .lock()
                .unwrap()
                .files
                .iter()
                .map(|(_, f)| f.original_name.clone())
                .collect()
        }
    }

    #[async_trait]
    impl UploadStore for InMemoryUploadStore {
        async fn save(&self, file: &UploadedFile) -> Result<String> {
            let mut state = self.state.lock().unwrap();
            if state.fail_on.as_deref() == Some(file.original_name.as_str()) {
                return Err(AppError::Internal("disk full".to_string()));
            }
            state.next += 1;
            let path = format!("/mem/{}-{}", state.next, file.original_name);
            state.files.push((path.clone(), file.clone()));
            Ok(path)
        }

        async fn remove(&self, path: &str) -> Result<()> {
            self.state.lock().unwrap().files.retain(|(p, _)| p != path);
            Ok(())
        }
    }
}
