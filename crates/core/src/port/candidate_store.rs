// Candidate Store Port
// Where extracted candidates live; only the ingestor and the matcher use it

use crate::domain::CandidateProfile;
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait CandidateStore: Send + Sync {
    /// Create the candidate, or update it if one with the same email exists
    async fn upsert(&self, candidate: &CandidateProfile, embedding: &[f32]) -> Result<()>;

    /// All stored candidates (embeddings are not returned)
    async fn list_all(&self) -> Result<Vec<CandidateProfile>>;

    /// Look a candidate up by email or phone number
    async fn find_by_email_or_phone(&self, identifier: &str) -> Result<Option<CandidateProfile>>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct InMemoryCandidateStore {
        candidates: Mutex<Vec<(CandidateProfile, Vec<f32>)>>,
    }

    impl InMemoryCandidateStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_candidates(candidates: Vec<CandidateProfile>) -> Self {
            let store = Self::new();
            *store.candidates.lock().unwrap() =
                candidates.into_iter().map(|c| (c, Vec::new())).collect();
            store
        }

        pub fn embedding_of(&self, email: &str) -> Option<Vec<f32>> {
            self.candidates
                .lock()
                .unwrap()
                .iter()
                .find(|(c, _)| c.email == email)
                .map(|(_, e)| e.clone())
        }

        pub fn len(&self) -> usize {
            self.candidates.lock().unwrap().len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }
    }

    #[async_trait]
    impl CandidateStore for InMemoryCandidateStore {
        async fn upsert(&self, candidate: &CandidateProfile, embedding: &[f32]) -> Result<()> {
            let mut candidates = self.candidates.lock().unwrap();
            match candidates.iter_mut().find(|(c, _)| c.email == candidate.email) {
                Some(entry) => *entry = (candidate.clone(), embedding.to_vec()),
                None => candidates.push((candidate.clone(), embedding.to_vec())),
            }
            Ok(())
        }

        async fn list_all(&self) -> Result<Vec<CandidateProfile>> {
            Ok(self
                .candidates
                .lock()
                .unwrap()
                .iter()
                .map(|(c, _)| c.clone())
                .collect())
        }

        async fn find_by_email_or_phone(
            &self,
            identifier: &str,
        ) -> Result<Option<CandidateProfile>> {
            Ok(self
                .candidates
                .lock()
                .unwrap()
                .iter()
                .find(|(c, _)| c.email == identifier || c.phone == identifier)
                .map(|(c, _)| c.clone()))
        }
    }
}
