// Resume ingestion - the production ResumeProcessor

use super::prompts::{extraction_prompt, strip_json_fences, EXTRACTION_SYSTEM};
use crate::domain::{CandidateProfile, ExtractedCandidate, JobInput, JobPayload};
use crate::port::{
    CandidateStore, LanguageModel, LlmError, ProcessError, ResumeProcessor, TextExtractor,
};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Extracts a candidate from a stored resume and upserts it into the candidate store
pub struct ResumeIngestor {
    extractor: Arc<dyn TextExtractor>,
    llm: Arc<dyn LanguageModel>,
    candidates: Arc<dyn CandidateStore>,
}

impl ResumeIngestor {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        llm: Arc<dyn LanguageModel>,
        candidates: Arc<dyn CandidateStore>,
    ) -> Self {
        Self {
            extractor,
            llm,
            candidates,
        }
    }

    async fn ingest(&self, file_path: &str) -> Result<CandidateProfile, ProcessError> {
        let text = self
            .extractor
            .extract_text(Path::new(file_path))
            .await
            .map_err(|e| ProcessError::Failed(e.to_string()))?;
        debug!(file_path = %file_path, chars = text.len(), "Extracted resume text");

        let output = self
            .llm
            .complete(EXTRACTION_SYSTEM, &extraction_prompt(&text))
            .await
            .map_err(llm_failure)?;

        let profile = parse_candidate(&output)?;

        let embedding = self.llm.embed(&profile.summary).await.map_err(llm_failure)?;

        self.candidates
            .upsert(&profile, &embedding)
            .await
            .map_err(|e| ProcessError::Failed(format!("Failed to store candidate: {}", e)))?;

        info!(email = %profile.email, "Candidate created or updated");
        Ok(profile)
    }
}

#[async_trait]
impl ResumeProcessor for ResumeIngestor {
    async fn process(&self, payload: &JobPayload) -> Result<CandidateProfile, ProcessError> {
        match &payload.input {
            JobInput::ResumeUpload { file_path, .. } => self.ingest(file_path).await,
        }
    }
}

fn llm_failure(err: LlmError) -> ProcessError {
    match err {
        LlmError::RateLimited { retry_after_secs } => ProcessError::RateLimited { retry_after_secs },
        other => ProcessError::Failed(other.to_string()),
    }
}

/// Parse the model's answer into a validated profile
fn parse_candidate(output: &str) -> Result<CandidateProfile, ProcessError> {
    let extracted: ExtractedCandidate =
        serde_json::from_str(strip_json_fences(output)).map_err(|e| {
            error!(error = %e, llm_output = %output, "Failed to parse candidate data");
            ProcessError::failed("Failed to parse candidate data.")
        })?;

    extracted
        .into_profile()
        .map_err(|e| ProcessError::Failed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candidate::NOT_SPECIFIED;
    use crate::port::candidate_store::mocks::InMemoryCandidateStore;
    use crate::port::language_model::mocks::ScriptedLanguageModel;
    use crate::port::text_extractor::mocks::FixedTextExtractor;

    const CANDIDATE_JSON: &str = r#"```json
{
  "email": "grace@example.com",
  "phone": "+1 555 0199",
  "name": "Grace Hopper",
  "summary": "Compiler pioneer",
  "experience": "US Navy, Remington Rand",
  "totalExperienceYears": 42,
  "skills": ["COBOL", "Compilers"],
  "linkedin": null
}
```"#;

    struct Fixture {
        llm: Arc<ScriptedLanguageModel>,
        store: Arc<InMemoryCandidateStore>,
        ingestor: ResumeIngestor,
    }

    fn fixture(resume_text: &str) -> Fixture {
        let llm = Arc::new(ScriptedLanguageModel::new());
        let store = Arc::new(InMemoryCandidateStore::new());
        let ingestor = ResumeIngestor::new(
            Arc::new(FixedTextExtractor(resume_text.to_string())),
            llm.clone(),
            store.clone(),
        );
        Fixture {
            llm,
            store,
            ingestor,
        }
    }

    fn payload() -> JobPayload {
        JobPayload::resume_upload("/uploads/1-grace.pdf", "grace.pdf", "application/pdf")
    }

    #[tokio::test]
    async fn test_successful_ingestion_upserts_candidate() {
        let f = fixture("Grace Hopper resume");
        f.llm.push_completion(Ok(CANDIDATE_JSON.to_string()));
        f.llm.set_embedding(Ok(vec![0.5, 0.25]));

        let profile = f.ingestor.process(&payload()).await.unwrap();
        assert_eq!(profile.email, "grace@example.com");
        assert_eq!(profile.total_experience_years, 42.0);
        assert_eq!(profile.education, NOT_SPECIFIED);
        assert_eq!(profile.linkedin, "");

        assert_eq!(f.store.embedding_of("grace@example.com"), Some(vec![0.5, 0.25]));
        assert!(f.llm.prompts()[0].contains("Grace Hopper resume"));
    }

    #[tokio::test]
    async fn test_reingesting_same_email_updates_in_place() {
        let f = fixture("Grace Hopper resume");
        f.llm.push_completion(Ok(CANDIDATE_JSON.to_string()));
        f.llm.push_completion(Ok(CANDIDATE_JSON.to_string()));

        f.ingestor.process(&payload()).await.unwrap();
        f.ingestor.process(&payload()).await.unwrap();
        assert_eq!(f.store.len(), 1);
    }

    #[tokio::test]
    async fn test_completion_rate_limit_is_structured() {
        let f = fixture("text");
        f.llm.push_completion(Err(LlmError::RateLimited {
            retry_after_secs: 17,
        }));

        let err = f.ingestor.process(&payload()).await.unwrap_err();
        assert_eq!(
            err,
            ProcessError::RateLimited {
                retry_after_secs: 17
            }
        );
        assert!(f.store.is_empty());
    }

    #[tokio::test]
    async fn test_embedding_rate_limit_is_structured() {
        let f = fixture("text");
        f.llm.push_completion(Ok(CANDIDATE_JSON.to_string()));
        f.llm.set_embedding(Err(LlmError::RateLimited {
            retry_after_secs: 60,
        }));

        let err = f.ingestor.process(&payload()).await.unwrap_err();
        assert!(matches!(err, ProcessError::RateLimited { retry_after_secs: 60 }));
    }

    #[tokio::test]
    async fn test_missing_required_field_fails_permanently() {
        let f = fixture("text");
        f.llm
            .push_completion(Ok(r#"{"email": "x@example.com", "skills": []}"#.to_string()));

        let err = f.ingestor.process(&payload()).await.unwrap_err();
        assert_eq!(
            err,
            ProcessError::failed("Validation error: Missing field: phone")
        );
    }

    #[tokio::test]
    async fn test_unparseable_output_fails_permanently() {
        let f = fixture("text");
        f.llm.push_completion(Ok("Sorry, I cannot help with that.".to_string()));

        let err = f.ingestor.process(&payload()).await.unwrap_err();
        assert_eq!(err, ProcessError::failed("Failed to parse candidate data."));
    }

    #[tokio::test]
    async fn test_empty_pdf_fails_without_calling_llm() {
        let f = fixture("   ");
        let err = f.ingestor.process(&payload()).await.unwrap_err();
        assert_eq!(
            err,
            ProcessError::failed("Document contains no extractable text")
        );
        assert!(f.llm.prompts().is_empty());
    }
}
