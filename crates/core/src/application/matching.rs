// Candidate ranking against job listings and free-text searches

use super::prompts::{
    job_listing_grading_prompt, search_grading_prompt, strip_json_fences, GRADING_SYSTEM,
};
use crate::domain::{CandidateGrade, CandidateProfile, RankedCandidate, SearchFilters};
use crate::error::{AppError, Result};
use crate::port::{CandidateStore, LanguageModel};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};

pub const DEFAULT_RESULT_LIMIT: usize = 10;

fn default_limit() -> usize {
    DEFAULT_RESULT_LIMIT
}

/// A job listing to rank candidates against
#[derive(Debug, Clone, Deserialize)]
pub struct MatchRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

/// Natural-language query and/or structured filters
#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub filters: Option<SearchFilters>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

pub struct CandidateMatcher {
    llm: Arc<dyn LanguageModel>,
    candidates: Arc<dyn CandidateStore>,
}

impl CandidateMatcher {
    pub fn new(llm: Arc<dyn LanguageModel>, candidates: Arc<dyn CandidateStore>) -> Self {
        Self { llm, candidates }
    }

    /// Rank stored candidates against a job description
    pub async fn match_job_listing(&self, request: &MatchRequest) -> Result<Vec<RankedCandidate>> {
        let description = request.description.trim();
        if description.is_empty() {
            return Err(AppError::Validation(
                "Job description is required.".to_string(),
            ));
        }
        validate_limit(request.limit)?;

        // Only the error matters here: a throttled embeddings endpoint fails the
        // request with 429 before any grading work is done
        self.llm.embed(description).await?;

        let candidates = self.candidates.list_all().await?;
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        info!(
            title = request.title.as_deref().unwrap_or(""),
            location = request.location.as_deref().unwrap_or(""),
            candidates = candidates.len(),
            "Matching job listing"
        );
        let prompt = job_listing_grading_prompt(description, &candidates, request.limit);
        self.grade(&prompt, request.limit).await
    }

    /// Rank stored candidates against a query or filters
    pub async fn search(&self, request: &SearchRequest) -> Result<Vec<RankedCandidate>> {
        let query = request
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty());
        if query.is_none() && request.filters.is_none() {
            return Err(AppError::Validation(
                "No search parameters provided.".to_string(),
            ));
        }
        validate_limit(request.limit)?;

        let filters = request.filters.clone().unwrap_or_default();
        let candidates: Vec<CandidateProfile> = self
            .candidates
            .list_all()
            .await?
            .into_iter()
            .filter(|c| filters.matches(c))
            .collect();
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        info!(candidates = candidates.len(), "Searching candidates");
        let prompt = search_grading_prompt(query, &filters, &candidates, request.limit);
        self.grade(&prompt, request.limit).await
    }

    async fn grade(&self, prompt: &str, limit: usize) -> Result<Vec<RankedCandidate>> {
        let output = self.llm.complete(GRADING_SYSTEM, prompt).await?;
        let mut grades = parse_grades(&output)?;

        grades.sort_by(|a, b| b.score.total_cmp(&a.score));
        grades.truncate(limit);

        let mut ranked = Vec::with_capacity(grades.len());
        for grade in grades {
            // Graded entries the store does not know are dropped
            if let Some(candidate) = self.candidates.find_by_email_or_phone(&grade.email).await? {
                ranked.push(RankedCandidate {
                    candidate,
                    score: grade.score,
                    explanation: grade.explanation,
                });
            }
        }
        Ok(ranked)
    }
}

fn validate_limit(limit: usize) -> Result<()> {
    if limit == 0 {
        return Err(AppError::Validation("limit must be at least 1".to_string()));
    }
    Ok(())
}

fn parse_grades(output: &str) -> Result<Vec<CandidateGrade>> {
    let parse_error = |e: serde_json::Error| {
        error!(error = %e, llm_output = %output, "Failed to parse LLM response");
        AppError::Llm("Failed to parse LLM response.".to_string())
    };

    let value: serde_json::Value =
        serde_json::from_str(strip_json_fences(output)).map_err(parse_error)?;
    if !value.is_array() {
        return Ok(Vec::new());
    }
    serde_json::from_value(value).map_err(parse_error)
}
