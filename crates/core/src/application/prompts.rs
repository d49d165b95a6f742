// Prompts for candidate extraction and grading

use crate::domain::{CandidateProfile, SearchFilters};
use serde::Serialize;

/// System prompt for resume extraction
pub const EXTRACTION_SYSTEM: &str =
    "You are an intelligent assistant that extracts candidate information.";

/// System prompt for ranking
pub const GRADING_SYSTEM: &str = "You are an expert AI recruiter. \
    You respond with a JSON array only, without markdown code fences.";

const GRADING_OUTPUT_FORMAT: &str = r#"Output Format:
[
  {
    "name": "Candidate Name",
    "email": "candidate@example.com",
    "score": 95,
    "explanation": "Brief explanation of the score"
  }
]

Only return the JSON array, nothing else. If no candidates match the criteria, return an empty array."#;

pub fn extraction_prompt(resume_text: &str) -> String {
    format!(
        r#"Extract the candidate information from the following resume text and provide it in JSON format according to the schema below:
- Extract as much data as possible. List all the possible skills, certifications and any other relevant information.
- List all the skills from the resume text. Everything counts as a skill.
- Calculate the total years of experience from all work experiences mentioned.
- If no specific data for a field is mentioned in the resume text, set it to "Not specified".
- Expected output:
{{
  "email": "string",
  "phone": "string",
  "name": "string",
  "summary": "string",
  "experience": "string",
  "totalExperienceYears": float,
  "education": "string",
  "skills": ["string"],
  "certifications": ["string"],
  "linkedin": "string",
  "portfolio": "string"
}}

Resume Text:
{}
"#,
        resume_text
    )
}

/// What the grader is told about each candidate
#[derive(Serialize)]
struct CandidateBrief<'a> {
    name: &'a str,
    email: &'a str,
    summary: &'a str,
    experience: &'a str,
    skills: String,
}

fn candidate_briefs(candidates: &[CandidateProfile]) -> String {
    let briefs: Vec<CandidateBrief<'_>> = candidates
        .iter()
        .map(|c| CandidateBrief {
            name: &c.name,
            email: &c.email,
            summary: &c.summary,
            experience: &c.experience,
            skills: c.skills.join(", "),
        })
        .collect();
    serde_json::to_string_pretty(&briefs).unwrap_or_else(|_| "[]".to_string())
}

pub fn job_listing_grading_prompt(
    description: &str,
    candidates: &[CandidateProfile],
    limit: usize,
) -> String {
    format!(
        r#"Your task is to evaluate and rank candidates based on the given job description. Here are the detailed instructions:

1. Carefully review the job description and requirements.
2. Evaluate each candidate based on how well they match the job description. Consider the following factors:
   - Relevance of their skills to the required skills
   - Years and quality of experience
   - Overall suitability based on their summary
3. Assign a score from 0 to 100 for each candidate, where 100 is a perfect match and 0 is completely irrelevant.
4. Rank the candidates based on their scores.
5. Provide a brief explanation (1-2 sentences) for each candidate's score.
6. Return the top {limit} candidates in JSON format.

Job Description:
{description}

Candidate Information:
{briefs}

{format}
"#,
        limit = limit,
        description = description,
        briefs = candidate_briefs(candidates),
        format = GRADING_OUTPUT_FORMAT,
    )
}

pub fn search_grading_prompt(
    query: Option<&str>,
    filters: &SearchFilters,
    candidates: &[CandidateProfile],
    limit: usize,
) -> String {
    let criteria = match query {
        Some(q) => format!("Natural language query: {}", q),
        None => format!(
            "Filters: {}",
            serde_json::to_string(filters).unwrap_or_default()
        ),
    };

    format!(
        r#"Your task is to evaluate and rank candidates based on the given criteria. Here are the detailed instructions:

1. Carefully review the information for each candidate, including their name, email, summary, experience, and skills.
2. Consider the following search criteria:
   {criteria}
3. Evaluate each candidate based on how well they match the search criteria. Consider the following factors:
   - Relevance of their skills to the required skills (if specified)
   - Years and quality of experience
   - Overall suitability based on their summary
4. Assign a score from 0 to 100 for each candidate, where 100 is a perfect match and 0 is completely irrelevant.
5. Rank the candidates based on their scores.
6. Provide a brief explanation (1-2 sentences) for each candidate's score.
7. Return the top {limit} candidates in JSON format.

Candidate Information:
{briefs}

{format}
"#,
        criteria = criteria,
        limit = limit,
        briefs = candidate_briefs(candidates),
        format = GRADING_OUTPUT_FORMAT,
    )
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"));
    match inner {
        Some(stripped) => {
            let stripped = stripped.trim_start();
            stripped
                .strip_suffix("```")
                .map(|s| s.trim())
                .unwrap_or(stripped)
        }
        None => text,
    }
}
