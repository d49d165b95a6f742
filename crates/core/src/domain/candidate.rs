// Candidate Domain Model

use super::error::{DomainError, Result};
use serde::{Deserialize, Deserializer, Serialize};

pub const NOT_SPECIFIED: &str = "Not specified";

/// Structured candidate data extracted from a resume.
///
/// `email` is the identity key in the candidate store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub email: String,
    pub phone: String,
    pub name: String,
    pub summary: String,
    pub experience: String,
    pub total_experience_years: f64,
    pub education: String,
    pub skills: Vec<String>,
    pub certifications: Vec<String>,
    pub linkedin: String,
    pub portfolio: String,
}

impl CandidateProfile {
    /// Minimal valid profile, used by tests across the workspace
    pub fn sample(email: &str) -> Self {
        Self {
            email: email.to_string(),
            phone: "+1 555 0100".to_string(),
            name: "Sample Candidate".to_string(),
            summary: "Backend engineer".to_string(),
            experience: "5 years building APIs".to_string(),
            total_experience_years: 5.0,
            education: NOT_SPECIFIED.to_string(),
            skills: vec!["Rust".to_string(), "SQL".to_string()],
            certifications: vec![],
            linkedin: String::new(),
            portfolio: String::new(),
        }
    }

    /// Case-insensitive match of `needle` against skills, summary and experience
    pub fn mentions(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.skills
            .iter()
            .any(|s| s.to_lowercase().contains(&needle))
            || self.summary.to_lowercase().contains(&needle)
            || self.experience.to_lowercase().contains(&needle)
    }
}

/// Raw candidate JSON as returned by the language model (camelCase, loosely typed)
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedCandidate {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub name: Option<String>,
    pub summary: Option<String>,
    pub experience: Option<String>,
    #[serde(default, deserialize_with = "lenient_years")]
    pub total_experience_years: Option<f64>,
    pub education: Option<String>,
    pub skills: Option<Vec<String>>,
    pub certifications: Option<Vec<String>>,
    pub linkedin: Option<String>,
    pub portfolio: Option<String>,
}

impl ExtractedCandidate {
    /// Validate required fields and fill defaults for optional ones
    pub fn into_profile(self) -> Result<CandidateProfile> {
        fn required(field: &str, value: Option<String>) -> Result<String> {
            match value {
                Some(v) if !v.trim().is_empty() => Ok(v),
                _ => Err(DomainError::ValidationError(format!(
                    "Missing field: {}",
                    field
                ))),
            }
        }

        let email = required("email", self.email)?;
        let phone = required("phone", self.phone)?;
        let name = required("name", self.name)?;
        let summary = required("summary", self.summary)?;
        let experience = required("experience", self.experience)?;
        let skills = self
            .skills
            .ok_or_else(|| DomainError::ValidationError("Missing field: skills".to_string()))?;

        Ok(CandidateProfile {
            email,
            phone,
            name,
            summary,
            experience,
            total_experience_years: self.total_experience_years.unwrap_or(0.0),
            education: self
                .education
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| NOT_SPECIFIED.to_string()),
            skills,
            certifications: self.certifications.unwrap_or_default(),
            linkedin: self.linkedin.unwrap_or_default(),
            portfolio: self.portfolio.unwrap_or_default(),
        })
    }
}

// Models sometimes answer "7.5" or "Not specified" instead of a number
fn lenient_years<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

/// A stored candidate scored against a job description or search query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    #[serde(flatten)]
    pub candidate: CandidateProfile,
    pub score: f64,
    pub explanation: String,
}

/// One entry of the grading answer returned by the language model
#[derive(Debug, Clone, Deserialize)]
pub struct CandidateGrade {
    #[serde(default)]
    pub name: String,
    pub email: String,
    pub score: f64,
    #[serde(default)]
    pub explanation: String,
}

/// Structured search filters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    /// Minimum total years of experience
    #[serde(default)]
    pub experience: Option<f64>,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl SearchFilters {
    pub fn is_empty(&self) -> bool {
        self.experience.is_none() && self.skills.is_empty()
    }

    pub fn matches(&self, candidate: &CandidateProfile) -> bool {
        if let Some(min) = self.experience {
            if candidate.total_experience_years < min {
                return false;
            }
        }
        self.skills.iter().all(|skill| candidate.mentions(skill))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracted_candidate_defaults() {
        let raw = r#"{
            "email": "ada@example.com",
            "phone": "123",
            "name": "Ada",
            "summary": "Engineer",
            "experience": "Analytical engines",
            "totalExperienceYears": "7.5",
            "skills": ["Math"]
        }"#;
        let extracted: ExtractedCandidate = serde_json::from_str(raw).unwrap();
        let profile = extracted.into_profile().unwrap();
        assert_eq!(profile.total_experience_years, 7.5);
        assert_eq!(profile.education, NOT_SPECIFIED);
        assert!(profile.certifications.is_empty());
        assert_eq!(profile.linkedin, "");
    }

    #[test]
    fn test_extracted_candidate_missing_required_field() {
        let raw = r#"{"email": "ada@example.com", "phone": "123", "name": "Ada", "summary": "", "experience": "x", "skills": []}"#;
        let extracted: ExtractedCandidate = serde_json::from_str(raw).unwrap();
        let err = extracted.into_profile().unwrap_err();
        assert_eq!(err.to_string(), "Validation error: Missing field: summary");
    }

    #[test]
    fn test_filters_match_experience_and_skills() {
        let candidate = CandidateProfile::sample("a@example.com");
        let filters = SearchFilters {
            experience: Some(3.0),
            skills: vec!["rust".to_string()],
        };
        assert!(filters.matches(&candidate));

        let too_senior = SearchFilters {
            experience: Some(10.0),
            ..Default::default()
        };
        assert!(!too_senior.matches(&candidate));

        let missing_skill = SearchFilters {
            experience: None,
            skills: vec!["kubernetes".to_string()],
        };
        assert!(!missing_skill.matches(&candidate));
    }

    #[test]
    fn test_ranked_candidate_flattens_profile() {
        let ranked = RankedCandidate {
            candidate: CandidateProfile::sample("a@example.com"),
            score: 91.0,
            explanation: "Strong Rust background".to_string(),
        };
        let value = serde_json::to_value(&ranked).unwrap();
        assert_eq!(value["email"], "a@example.com");
        assert_eq!(value["score"], 91.0);
    }
}
