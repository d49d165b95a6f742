// SQLite CandidateStore Implementation

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use hireflow_core::domain::CandidateProfile;
use hireflow_core::error::Result;
use hireflow_core::port::{CandidateStore, TimeProvider};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::debug;

const CANDIDATE_COLUMNS: &str = "email, phone, name, summary, experience, \
    total_experience_years, education, skills, certifications, linkedin, portfolio";

pub struct SqliteCandidateStore {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteCandidateStore {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            time_provider,
        }
    }
}

#[async_trait]
impl CandidateStore for SqliteCandidateStore {
    async fn upsert(&self, candidate: &CandidateProfile, embedding: &[f32]) -> Result<()> {
        let now = self.time_provider.now_millis();

        sqlx::query(
            r#"
            INSERT INTO candidates (
                email, phone, name, summary, experience,
                total_experience_years, education, skills, certifications,
                linkedin, portfolio, embedding, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(email) DO UPDATE SET
                phone = excluded.phone,
                name = excluded.name,
                summary = excluded.summary,
                experience = excluded.experience,
                total_experience_years = excluded.total_experience_years,
                education = excluded.education,
                skills = excluded.skills,
                certifications = excluded.certifications,
                linkedin = excluded.linkedin,
                portfolio = excluded.portfolio,
                embedding = excluded.embedding,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&candidate.email)
        .bind(&candidate.phone)
        .bind(&candidate.name)
        .bind(&candidate.summary)
        .bind(&candidate.experience)
        .bind(candidate.total_experience_years)
        .bind(&candidate.education)
        .bind(serde_json::to_string(&candidate.skills)?)
        .bind(serde_json::to_string(&candidate.certifications)?)
        .bind(&candidate.linkedin)
        .bind(&candidate.portfolio)
        .bind(serde_json::to_string(embedding)?)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        debug!(email = %candidate.email, "Candidate upserted");
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<CandidateProfile>> {
        let rows: Vec<CandidateRow> = sqlx::query_as(&format!(
            "SELECT {} FROM candidates ORDER BY created_at ASC, email ASC",
            CANDIDATE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(CandidateRow::into_profile).collect()
    }

    async fn find_by_email_or_phone(&self, identifier: &str) -> Result<Option<CandidateProfile>> {
        let row: Option<CandidateRow> = sqlx::query_as(&format!(
            "SELECT {} FROM candidates WHERE email = ? OR phone = ? LIMIT 1",
            CANDIDATE_COLUMNS
        ))
        .bind(identifier)
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(CandidateRow::into_profile).transpose()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CandidateRow {
    email: String,
    phone: String,
    name: String,
    summary: String,
    experience: String,
    total_experience_years: f64,
    education: String,
    skills: String,
    certifications: String,
    linkedin: String,
    portfolio: String,
}

impl CandidateRow {
    fn into_profile(self) -> Result<CandidateProfile> {
        Ok(CandidateProfile {
            email: self.email,
            phone: self.phone,
            name: self.name,
            summary: self.summary,
            experience: self.experience,
            total_experience_years: self.total_experience_years,
            education: self.education,
            skills: serde_json::from_str(&self.skills)?,
            certifications: serde_json::from_str(&self.certifications)?,
            linkedin: self.linkedin,
            portfolio: self.portfolio,
        })
    }
}
