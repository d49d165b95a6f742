//! HireFlow CLI - Command-line client for the HireFlow HTTP API

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tabled::{Table, Tabled};

const DEFAULT_API_URL: &str = "http://127.0.0.1:3000";

#[derive(Parser)]
#[command(name = "hireflow")]
#[command(about = "HireFlow resume queue CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// HTTP API base URL
    #[arg(long, env = "HIREFLOW_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload one or more PDF resumes
    Submit {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Show the status of a job
    Status { job_id: i64 },

    /// Poll a job until it is completed or failed
    Wait {
        job_id: i64,

        /// Poll interval in milliseconds
        #[arg(long, default_value = "1000")]
        interval_ms: u64,

        /// Give up after this many seconds
        #[arg(long, default_value = "600")]
        timeout_secs: u64,
    },

    /// Show queue counters
    Stats,

    /// Search stored candidates
    Search {
        /// Natural-language query
        #[arg(short, long)]
        query: Option<String>,

        /// Required skill (repeatable)
        #[arg(long = "skill")]
        skills: Vec<String>,

        /// Minimum total years of experience
        #[arg(long)]
        min_experience: Option<f64>,

        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Rank stored candidates against a job description
    Match {
        /// File containing the job description
        #[arg(short, long)]
        description_file: PathBuf,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        location: Option<String>,

        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    code: String,
    message: String,
    #[serde(default)]
    retry_after: Option<u64>,
}

#[derive(Deserialize)]
struct UploadResponse {
    job_ids: Vec<i64>,
    status: String,
}

#[derive(Deserialize)]
struct JobStatusView {
    id: i64,
    status: String,
    result: Option<Value>,
    retry_after: Option<i64>,
    created_at: i64,
}

#[derive(Tabled)]
struct JobRow {
    job_id: i64,
    file: String,
    status: String,
}

#[derive(Tabled)]
struct CandidateRow {
    score: String,
    name: String,
    email: String,
    years: String,
    explanation: String,
}

struct ApiClient {
    base: String,
    http: reqwest::Client,
}

impl ApiClient {
    fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn get(&self, path: &str) -> Result<Value> {
        let response = self
            .http
            .get(self.url(path))
            .send()
            .await
            .context("Failed to connect to daemon")?;
        decode(response).await
    }

    async fn post_json(&self, path: &str, body: Value) -> Result<Value> {
        let response = self
            .http
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .context("Failed to connect to daemon")?;
        decode(response).await
    }

    async fn post_form(&self, path: &str, form: Form) -> Result<Value> {
        let response = self
            .http
            .post(self.url(path))
            .multipart(form)
            .send()
            .await
            .context("Failed to connect to daemon")?;
        decode(response).await
    }
}

async fn decode(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    let body = response.text().await.context("Failed to read response")?;

    if !status.is_success() {
        match serde_json::from_str::<ErrorBody>(&body) {
            Ok(ErrorBody { error }) => match error.retry_after {
                Some(secs) => bail!("{} ({}): {} (retry after {}s)", error.code, status, error.message, secs),
                None => bail!("{} ({}): {}", error.code, status, error.message),
            },
            Err(_) => bail!("HTTP {}: {}", status, body),
        }
    }

    serde_json::from_str(&body).context("Failed to parse response")
}

fn content_type_for(path: &std::path::Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

fn colored_status(status: &str) -> String {
    match status {
        "completed" => status.green().to_string(),
        "failed" => status.red().to_string(),
        "active" => status.cyan().to_string(),
        _ => status.yellow().to_string(),
    }
}

fn print_job(view: &JobStatusView) {
    println!("  {} {}", "Job:".bold(), view.id);
    println!("  {} {}", "Status:".bold(), colored_status(&view.status));
    println!("  {} {}", "Created:".bold(), view.created_at);
    if let Some(retry_after) = view.retry_after {
        println!("  {} {}", "Retry after:".bold(), retry_after);
    }

    match view.result.as_ref() {
        Some(result) if result["kind"] == "error" => {
            println!("  {} {}", "Error:".bold(), result["message"].as_str().unwrap_or("-"));
        }
        Some(result) => {
            let candidate = &result["candidate"];
            println!(
                "  {} {} <{}>",
                "Candidate:".bold(),
                candidate["name"].as_str().unwrap_or("-"),
                candidate["email"].as_str().unwrap_or("-")
            );
        }
        None => {}
    }
}

fn print_candidates(response: &Value) {
    let rows: Vec<CandidateRow> = response["candidates"]
        .as_array()
        .map(|candidates| {
            candidates
                .iter()
                .map(|c| CandidateRow {
                    score: c["score"].as_f64().map(|s| format!("{:.0}", s)).unwrap_or_default(),
                    name: c["name"].as_str().unwrap_or("-").to_string(),
                    email: c["email"].as_str().unwrap_or("-").to_string(),
                    years: c["total_experience_years"].to_string(),
                    explanation: c["explanation"].as_str().unwrap_or("").to_string(),
                })
                .collect()
        })
        .unwrap_or_default();

    if rows.is_empty() {
        println!("{}", "No matching candidates".yellow());
        return;
    }
    println!("{}", Table::new(rows));
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let api = ApiClient::new(&cli.api_url);

    match cli.command {
        Commands::Submit { files } => {
            let mut form = Form::new();
            for path in &files {
                let bytes = tokio::fs::read(path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "upload.pdf".to_string());
                let part = Part::bytes(bytes)
                    .file_name(file_name)
                    .mime_str(content_type_for(path))?;
                form = form.part("files", part);
            }

            let result = api.post_form("/api/candidates/upload", form).await?;
            let upload: UploadResponse = serde_json::from_value(result)?;

            println!("{}", "✓ Resumes queued".green().bold());
            println!();

            let rows: Vec<JobRow> = upload
                .job_ids
                .iter()
                .zip(&files)
                .map(|(id, path)| JobRow {
                    job_id: *id,
                    file: path.display().to_string(),
                    status: upload.status.clone(),
                })
                .collect();
            println!("{}", Table::new(rows));
        }

        Commands::Status { job_id } => {
            let result = api.get(&format!("/api/candidates/jobs/{}", job_id)).await?;
            let view: JobStatusView = serde_json::from_value(result)?;
            print_job(&view);
        }

        Commands::Wait {
            job_id,
            interval_ms,
            timeout_secs,
        } => {
            let deadline = Instant::now() + Duration::from_secs(timeout_secs);
            let view = loop {
                let result = api.get(&format!("/api/candidates/jobs/{}", job_id)).await?;
                let view: JobStatusView = serde_json::from_value(result)?;
                if view.status == "completed" || view.status == "failed" {
                    break view;
                }
                if Instant::now() >= deadline {
                    bail!("Job {} still {} after {}s", job_id, view.status, timeout_secs);
                }
                tokio::time::sleep(Duration::from_millis(interval_ms)).await;
            };
            print_job(&view);
        }

        Commands::Stats => {
            let stats = api.get("/api/jobs/stats").await?;

            println!("{}", "Queue Status".cyan().bold());
            println!();
            println!("  {} {}", "API URL:".bold(), cli.api_url);
            println!("  {} {}", "Pending:".bold(), stats["pending"]);
            println!("  {} {}", "Completed:".bold(), stats["completed"]);
            println!("  {} {}", "Failed:".bold(), stats["failed"]);
            match stats["active_job"].as_i64() {
                Some(id) => println!("  {} {}", "Active job:".bold(), id),
                None => println!("  {} {}", "Active job:".bold(), "idle".dimmed()),
            }
        }

        Commands::Search {
            query,
            skills,
            min_experience,
            limit,
        } => {
            let filters = if skills.is_empty() && min_experience.is_none() {
                Value::Null
            } else {
                json!({ "skills": skills, "experience": min_experience })
            };
            let result = api
                .post_json(
                    "/api/search",
                    json!({ "query": query, "filters": filters, "limit": limit }),
                )
                .await?;
            print_candidates(&result);
        }

        Commands::Match {
            description_file,
            title,
            location,
            limit,
        } => {
            let description = tokio::fs::read_to_string(&description_file)
                .await
                .with_context(|| format!("Failed to read {}", description_file.display()))?;
            let result = api
                .post_json(
                    "/api/job_listings/match",
                    json!({
                        "title": title,
                        "location": location,
                        "description": description,
                        "limit": limit,
                    }),
                )
                .await?;
            print_candidates(&result);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for(std::path::Path::new("cv.PDF")), "application/pdf");
        assert_eq!(
            content_type_for(std::path::Path::new("notes.txt")),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_search_args() {
        let cli = Cli::try_parse_from([
            "hireflow",
            "search",
            "--skill",
            "Rust",
            "--skill",
            "SQL",
            "--min-experience",
            "3",
        ])
        .unwrap();
        match cli.command {
            Commands::Search {
                skills,
                min_experience,
                limit,
                ..
            } => {
                assert_eq!(skills, vec!["Rust", "SQL"]);
                assert_eq!(min_experience, Some(3.0));
                assert_eq!(limit, 10);
            }
            _ => panic!("expected search"),
        }
    }
}
