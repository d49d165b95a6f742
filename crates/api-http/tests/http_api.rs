//! Black-box tests: real router on an ephemeral port, driven over HTTP.

use hireflow_api_http::{AppState, HttpServer, HttpServerConfig};
use hireflow_core::application::{
    CandidateMatcher, LoopConfig, ProcessingLoop, QueueRunner, SubmissionService,
};
use hireflow_core::domain::CandidateProfile;
use hireflow_core::port::candidate_store::mocks::InMemoryCandidateStore;
use hireflow_core::port::job_repository::mocks::InMemoryJobRepository;
use hireflow_core::port::language_model::mocks::ScriptedLanguageModel;
use hireflow_core::port::processor::mocks::{MockBehavior, ScriptedProcessor};
use hireflow_core::port::time_provider::SystemTimeProvider;
use hireflow_core::port::LlmError;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

struct TestServer {
    base: String,
    client: reqwest::Client,
    llm: Arc<ScriptedLanguageModel>,
    processor: Arc<ScriptedProcessor>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with(HttpServerConfig::default()).await
    }

    async fn spawn_with(config: HttpServerConfig) -> Self {
        let time = Arc::new(SystemTimeProvider);
        let jobs = Arc::new(InMemoryJobRepository::new(time.clone()));
        let processor = Arc::new(ScriptedProcessor::new_success());
        let llm = Arc::new(ScriptedLanguageModel::new());
        let candidates = Arc::new(InMemoryCandidateStore::with_candidates(vec![
            CandidateProfile::sample("ada@example.com"),
        ]));

        let processing_loop = ProcessingLoop::new(
            jobs.clone(),
            processor.clone(),
            time,
            LoopConfig {
                idle_poll_interval: Duration::from_millis(10),
                ..LoopConfig::default()
            },
        );
        let runner = Arc::new(QueueRunner::new(processing_loop));
        let submissions = Arc::new(SubmissionService::new(
            jobs,
            Arc::new(hireflow_core::port::upload_store::mocks::InMemoryUploadStore::new()),
            runner,
        ));
        let matcher = Arc::new(CandidateMatcher::new(llm.clone(), candidates));

        let server = HttpServer::new(config, AppState::new(submissions, matcher));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            server
                .serve(listener, std::future::pending())
                .await
                .unwrap();
        });

        Self {
            base: format!("http://{}", addr),
            client: reqwest::Client::new(),
            llm,
            processor,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn upload(&self, files: &[(&str, &str)]) -> reqwest::Response {
        let mut form = Form::new();
        for (name, content_type) in files {
            let part = Part::bytes(b"%PDF-1.4 fake".to_vec())
                .file_name(name.to_string())
                .mime_str(content_type)
                .unwrap();
            form = form.part("files", part);
        }
        self.client
            .post(self.url("/api/candidates/upload"))
            .multipart(form)
            .send()
            .await
            .unwrap()
    }

    async fn status_of(&self, id: i64) -> Value {
        self.client
            .get(self.url(&format!("/api/candidates/jobs/{}", id)))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }

    async fn wait_for_status(&self, id: i64, wanted: &str) -> Value {
        for _ in 0..200 {
            let body = self.status_of(id).await;
            if body["status"] == wanted {
                return body;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {} never reached status {}", id, wanted);
    }
}

#[tokio::test]
async fn test_health() {
    let server = TestServer::spawn().await;

    let response = server.client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], hireflow_core::VERSION);
}

#[tokio::test]
async fn test_upload_is_accepted_and_processed() {
    let server = TestServer::spawn().await;

    let response = server
        .upload(&[("ada.pdf", "application/pdf"), ("grace.pdf", "application/pdf")])
        .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "pending");
    let ids: Vec<i64> = serde_json::from_value(body["job_ids"].clone()).unwrap();
    assert_eq!(ids.len(), 2);
    assert!(ids[0] < ids[1]);

    for id in &ids {
        let status = server.wait_for_status(*id, "completed").await;
        assert_eq!(status["id"], *id);
        assert!(status["retry_after"].is_null());
    }
    assert_eq!(server.processor.calls(), vec!["ada.pdf", "grace.pdf"]);
}

#[tokio::test]
async fn test_failed_job_reports_message() {
    let server = TestServer::spawn().await;
    server
        .processor
        .script("broken.pdf", MockBehavior::Fail("Failed to parse candidate data.".into()));

    let body: Value = server
        .upload(&[("broken.pdf", "application/pdf")])
        .await
        .json()
        .await
        .unwrap();
    let id = body["job_ids"][0].as_i64().unwrap();

    let status = server.wait_for_status(id, "failed").await;
    assert!(status["retry_after"].is_null());
    assert!(status["result"].to_string().contains("Failed to parse candidate data."));
}

#[tokio::test]
async fn test_upload_rejects_non_pdf() {
    let server = TestServer::spawn().await;

    let response = server
        .upload(&[("ada.pdf", "application/pdf"), ("notes.txt", "text/plain")])
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["message"], "Only PDF files are allowed.");

    // Nothing was queued for the valid file either
    let stats: Value = server
        .client
        .get(server.url("/api/jobs/stats"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["pending"], 0);
}

#[tokio::test]
async fn test_upload_without_files() {
    let server = TestServer::spawn().await;

    let response = server.upload(&[]).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["message"], "No files uploaded.");
}

#[tokio::test]
async fn test_upload_over_body_limit() {
    let server = TestServer::spawn_with(HttpServerConfig {
        max_upload_bytes: 1024,
        ..HttpServerConfig::default()
    })
    .await;

    let part = Part::bytes(vec![b'x'; 16 * 1024])
        .file_name("huge.pdf")
        .mime_str("application/pdf")
        .unwrap();
    let response = server
        .client
        .post(server.url("/api/candidates/upload"))
        .multipart(Form::new().part("files", part))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_unknown_job_is_404() {
    let server = TestServer::spawn().await;

    let response = server
        .client
        .get(server.url("/api/candidates/jobs/9999"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert_eq!(body["error"]["message"], "Job 9999 not found");
}

#[tokio::test]
async fn test_malformed_job_id_is_400() {
    let server = TestServer::spawn().await;

    let response = server
        .client
        .get(server.url("/api/candidates/jobs/abc"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stats_shape() {
    let server = TestServer::spawn().await;

    let body: Value = server
        .client
        .get(server.url("/api/jobs/stats"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        body,
        json!({"pending": 0, "completed": 0, "failed": 0, "active_job": null})
    );
}

#[tokio::test]
async fn test_search_requires_parameters() {
    let server = TestServer::spawn().await;

    let response = server
        .client
        .post(server.url("/api/search"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["message"], "No search parameters provided.");
}

#[tokio::test]
async fn test_search_returns_ranked_candidates() {
    let server = TestServer::spawn().await;
    server.llm.push_completion(Ok(json!([
        {"name": "Sample Candidate", "email": "ada@example.com", "score": 87, "explanation": "Strong Rust"},
        {"name": "Ghost", "email": "ghost@example.com", "score": 99, "explanation": "Not stored"}
    ])
    .to_string()));

    let response = server
        .client
        .post(server.url("/api/search"))
        .json(&json!({"query": "rust engineer", "filters": {"skills": ["Rust"]}}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    let candidates = body["candidates"].as_array().unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0]["email"], "ada@example.com");
    assert_eq!(candidates[0]["score"], 87.0);
}

#[tokio::test]
async fn test_match_requires_description() {
    let server = TestServer::spawn().await;

    let response = server
        .client
        .post(server.url("/api/job_listings/match"))
        .json(&json!({"title": "Backend Engineer"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["message"], "Job description is required.");
}

#[tokio::test]
async fn test_match_with_invalid_json_is_400() {
    let server = TestServer::spawn().await;

    let response = server
        .client
        .post(server.url("/api/job_listings/match"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_llm_rate_limit_maps_to_429() {
    let server = TestServer::spawn().await;
    server.llm.push_completion(Err(LlmError::RateLimited {
        retry_after_secs: 30,
    }));

    let response = server
        .client
        .post(server.url("/api/search"))
        .json(&json!({"query": "rust"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()["retry-after"], "30");

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], "RATE_LIMITED");
    assert_eq!(body["error"]["retry_after"], 30);
}

#[tokio::test]
async fn test_llm_failure_is_not_leaked() {
    let server = TestServer::spawn().await;
    server.llm.push_completion(Err(LlmError::Api {
        status: 500,
        message: "deployment secret-prod-01 exploded".to_string(),
    }));

    let response = server
        .client
        .post(server.url("/api/search"))
        .json(&json!({"query": "rust"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = response.text().await.unwrap();
    assert!(!body.contains("secret-prod-01"));
}
