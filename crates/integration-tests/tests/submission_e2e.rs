//! End-to-end: submission -> queue -> processing -> candidate store -> search

use std::sync::Arc;
use std::time::Duration;

use hireflow_core::application::{
    CandidateMatcher, JobStatusView, LoopConfig, LoopStep, ProcessingLoop, QueueRunner,
    ResumeIngestor, SearchRequest, SubmissionService,
};
use hireflow_core::domain::{JobId, JobPayload, JobResult, JobStatus, SearchFilters};
use hireflow_core::port::language_model::mocks::ScriptedLanguageModel;
use hireflow_core::port::processor::mocks::{MockBehavior, ScriptedProcessor};
use hireflow_core::port::text_extractor::mocks::FixedTextExtractor;
use hireflow_core::port::time_provider::SystemTimeProvider;
use hireflow_core::port::{CandidateStore, JobRepository, UploadedFile};
use hireflow_infra_sqlite::{
    create_pool, database_url, run_migrations, SqliteCandidateStore, SqliteJobRepository,
};
use hireflow_infra_system::upload_store::LocalUploadStore;
use serde_json::json;
use tempfile::TempDir;

fn fast_loop() -> LoopConfig {
    LoopConfig {
        idle_poll_interval: Duration::from_millis(10),
        ..LoopConfig::default()
    }
}

fn pdf(name: &str) -> UploadedFile {
    UploadedFile::new(name, "application/pdf", b"%PDF-1.4 resume".to_vec())
}

async fn wait_until_terminal(service: &SubmissionService, id: JobId) -> JobStatusView {
    for _ in 0..300 {
        let view = service.get_status(id).await.unwrap();
        if matches!(view.status, JobStatus::Completed | JobStatus::Failed) {
            return view;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {} did not finish", id);
}

#[tokio::test]
async fn test_submitted_files_are_stored_and_processed() {
    let dir = TempDir::new().unwrap();
    let pool = create_pool(&database_url(&dir.path().join("queue.db")))
        .await
        .unwrap();
    run_migrations(&pool).await.unwrap();

    let time = Arc::new(SystemTimeProvider);
    let repo = Arc::new(SqliteJobRepository::new(pool, time.clone()));
    let uploads = Arc::new(LocalUploadStore::new(dir.path().join("uploads")).await.unwrap());
    let processor = Arc::new(ScriptedProcessor::new_success());
    processor.script("broken.pdf", MockBehavior::Fail("Document contains no extractable text".into()));

    let runner = Arc::new(QueueRunner::new(ProcessingLoop::new(
        repo.clone(),
        processor.clone(),
        time,
        fast_loop(),
    )));
    let service = SubmissionService::new(repo.clone(), uploads, runner.clone());

    let ids = service
        .submit(vec![pdf("ada.pdf"), pdf("broken.pdf"), pdf("grace.pdf")])
        .await
        .unwrap();
    assert_eq!(ids.len(), 3);
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
    assert!(runner.is_running());

    let ada = wait_until_terminal(&service, ids[0]).await;
    assert_eq!(ada.status, JobStatus::Completed);

    let broken = wait_until_terminal(&service, ids[1]).await;
    assert_eq!(broken.status, JobStatus::Failed);
    assert_eq!(broken.retry_after, None);
    assert_eq!(
        broken.result,
        Some(JobResult::error("Document contains no extractable text"))
    );

    let grace = wait_until_terminal(&service, ids[2]).await;
    assert_eq!(grace.status, JobStatus::Completed);

    // Payloads point at the stored files
    let stored = std::fs::read_dir(dir.path().join("uploads")).unwrap().count();
    assert_eq!(stored, 3);
    let job = repo.find_by_id(ids[0]).await.unwrap();
    let hireflow_core::domain::JobInput::ResumeUpload { file_path, .. } = &job.payload.input;
    assert!(std::path::Path::new(file_path).exists());

    let stats = service.stats().await.unwrap();
    assert_eq!(stats.completed, 2);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.pending, 0);

    runner.shutdown().await;
    assert!(!runner.is_running());
}

#[tokio::test]
async fn test_ingested_candidate_is_searchable() {
    let pool = create_pool("sqlite::memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();

    let time = Arc::new(SystemTimeProvider);
    let repo = Arc::new(SqliteJobRepository::new(pool.clone(), time.clone()));
    let candidates = Arc::new(SqliteCandidateStore::new(pool, time.clone()));
    let llm = Arc::new(ScriptedLanguageModel::new());

    llm.push_completion(Ok(json!({
        "email": "linus@example.com",
        "phone": "+358 40 000 0000",
        "name": "Linus Example",
        "summary": "Kernel developer",
        "experience": "Maintains an operating system kernel",
        "totalExperienceYears": "30",
        "skills": ["C", "Git"]
    })
    .to_string()));
    llm.set_embedding(Ok(vec![0.25, 0.75]));

    let ingestor = Arc::new(ResumeIngestor::new(
        Arc::new(FixedTextExtractor("Linus Example, kernel developer".to_string())),
        llm.clone(),
        candidates.clone(),
    ));
    let worker = ProcessingLoop::new(repo.clone(), ingestor, time, fast_loop());

    let id = repo
        .enqueue(&JobPayload::resume_upload(
            "/uploads/linus.pdf",
            "linus.pdf",
            "application/pdf",
        ))
        .await
        .unwrap();
    assert_eq!(worker.process_next_job().await.unwrap(), LoopStep::Completed(id));

    let stored = candidates
        .find_by_email_or_phone("+358 40 000 0000")
        .await
        .unwrap()
        .expect("candidate stored by email and phone");
    assert_eq!(stored.email, "linus@example.com");
    assert_eq!(stored.total_experience_years, 30.0);

    llm.push_completion(Ok(json!([
        {"name": "Linus Example", "email": "linus@example.com", "score": 91, "explanation": "Deep C"}
    ])
    .to_string()));

    let matcher = CandidateMatcher::new(llm.clone(), candidates);
    let ranked = matcher
        .search(&SearchRequest {
            query: Some("systems programmer".to_string()),
            filters: Some(SearchFilters {
                experience: Some(10.0),
                skills: vec!["c".to_string()],
            }),
            limit: 5,
        })
        .await
        .unwrap();

    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].candidate.email, "linus@example.com");
    assert_eq!(ranked[0].score, 91.0);
    assert!(llm.prompts().last().unwrap().contains("systems programmer"));
}
