//! HireFlow Daemon - Main Entry Point
//! HTTP API + single resume processing loop over one SQLite queue

mod config;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Settings;
use hireflow_api_http::{AppState, HttpServer, HttpServerConfig};
use hireflow_core::application::{
    CandidateMatcher, LoopConfig, ProcessingLoop, QueueRunner, ResumeIngestor, SubmissionService,
};
use hireflow_core::port::time_provider::SystemTimeProvider;
use hireflow_infra_openai::{AzureOpenAiClient, AzureOpenAiConfig};
use hireflow_infra_sqlite::{
    create_pool, database_url, run_migrations, SqliteCandidateStore, SqliteJobRepository,
};
use hireflow_infra_system::pdf_extractor::PdfTextExtractor;
use hireflow_infra_system::upload_store::LocalUploadStore;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn init_logging() -> Result<()> {
    let log_format =
        std::env::var("HIREFLOW_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("hireflow=info,tower_http=info"))
        .context("Failed to create env filter")?;

    match log_format.as_str() {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json())
            .init(),
        _ => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty())
            .init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; the process env still applies
    let dotenv = dotenvy::dotenv();

    // 1. Logging
    init_logging()?;
    info!("HireFlow v{} starting...", VERSION);
    if let Ok(path) = dotenv {
        info!(path = %path.display(), "Loaded environment file");
    }

    // 2. Configuration
    let settings = Settings::from_env().context("Invalid configuration")?;
    info!(settings = ?settings, "Configuration loaded");

    // 3. Database
    if let Some(parent) = settings.db_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let pool = create_pool(&database_url(&settings.db_path))
        .await
        .context("DB pool creation failed")?;
    run_migrations(&pool).await.context("Migration failed")?;

    // 4. Adapters (DI wiring)
    let time_provider = Arc::new(SystemTimeProvider);
    let job_repo = Arc::new(SqliteJobRepository::new(pool.clone(), time_provider.clone()));
    let candidate_store = Arc::new(SqliteCandidateStore::new(pool.clone(), time_provider.clone()));
    let uploads = Arc::new(
        LocalUploadStore::new(settings.upload_dir.clone())
            .await
            .context("Failed to prepare upload directory")?,
    );

    let azure = &settings.azure;
    let llm = Arc::new(
        AzureOpenAiClient::new(AzureOpenAiConfig::new(
            azure.llm_endpoint.clone(),
            azure.llm_key.clone(),
            azure.embeddings_endpoint.clone(),
            azure.embeddings_key.clone(),
        ))
        .context("Failed to build Azure OpenAI client")?,
    );

    // 5. Processing loop
    let ingestor = Arc::new(ResumeIngestor::new(
        Arc::new(PdfTextExtractor::new()),
        llm.clone(),
        candidate_store.clone(),
    ));
    let processing_loop = ProcessingLoop::new(
        job_repo.clone(),
        ingestor,
        time_provider,
        LoopConfig {
            idle_poll_interval: settings.idle_poll_interval,
            processor_timeout: settings.processor_timeout,
            ..LoopConfig::default()
        },
    );
    let runner = Arc::new(QueueRunner::new(processing_loop));

    // Jobs left pending or waiting on a rate limit from a previous run
    runner.start();

    // 6. HTTP API
    let submissions = Arc::new(SubmissionService::new(job_repo, uploads, runner.clone()));
    let matcher = Arc::new(CandidateMatcher::new(llm, candidate_store));
    let server = HttpServer::new(
        HttpServerConfig {
            host: settings.host.clone(),
            port: settings.port,
            max_upload_bytes: settings.max_upload_bytes,
            cors_origins: settings.cors_origins.clone(),
        },
        AppState::new(submissions, matcher),
    );
    let listener = server.bind().await.context("Failed to bind HTTP listener")?;

    info!("System ready. Press Ctrl+C to shutdown");

    // 7. Serve until Ctrl+C
    server
        .serve(listener, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutdown signal received. Exiting gracefully...");
        })
        .await
        .context("HTTP server failed")?;

    // 8. Stop the loop; an interrupted job stays pending for the next start
    runner.shutdown().await;
    pool.close().await;

    info!("Shutdown complete.");
    Ok(())
}
