//! Daemon settings, read once from the environment at startup.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_DB_PATH: &str = "~/.hireflow/queue.db";
const DEFAULT_UPLOAD_DIR: &str = "./uploads";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_IDLE_POLL_MS: u64 = 1000;
const DEFAULT_PROCESSOR_TIMEOUT_SECS: u64 = 300;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Settings {
    pub db_path: PathBuf,
    pub upload_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub idle_poll_interval: Duration,
    pub processor_timeout: Duration,
    pub max_upload_bytes: usize,
    pub cors_origins: Vec<String>,
    pub azure: AzureSettings,
}

#[derive(Clone)]
pub struct AzureSettings {
    pub llm_endpoint: String,
    pub llm_key: String,
    pub embeddings_endpoint: String,
    pub embeddings_key: String,
}

// Keys stay out of logs
impl std::fmt::Debug for AzureSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureSettings")
            .field("llm_endpoint", &self.llm_endpoint)
            .field("embeddings_endpoint", &self.embeddings_endpoint)
            .finish_non_exhaustive()
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup (the process env in production)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| {
            var(key).with_context(|| format!("Missing required environment variable {}", key))
        };

        let db_path = var("HIREFLOW_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
        let upload_dir =
            var("HIREFLOW_UPLOAD_DIR").unwrap_or_else(|| DEFAULT_UPLOAD_DIR.to_string());

        let idle_poll_ms: u64 = parse_or(&var, "HIREFLOW_IDLE_POLL_MS", DEFAULT_IDLE_POLL_MS)?;
        if idle_poll_ms == 0 {
            bail!("HIREFLOW_IDLE_POLL_MS must be greater than zero");
        }
        let timeout_secs: u64 = parse_or(
            &var,
            "HIREFLOW_PROCESSOR_TIMEOUT_SECS",
            DEFAULT_PROCESSOR_TIMEOUT_SECS,
        )?;
        if timeout_secs == 0 {
            bail!("HIREFLOW_PROCESSOR_TIMEOUT_SECS must be greater than zero");
        }

        let cors_origins: Vec<String> = var("HIREFLOW_CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            db_path: PathBuf::from(shellexpand::tilde(&db_path).into_owned()),
            upload_dir: PathBuf::from(shellexpand::tilde(&upload_dir).into_owned()),
            host: var("HIREFLOW_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or(&var, "PORT", DEFAULT_PORT)?,
            idle_poll_interval: Duration::from_millis(idle_poll_ms),
            processor_timeout: Duration::from_secs(timeout_secs),
            max_upload_bytes: parse_or(&var, "HIREFLOW_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            cors_origins,
            azure: AzureSettings {
                llm_endpoint: require("AZURE_OPENAI_LLM_ENDPOINT")?,
                llm_key: require("AZURE_OPENAI_LLM_KEY")?,
                embeddings_endpoint: require("AZURE_OPENAI_EMBEDDINGS_ENDPOINT")?,
                embeddings_key: require("AZURE_OPENAI_EMBEDDINGS_KEY")?,
            },
        })
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {:?}", key, raw)),
        None => Ok(default),
    }
}
