// Azure OpenAI client
// Rate limits are reported, not retried: the processing loop owns backoff.

use async_trait::async_trait;
use hireflow_core::port::{LanguageModel, LlmError};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Delay assumed when a 429 carries no usable Retry-After header
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_MAX_TOKENS: u32 = 3000;

#[derive(Debug, Clone)]
pub struct AzureOpenAiConfig {
    /// Full chat completions URL, including deployment and api-version
    pub llm_endpoint: String,
    pub llm_key: String,
    /// Full embeddings URL, including deployment and api-version
    pub embeddings_endpoint: String,
    pub embeddings_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub request_timeout: Duration,
}

impl AzureOpenAiConfig {
    pub fn new(
        llm_endpoint: impl Into<String>,
        llm_key: impl Into<String>,
        embeddings_endpoint: impl Into<String>,
        embeddings_key: impl Into<String>,
    ) -> Self {
        Self {
            llm_endpoint: llm_endpoint.into(),
            llm_key: llm_key.into(),
            embeddings_endpoint: embeddings_endpoint.into(),
            embeddings_key: embeddings_key.into(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            request_timeout: Duration::from_secs(120),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    model: &'a str,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[derive(Clone)]
pub struct AzureOpenAiClient {
    http: Client,
    config: AzureOpenAiConfig,
}

impl AzureOpenAiClient {
    pub fn new(config: AzureOpenAiConfig) -> Result<Self, LlmError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| LlmError::Transport(e.to_string()))?;
        Ok(Self { http, config })
    }

    async fn post<B: Serialize>(&self, url: &str, key: &str, body: &B) -> Result<Response, LlmError> {
        let response = self
            .http
            .post(url)
            .header("api-key", key)
            .json(body)
            .send()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs =
                retry_after_secs(response.headers()).unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            warn!(url = %url, retry_after_secs, "Azure OpenAI rate limit reached");
            return Err(LlmError::RateLimited { retry_after_secs });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(url = %url, status = status.as_u16(), "Azure OpenAI request failed");
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: api_error_message(body),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl LanguageModel for AzureOpenAiClient {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        let request = ChatRequest {
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: self.config.max_tokens,
            model: &self.config.model,
        };

        let response: ChatResponse = self
            .post(&self.config.llm_endpoint, &self.config.llm_key, &request)
            .await?
            .json()
            .await
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(LlmError::EmptyContent)?;

        debug!(chars = content.len(), "Chat completion received");
        Ok(content)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let response: EmbeddingResponse = self
            .post(
                &self.config.embeddings_endpoint,
                &self.config.embeddings_key,
                &EmbeddingRequest { input: text },
            )
            .await?
            .json()
            .await
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

        response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| LlmError::MalformedResponse("no embedding in response".to_string()))
    }
}

/// Parse Retry-After header (seconds)
fn retry_after_secs(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
}

fn api_error_message(body: String) -> String {
    serde_json::from_str::<ApiErrorBody>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}
