// Language Model Port
// Chat completion and embeddings, as offered by the hosted LLM

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by a language model adapter
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// HTTP 429 from the provider, with the delay it asked for
    #[error("Rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("LLM returned empty content")]
    EmptyContent,
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Single-turn chat completion; returns the assistant message text
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError>;

    /// Embedding vector for `text`
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Language model that replays canned completions in order
    pub struct ScriptedLanguageModel {
        completions: Mutex<VecDeque<Result<String, LlmError>>>,
        embedding: Mutex<Result<Vec<f32>, LlmError>>,
        prompts: Mutex<Vec<String>>,
    }

    impl Default for ScriptedLanguageModel {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ScriptedLanguageModel {
        pub fn new() -> Self {
            Self {
                completions: Mutex::new(VecDeque::new()),
                embedding: Mutex::new(Ok(vec![0.1, 0.2, 0.3])),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn push_completion(&self, completion: Result<String, LlmError>) -> &Self {
            self.completions.lock().unwrap().push_back(completion);
            self
        }

        pub fn set_embedding(&self, embedding: Result<Vec<f32>, LlmError>) -> &Self {
            *self.embedding.lock().unwrap() = embedding;
            self
        }

        /// Prompts received by `complete`, in call order
        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedLanguageModel {
        async fn complete(&self, _system: &str, prompt: &str) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.completions
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(LlmError::EmptyContent))
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>, LlmError> {
            self.embedding.lock().unwrap().clone()
        }
    }
}
