// HireFlow Infrastructure - Azure OpenAI Adapter
// Implements: LanguageModel (chat completions + embeddings)

mod client;

pub use client::{AzureOpenAiClient, AzureOpenAiConfig, DEFAULT_RETRY_AFTER_SECS};
