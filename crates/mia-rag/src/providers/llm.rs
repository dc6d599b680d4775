//! LLM provider trait for chat completion

use async_trait::async_trait;
use crate::error::Result;
use crate::types::ChatMessage;

/// Trait for chat-completion answer generation
///
/// Implementations:
/// - `OpenAiClient`: OpenAI chat completions API (gpt-4o-mini)
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Complete a conversation; returns the assistant message text
    ///
    /// An empty or missing completion is an error, never an empty string.
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
