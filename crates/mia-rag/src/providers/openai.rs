//! OpenAI chat-completions provider

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::types::ChatMessage;

use super::llm::LlmProvider;
use super::retry::{check_status, is_transient, retry_request};

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI API client with automatic retry
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    max_retries: u32,
}

impl OpenAiClient {
    /// Create a new client; fails without an API key
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::Config("OPENAI_API_KEY not set".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_retries: config.max_retries,
        })
    }

    async fn chat_once(&self, messages: &[ChatMessage]) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        let response = check_status(response, Error::Llm).await?;

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::llm(format!("Failed to parse completion response: {}", e)))?;

        extract_content(chat_response)
    }
}

/// First choice's message text; missing or blank content is an error
fn extract_content(response: ChatResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| Error::llm("Completion returned no content"))
}

#[async_trait]
impl LlmProvider for OpenAiClient {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        tracing::info!("Generating answer with model: {}", self.model);

        retry_request("Completion request", self.max_retries, is_transient, || {
            self.chat_once(messages)
        })
        .await
        .map_err(|e| match e {
            Error::Http(e) => Error::llm(format!("Completion request failed: {}", e)),
            other => other,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/models", self.base_url);

        match self.client.get(&url).bearer_auth(&self.api_key).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    fn parse(json: &str) -> ChatResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_new_requires_api_key() {
        let config = LlmConfig::default();
        assert!(matches!(OpenAiClient::new(&config), Err(Error::Config(_))));

        let config = LlmConfig {
            api_key: Some("sk-test".to_string()),
            ..LlmConfig::default()
        };
        let client = OpenAiClient::new(&config).unwrap();
        assert_eq!(client.model(), "gpt-4o-mini");
    }

    #[test]
    fn test_request_serialization() {
        let messages = vec![ChatMessage::system("persona"), ChatMessage::user("question")];
        let request = ChatRequest {
            model: "gpt-4o-mini",
            messages: &messages,
            temperature: 0.7,
            max_tokens: 1500,
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["max_tokens"], 1500);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "question");
        assert_eq!(messages[1].role, Role::User);
    }

    #[test]
    fn test_extract_content() {
        let response = parse(
            r#"{"id": "x", "choices": [{"index": 0, "message": {"role": "assistant", "content": "Aspirin is..."}, "finish_reason": "stop"}]}"#,
        );
        assert_eq!(extract_content(response).unwrap(), "Aspirin is...");
    }

    #[test]
    fn test_extract_content_missing() {
        assert!(matches!(
            extract_content(parse(r#"{"choices": []}"#)),
            Err(Error::Llm(_))
        ));
        assert!(matches!(
            extract_content(parse(r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#)),
            Err(Error::Llm(_))
        ));
        assert!(matches!(
            extract_content(parse(r#"{"choices": [{"message": {"content": "  "}}]}"#)),
            Err(Error::Llm(_))
        ));
    }
}
